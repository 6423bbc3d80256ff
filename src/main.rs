use clap::Parser;
use miette::{IntoDiagnostic, Result};
use std::fs::File;
use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use wallet_ledger::application::engine::WalletEngine;
use wallet_ledger::config::LedgerConfig;
use wallet_ledger::domain::charge::Route;
use wallet_ledger::domain::customer::Role;
use wallet_ledger::domain::movement::MovementKind;
use wallet_ledger::domain::ports::{CustomerDirectory, Stores};
use wallet_ledger::infrastructure::in_memory::{InMemoryCustomerDirectory, InMemoryStore};
#[cfg(feature = "storage-rocksdb")]
use wallet_ledger::infrastructure::rocksdb::RocksDBStore;
use wallet_ledger::interfaces::csv::account_writer::{AccountWriter, BalanceRow};
use wallet_ledger::interfaces::csv::command_reader::{CommandKind, CommandReader, CommandRecord};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Input commands CSV file
    input: PathBuf,

    /// Path to persistent database (optional). Requires the `storage-rocksdb` feature.
    #[arg(long)]
    db_path: Option<PathBuf>,

    /// JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log filter, overriding `RUST_LOG` and the configured one
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => LedgerConfig::from_path(path)?,
        None => LedgerConfig::default(),
    };
    init_tracing(cli.log_level.as_deref(), &config.log_filter);

    let stores = open_stores(cli.db_path.as_deref())?;
    let mut engine = WalletEngine::start(&config, stores);
    // fee commands need the seeded routes
    engine.wait_for_tariff().await;

    let directory = InMemoryCustomerDirectory::new();
    let file = File::open(&cli.input).into_diagnostic()?;
    for (index, command) in CommandReader::new(file).commands().enumerate() {
        let line = index + 2;
        match command {
            Ok(command) => {
                if let Err(e) = apply(&engine, &directory, &command).await {
                    warn!(line, command = ?command.command, error = %e, "command rejected");
                }
            }
            Err(e) => warn!(line, error = %e, "could not read command"),
        }
    }

    engine.settle().await;
    let dead_letters = engine.dead_letters();
    if !dead_letters.is_empty() {
        warn!(count = dead_letters.len(), "transaction records were not saved");
    }
    let accounts = engine.shutdown().await?;

    let mut rows = Vec::new();
    for (customer, identity) in directory.customers().await {
        if let Some(account) = accounts.iter().find(|a| a.owner == identity.id) {
            rows.push(BalanceRow {
                customer,
                role: identity.role,
                balance: account.balance.to_major(),
                status: account.status,
            });
        }
    }

    let stdout = io::stdout();
    let mut writer = AccountWriter::new(stdout.lock());
    writer.write_rows(rows)?;

    Ok(())
}

async fn apply(
    engine: &WalletEngine,
    directory: &InMemoryCustomerDirectory,
    command: &CommandRecord,
) -> wallet_ledger::error::Result<()> {
    if command.command == CommandKind::Register {
        let customer = directory
            .register(command.source()?, command.source_role()?)
            .await?;
        engine
            .publisher()
            .customer_created(customer.id, customer.role);
        return Ok(());
    }

    // accounts of customers registered so far must exist before money moves
    engine.settle().await;
    let teller = engine.teller(Arc::new(directory.clone()));

    match command.command {
        CommandKind::Register => Ok(()),
        CommandKind::Float => {
            let agent = directory.resolve(command.source()?, Role::Agent).await?;
            engine
                .transactor()
                .assign_float(agent, command.amount()?)
                .await?;
            Ok(())
        }
        CommandKind::Deposit => {
            let agent = directory
                .resolve(command.source()?, command.source_role()?)
                .await?;
            teller
                .deposit(
                    agent,
                    command.destination()?,
                    command.destination_role()?,
                    command.amount()?,
                )
                .await
        }
        CommandKind::Withdraw => {
            let customer = directory
                .resolve(command.source()?, command.source_role()?)
                .await?;
            teller
                .withdraw(customer, command.destination()?, command.amount()?)
                .await
        }
        CommandKind::Transfer => {
            let sender = directory
                .resolve(command.source()?, command.source_role()?)
                .await?;
            teller
                .transfer(
                    sender,
                    command.destination()?,
                    command.destination_role()?,
                    command.amount()?,
                )
                .await
        }
        CommandKind::WithdrawFee | CommandKind::TransferFee => {
            let operation = if command.command == CommandKind::WithdrawFee {
                MovementKind::Withdraw
            } else {
                MovementKind::Transfer
            };
            let route = Route::new(
                operation,
                command.source_role()?,
                command.destination_role()?,
            );
            let charge = engine.tariff().charge_for(route).await?;
            engine
                .tariff()
                .update_charge(charge.id, command.fee()?)
                .await?;
            Ok(())
        }
    }
}

fn init_tracing(explicit: Option<&str>, configured: &str) {
    let filter = match explicit {
        Some(directive) => EnvFilter::try_new(directive),
        None => EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(configured)),
    }
    .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .init();
}

fn open_stores(db_path: Option<&Path>) -> Result<Stores> {
    match db_path {
        #[cfg(feature = "storage-rocksdb")]
        Some(path) => {
            info!(path = %path.display(), "using RocksDB storage");
            Ok(Stores::shared(RocksDBStore::open(path)?))
        }
        #[cfg(not(feature = "storage-rocksdb"))]
        Some(path) => {
            warn!(
                path = %path.display(),
                "built without the storage-rocksdb feature, falling back to in-memory storage"
            );
            Ok(Stores::shared(InMemoryStore::new()))
        }
        None => {
            info!("using in-memory storage");
            Ok(Stores::shared(InMemoryStore::new()))
        }
    }
}
