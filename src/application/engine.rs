use crate::application::accountant::Accountant;
use crate::application::events::EventPublisher;
use crate::application::ledger::StatementLedger;
use crate::application::tariff::TariffManager;
use crate::application::teller::Teller;
use crate::application::transactor::Transactor;
use crate::application::workers::{DeadLetter, Pipeline};
use crate::config::LedgerConfig;
use crate::domain::account::Account;
use crate::domain::ports::{AccountStoreRef, CustomerDirectoryRef, Stores};
use crate::error::Result;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// The main entry point of the ledger core.
///
/// `WalletEngine` wires the accountant, tariff manager and transactor onto a
/// set of stores and owns the background workers. Tariff seeding starts with
/// the engine and runs alongside normal traffic.
pub struct WalletEngine {
    accounts: AccountStoreRef,
    ledger: StatementLedger,
    accountant: Arc<Accountant>,
    tariff: Arc<TariffManager>,
    transactor: Arc<Transactor>,
    pipeline: Pipeline,
    seeding: Option<JoinHandle<()>>,
}

impl WalletEngine {
    /// Builds the engine and spawns its background tasks.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(config: &LedgerConfig, stores: Stores) -> Self {
        let ledger = StatementLedger::new(stores.statements);
        let accountant = Arc::new(Accountant::new(
            stores.accounts.clone(),
            ledger.clone(),
            config.max_balance_retries,
        ));
        let tariff = Arc::new(TariffManager::new(stores.charges));
        let seeding = tariff.spawn_seeding();
        let pipeline = Pipeline::start(config, accountant.clone(), stores.transactions);
        let transactor = Arc::new(Transactor::new(
            accountant.clone(),
            tariff.clone(),
            pipeline.publisher(),
        ));
        info!("ledger engine started");

        Self {
            accounts: stores.accounts,
            ledger,
            accountant,
            tariff,
            transactor,
            pipeline,
            seeding: Some(seeding),
        }
    }

    pub fn accountant(&self) -> &Arc<Accountant> {
        &self.accountant
    }

    pub fn tariff(&self) -> &Arc<TariffManager> {
        &self.tariff
    }

    pub fn transactor(&self) -> &Arc<Transactor> {
        &self.transactor
    }

    pub fn ledger(&self) -> &StatementLedger {
        &self.ledger
    }

    /// Producer handle for registration flows announcing new customers.
    pub fn publisher(&self) -> EventPublisher {
        self.pipeline.publisher()
    }

    pub fn teller(&self, directory: CustomerDirectoryRef) -> Teller {
        Teller::new(directory, self.transactor.clone())
    }

    /// Waits for the initial tariff seeding; later calls return immediately.
    pub async fn wait_for_tariff(&mut self) {
        if let Some(seeding) = self.seeding.take()
            && let Err(e) = seeding.await
        {
            error!(error = %e, "tariff seeding task failed");
        }
    }

    /// Waits until every event published so far has been handled.
    pub async fn settle(&self) {
        self.pipeline.settle().await;
    }

    pub fn dead_letters(&self) -> Vec<DeadLetter> {
        self.pipeline.dead_letters()
    }

    /// Stops the background workers and returns the final state of all accounts.
    pub async fn shutdown(mut self) -> Result<Vec<Account>> {
        self.wait_for_tariff().await;
        self.pipeline.shutdown().await;
        info!("ledger engine stopped");
        self.accounts.all_accounts().await
    }
}
