use crate::domain::account::Account;
use crate::domain::charge::{Charge, ChargeId, Route};
use crate::domain::customer::OwnerId;
use crate::domain::ports::{AccountStore, ChargeStore, Commit, Posting, StatementStore, TransactionStore};
use crate::domain::statement::Statement;
use crate::domain::transaction::TransactionRecord;
use crate::error::{LedgerError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rocksdb::{
    ColumnFamily, ColumnFamilyDescriptor, DB, Direction, IteratorMode, Options, WriteBatch,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Column Family for account rows, keyed by owner id.
pub const CF_ACCOUNTS: &str = "accounts";
/// Column Family for statement rows, keyed by owner id, timestamp and statement id.
pub const CF_STATEMENTS: &str = "statements";
/// Column Family for charges, keyed by charge id.
pub const CF_CHARGES: &str = "charges";
/// Column Family mapping a route key to its charge id.
pub const CF_CHARGE_ROUTES: &str = "charge_routes";
/// Column Family for transaction records.
pub const CF_TRANSACTIONS: &str = "transactions";

const COLUMN_FAMILIES: [&str; 5] = [
    CF_ACCOUNTS,
    CF_STATEMENTS,
    CF_CHARGES,
    CF_CHARGE_ROUTES,
    CF_TRANSACTIONS,
];

/// A persistent backend for every ledger port, using RocksDB.
///
/// Read-check-write sequences (account creation, balance commits, charge
/// inserts) run under one write lock and land in a single `WriteBatch`.
/// `Clone` shares the underlying database.
#[derive(Clone)]
pub struct RocksDBStore {
    db: Arc<DB>,
    write_lock: Arc<Mutex<()>>,
}

impl RocksDBStore {
    /// Opens or creates a database at `path`, creating missing column families.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let descriptors = COLUMN_FAMILIES
            .iter()
            .map(|name| ColumnFamilyDescriptor::new(*name, Options::default()));
        let db = DB::open_cf_descriptors(&opts, path, descriptors)?;

        Ok(Self {
            db: Arc::new(db),
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    fn cf(&self, name: &str) -> Result<&ColumnFamily> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| LedgerError::storage(format!("{name} column family not found")))
    }

    fn read<T: DeserializeOwned>(&self, cf: &str, key: &[u8]) -> Result<Option<T>> {
        match self.db.get_cf(self.cf(cf)?, key)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn write<T: Serialize>(&self, cf: &str, key: &[u8], value: &T) -> Result<()> {
        self.db.put_cf(self.cf(cf)?, key, serde_json::to_vec(value)?)?;
        Ok(())
    }

    fn values<T: DeserializeOwned>(&self, cf: &str) -> Result<Vec<T>> {
        let mut values = Vec::new();
        for item in self.db.iterator_cf(self.cf(cf)?, IteratorMode::Start) {
            let (_key, value) = item?;
            values.push(serde_json::from_slice(&value)?);
        }
        Ok(values)
    }
}

/// Maps a timestamp to bytes that sort in time order.
fn sortable_timestamp(at: DateTime<Utc>) -> Result<[u8; 8]> {
    let nanos = at
        .timestamp_nanos_opt()
        .ok_or_else(|| LedgerError::storage(format!("timestamp {at} is out of range")))?;
    Ok(((nanos as u64) ^ (1 << 63)).to_be_bytes())
}

fn statement_key(statement: &Statement) -> Result<Vec<u8>> {
    let mut key = Vec::with_capacity(40);
    key.extend_from_slice(statement.owner.0.as_bytes());
    key.extend_from_slice(&sortable_timestamp(statement.created_at)?);
    key.extend_from_slice(statement.id.0.as_bytes());
    Ok(key)
}

#[async_trait]
impl AccountStore for RocksDBStore {
    async fn create(&self, account: Account) -> Result<Account> {
        let _guard = self.write_lock.lock().await;
        let key = account.owner.0.as_bytes();
        if self.db.get_pinned_cf(self.cf(CF_ACCOUNTS)?, key)?.is_some() {
            return Err(LedgerError::AccountExists(account.owner));
        }
        self.write(CF_ACCOUNTS, key, &account)?;
        Ok(account)
    }

    async fn get(&self, owner: OwnerId) -> Result<Option<Account>> {
        self.read(CF_ACCOUNTS, owner.0.as_bytes())
    }

    async fn commit(&self, postings: Vec<Posting>) -> Result<Commit> {
        let _guard = self.write_lock.lock().await;
        let accounts = self.cf(CF_ACCOUNTS)?;
        let statements = self.cf(CF_STATEMENTS)?;

        let mut batch = WriteBatch::default();
        let mut applied = Vec::with_capacity(postings.len());
        for posting in postings {
            let key = posting.owner.0.as_bytes();
            let mut account: Account = self
                .read(CF_ACCOUNTS, key)?
                .ok_or(LedgerError::AccountNotFound(posting.owner))?;
            account.ensure_accessible()?;
            if account.balance != posting.expected {
                return Ok(Commit::Stale {
                    owner: posting.owner,
                });
            }
            account.balance = posting.balance;
            batch.put_cf(accounts, key, serde_json::to_vec(&account)?);
            batch.put_cf(
                statements,
                statement_key(&posting.statement)?,
                serde_json::to_vec(&posting.statement)?,
            );
            applied.push(account);
        }

        self.db.write(batch)?;
        Ok(Commit::Applied(applied))
    }

    async fn all_accounts(&self) -> Result<Vec<Account>> {
        self.values(CF_ACCOUNTS)
    }
}

#[async_trait]
impl StatementStore for RocksDBStore {
    async fn statements(
        &self,
        owner: OwnerId,
        before: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<Statement>> {
        let prefix = owner.0.as_bytes();
        let mut upper = Vec::with_capacity(40);
        upper.extend_from_slice(prefix);
        upper.extend_from_slice(&sortable_timestamp(before)?);
        upper.extend_from_slice(&[0xff; 16]);

        let mut rows = Vec::new();
        let iter = self.db.iterator_cf(
            self.cf(CF_STATEMENTS)?,
            IteratorMode::From(upper.as_slice(), Direction::Reverse),
        );
        for item in iter {
            if rows.len() >= limit {
                break;
            }
            let (key, value) = item?;
            if !key.starts_with(prefix) {
                break;
            }
            rows.push(serde_json::from_slice(&value)?);
        }
        Ok(rows)
    }
}

#[async_trait]
impl ChargeStore for RocksDBStore {
    async fn add(&self, charge: Charge) -> Result<Charge> {
        let _guard = self.write_lock.lock().await;
        let route_key = charge.route.key();
        let routes = self.cf(CF_CHARGE_ROUTES)?;
        if self.db.get_pinned_cf(routes, route_key.as_bytes())?.is_some() {
            return Err(LedgerError::ChargeExists(charge.route));
        }

        let mut batch = WriteBatch::default();
        batch.put_cf(routes, route_key.as_bytes(), charge.id.0.as_bytes());
        batch.put_cf(
            self.cf(CF_CHARGES)?,
            charge.id.0.as_bytes(),
            serde_json::to_vec(&charge)?,
        );
        self.db.write(batch)?;
        Ok(charge)
    }

    async fn all_charges(&self) -> Result<Vec<Charge>> {
        self.values(CF_CHARGES)
    }

    async fn find_by_id(&self, id: ChargeId) -> Result<Option<Charge>> {
        self.read(CF_CHARGES, id.0.as_bytes())
    }

    async fn find_by_route(&self, route: Route) -> Result<Option<Charge>> {
        let Some(id) = self
            .db
            .get_cf(self.cf(CF_CHARGE_ROUTES)?, route.key().as_bytes())?
        else {
            return Ok(None);
        };
        self.read(CF_CHARGES, &id)
    }

    async fn update(&self, charge: Charge) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let key = charge.id.0.as_bytes();
        let mut existing: Charge = self
            .read(CF_CHARGES, key)?
            .ok_or(LedgerError::ChargeNotFound(charge.id))?;
        existing.fee = charge.fee;
        self.write(CF_CHARGES, key, &existing)
    }
}

#[async_trait]
impl TransactionStore for RocksDBStore {
    async fn add(&self, record: TransactionRecord) -> Result<()> {
        self.write(CF_TRANSACTIONS, record.id.0.as_bytes(), &record)
    }

    async fn all_transactions(&self) -> Result<Vec<TransactionRecord>> {
        self.values(CF_TRANSACTIONS)
    }
}
