use super::account::Account;
use super::charge::{Charge, ChargeId, Route};
use super::customer::{Customer, OwnerId, Role};
use super::money::MinorUnits;
use super::statement::Statement;
use super::transaction::TransactionRecord;
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// A conditional balance write together with the statement row that audits it.
#[derive(Debug, Clone, PartialEq)]
pub struct Posting {
    pub owner: OwnerId,
    /// Balance the account must still hold for the write to apply.
    pub expected: MinorUnits,
    pub balance: MinorUnits,
    pub statement: Statement,
}

/// Outcome of committing a batch of postings.
#[derive(Debug, Clone, PartialEq)]
pub enum Commit {
    /// Every posting was applied; accounts are returned in posting order.
    Applied(Vec<Account>),
    /// Nothing was applied because this owner's balance moved since it was read.
    Stale { owner: OwnerId },
}

#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Inserts a new account; fails with `AccountExists` if the owner already holds one.
    async fn create(&self, account: Account) -> Result<Account>;
    async fn get(&self, owner: OwnerId) -> Result<Option<Account>>;
    /// Applies all postings and appends their statements as one unit, or nothing at all.
    /// A frozen or suspended account fails the whole batch with `AccountAccessDenied`.
    async fn commit(&self, postings: Vec<Posting>) -> Result<Commit>;
    async fn all_accounts(&self) -> Result<Vec<Account>>;
}

#[async_trait]
pub trait StatementStore: Send + Sync {
    /// Newest-first statement rows of `owner` created at or before `before`.
    async fn statements(
        &self,
        owner: OwnerId,
        before: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<Statement>>;
}

#[async_trait]
pub trait ChargeStore: Send + Sync {
    /// Fails with `ChargeExists` if the route already has a charge.
    async fn add(&self, charge: Charge) -> Result<Charge>;
    async fn all_charges(&self) -> Result<Vec<Charge>>;
    async fn find_by_id(&self, id: ChargeId) -> Result<Option<Charge>>;
    async fn find_by_route(&self, route: Route) -> Result<Option<Charge>>;
    async fn update(&self, charge: Charge) -> Result<()>;
}

#[async_trait]
pub trait TransactionStore: Send + Sync {
    async fn add(&self, record: TransactionRecord) -> Result<()>;
    async fn all_transactions(&self) -> Result<Vec<TransactionRecord>>;
}

/// Resolves an external customer identifier (account number, email) to an owner.
///
/// The returned customer carries the role actually held, which may be narrower
/// than the one asked for: an `Agent` lookup also matches super-agents.
#[async_trait]
pub trait CustomerDirectory: Send + Sync {
    async fn resolve(&self, external_id: &str, role: Role) -> Result<Customer>;
}

pub type AccountStoreRef = Arc<dyn AccountStore>;
pub type StatementStoreRef = Arc<dyn StatementStore>;
pub type ChargeStoreRef = Arc<dyn ChargeStore>;
pub type TransactionStoreRef = Arc<dyn TransactionStore>;
pub type CustomerDirectoryRef = Arc<dyn CustomerDirectory>;

/// The persistence ports the ledger core is wired with.
#[derive(Clone)]
pub struct Stores {
    pub accounts: AccountStoreRef,
    pub statements: StatementStoreRef,
    pub charges: ChargeStoreRef,
    pub transactions: TransactionStoreRef,
}

impl Stores {
    /// Serves every port from one backend.
    pub fn shared<S>(store: S) -> Self
    where
        S: AccountStore + StatementStore + ChargeStore + TransactionStore + 'static,
    {
        let store = Arc::new(store);
        Self {
            accounts: store.clone(),
            statements: store.clone(),
            charges: store.clone(),
            transactions: store,
        }
    }
}
