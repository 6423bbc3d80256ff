use crate::domain::account::{Account, AccountStatus};
use crate::domain::charge::{Charge, ChargeId, Route};
use crate::domain::customer::{Customer, OwnerId, Role};
use crate::domain::ports::{
    AccountStore, ChargeStore, Commit, CustomerDirectory, Posting, StatementStore,
    TransactionStore,
};
use crate::domain::statement::Statement;
use crate::domain::transaction::TransactionRecord;
use crate::error::{LedgerError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
struct ChargeTable {
    by_id: HashMap<ChargeId, Charge>,
    by_route: HashMap<Route, ChargeId>,
}

/// A thread-safe in-memory backend for every ledger port.
///
/// Clones share the same tables. `commit` holds the account and statement
/// write locks together, so a batch of postings is applied atomically.
#[derive(Default, Clone)]
pub struct InMemoryStore {
    accounts: Arc<RwLock<HashMap<OwnerId, Account>>>,
    statements: Arc<RwLock<Vec<Statement>>>,
    charges: Arc<RwLock<ChargeTable>>,
    transactions: Arc<RwLock<Vec<TransactionRecord>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Administrative status change, outside the accountant's balance path.
    pub async fn set_status(&self, owner: OwnerId, status: AccountStatus) -> Result<()> {
        let mut accounts = self.accounts.write().await;
        let account = accounts
            .get_mut(&owner)
            .ok_or(LedgerError::AccountNotFound(owner))?;
        account.status = status;
        Ok(())
    }
}

#[async_trait]
impl AccountStore for InMemoryStore {
    async fn create(&self, account: Account) -> Result<Account> {
        let mut accounts = self.accounts.write().await;
        if accounts.contains_key(&account.owner) {
            return Err(LedgerError::AccountExists(account.owner));
        }
        accounts.insert(account.owner, account.clone());
        Ok(account)
    }

    async fn get(&self, owner: OwnerId) -> Result<Option<Account>> {
        let accounts = self.accounts.read().await;
        Ok(accounts.get(&owner).cloned())
    }

    async fn commit(&self, postings: Vec<Posting>) -> Result<Commit> {
        let mut accounts = self.accounts.write().await;
        let mut statements = self.statements.write().await;

        for posting in &postings {
            let account = accounts
                .get(&posting.owner)
                .ok_or(LedgerError::AccountNotFound(posting.owner))?;
            account.ensure_accessible()?;
            if account.balance != posting.expected {
                return Ok(Commit::Stale {
                    owner: posting.owner,
                });
            }
        }

        let mut applied = Vec::with_capacity(postings.len());
        for posting in postings {
            if let Some(account) = accounts.get_mut(&posting.owner) {
                account.balance = posting.balance;
                applied.push(account.clone());
            }
            statements.push(posting.statement);
        }
        Ok(Commit::Applied(applied))
    }

    async fn all_accounts(&self) -> Result<Vec<Account>> {
        let accounts = self.accounts.read().await;
        Ok(accounts.values().cloned().collect())
    }
}

#[async_trait]
impl StatementStore for InMemoryStore {
    async fn statements(
        &self,
        owner: OwnerId,
        before: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<Statement>> {
        let statements = self.statements.read().await;
        Ok(statements
            .iter()
            .rev()
            .filter(|row| row.owner == owner && row.created_at <= before)
            .take(limit)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl ChargeStore for InMemoryStore {
    async fn add(&self, charge: Charge) -> Result<Charge> {
        let mut table = self.charges.write().await;
        if table.by_route.contains_key(&charge.route) {
            return Err(LedgerError::ChargeExists(charge.route));
        }
        table.by_route.insert(charge.route, charge.id);
        table.by_id.insert(charge.id, charge.clone());
        Ok(charge)
    }

    async fn all_charges(&self) -> Result<Vec<Charge>> {
        let table = self.charges.read().await;
        Ok(table.by_id.values().cloned().collect())
    }

    async fn find_by_id(&self, id: ChargeId) -> Result<Option<Charge>> {
        let table = self.charges.read().await;
        Ok(table.by_id.get(&id).cloned())
    }

    async fn find_by_route(&self, route: Route) -> Result<Option<Charge>> {
        let table = self.charges.read().await;
        Ok(table
            .by_route
            .get(&route)
            .and_then(|id| table.by_id.get(id))
            .cloned())
    }

    async fn update(&self, charge: Charge) -> Result<()> {
        let mut table = self.charges.write().await;
        let existing = table
            .by_id
            .get_mut(&charge.id)
            .ok_or(LedgerError::ChargeNotFound(charge.id))?;
        // the route of a charge never changes
        existing.fee = charge.fee;
        Ok(())
    }
}

#[async_trait]
impl TransactionStore for InMemoryStore {
    async fn add(&self, record: TransactionRecord) -> Result<()> {
        self.transactions.write().await.push(record);
        Ok(())
    }

    async fn all_transactions(&self) -> Result<Vec<TransactionRecord>> {
        Ok(self.transactions.read().await.clone())
    }
}

/// Customer registry keyed by external identifier.
///
/// Owner ids are derived from the external identifier, so the same customer
/// maps to the same owner across runs against a persistent store.
#[derive(Default, Clone)]
pub struct InMemoryCustomerDirectory {
    customers: Arc<RwLock<HashMap<String, Customer>>>,
}

impl InMemoryCustomerDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register(&self, external_id: &str, role: Role) -> Result<Customer> {
        let key = external_id.trim();
        if key.is_empty() {
            return Err(LedgerError::MissingField("customer"));
        }
        let mut customers = self.customers.write().await;
        if customers.contains_key(key) {
            return Err(LedgerError::CustomerExists(key.to_string()));
        }
        let id = OwnerId(Uuid::new_v5(&Uuid::NAMESPACE_OID, key.as_bytes()));
        let customer = Customer::new(id, role);
        customers.insert(key.to_string(), customer);
        Ok(customer)
    }

    /// Every registered customer with its external identifier.
    pub async fn customers(&self) -> Vec<(String, Customer)> {
        let customers = self.customers.read().await;
        customers
            .iter()
            .map(|(key, customer)| (key.clone(), *customer))
            .collect()
    }
}

#[async_trait]
impl CustomerDirectory for InMemoryCustomerDirectory {
    async fn resolve(&self, external_id: &str, role: Role) -> Result<Customer> {
        let customers = self.customers.read().await;
        customers
            .get(external_id.trim())
            .filter(|customer| {
                customer.role == role || (role == Role::Agent && customer.role.is_agent())
            })
            .copied()
            .ok_or_else(|| LedgerError::CustomerNotFound {
                external_id: external_id.to_string(),
                role,
            })
    }
}
