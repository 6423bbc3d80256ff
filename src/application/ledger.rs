use crate::domain::account::Account;
use crate::domain::customer::OwnerId;
use crate::domain::money::MinorUnits;
use crate::domain::movement::Operation;
use crate::domain::ports::StatementStoreRef;
use crate::domain::statement::{Entry, EntryType, Statement, StatementId};
use crate::error::Result;
use chrono::{DateTime, Utc};

/// Append-only audit trail of balance changes.
///
/// Rows are produced by [`StatementLedger::record`] from inside the accountant and
/// reach storage in the same commit as the balance write they describe.
#[derive(Clone)]
pub struct StatementLedger {
    store: StatementStoreRef,
}

impl StatementLedger {
    pub fn new(store: StatementStoreRef) -> Self {
        Self { store }
    }

    /// Builds the audit row for one mutation of `account`.
    pub fn record(
        &self,
        owner: OwnerId,
        account: &Account,
        reason: Operation,
        amount: MinorUnits,
        kind: EntryType,
    ) -> Statement {
        Statement {
            id: StatementId::new(),
            operation: reason,
            entry: Entry::new(kind, amount),
            account: account.id,
            owner,
            created_at: Utc::now(),
        }
    }

    /// Newest-first rows of `owner` created at or before `before`.
    pub async fn statements(
        &self,
        owner: OwnerId,
        before: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<Statement>> {
        self.store.statements(owner, before, limit).await
    }
}
