use crate::domain::account::AccountId;
use crate::domain::customer::OwnerId;
use crate::domain::money::MinorUnits;
use crate::domain::movement::Operation;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StatementId(pub Uuid);

impl StatementId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for StatementId {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    Credit,
    Debit,
}

/// One side of a statement row. A row records a debit or a credit, never both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "amount", rename_all = "lowercase")]
pub enum Entry {
    Credit(MinorUnits),
    Debit(MinorUnits),
}

impl Entry {
    pub fn new(kind: EntryType, amount: MinorUnits) -> Self {
        match kind {
            EntryType::Credit => Entry::Credit(amount),
            EntryType::Debit => Entry::Debit(amount),
        }
    }

    pub fn kind(&self) -> EntryType {
        match self {
            Entry::Credit(_) => EntryType::Credit,
            Entry::Debit(_) => EntryType::Debit,
        }
    }
}

/// Immutable audit row for a single committed balance change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statement {
    pub id: StatementId,
    pub operation: Operation,
    pub entry: Entry,
    pub account: AccountId,
    pub owner: OwnerId,
    pub created_at: DateTime<Utc>,
}

impl Statement {
    pub fn debit_amount(&self) -> MinorUnits {
        match self.entry {
            Entry::Debit(amount) => amount,
            Entry::Credit(_) => MinorUnits::ZERO,
        }
    }

    pub fn credit_amount(&self) -> MinorUnits {
        match self.entry {
            Entry::Credit(amount) => amount,
            Entry::Debit(_) => MinorUnits::ZERO,
        }
    }
}
