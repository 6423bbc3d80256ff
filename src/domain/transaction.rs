use crate::domain::account::AccountId;
use crate::domain::customer::OwnerId;
use crate::domain::money::MinorUnits;
use crate::domain::movement::Operation;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransactionId(pub Uuid);

impl TransactionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TransactionId {
    fn default() -> Self {
        Self::new()
    }
}

/// Denormalized record of a completed balance change, kept for reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub id: TransactionId,
    pub operation: Operation,
    pub amount: MinorUnits,
    pub owner: OwnerId,
    pub account: AccountId,
    pub timestamp: DateTime<Utc>,
}
