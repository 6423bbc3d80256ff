use crate::domain::customer::OwnerId;
use crate::domain::money::MinorUnits;
use crate::error::{LedgerError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccountId(pub Uuid);

impl AccountId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for AccountId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    Active,
    Dormant,
    Frozen,
    Suspended,
}

impl AccountStatus {
    /// Frozen and suspended accounts reject every mutation.
    pub fn is_locked(&self) -> bool {
        matches!(self, AccountStatus::Frozen | AccountStatus::Suspended)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AccountStatus::Active => "active",
            AccountStatus::Dormant => "dormant",
            AccountStatus::Frozen => "frozen",
            AccountStatus::Suspended => "suspended",
        }
    }
}

impl fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy, Default)]
#[serde(rename_all = "lowercase")]
pub enum AccountKind {
    Savings,
    #[default]
    Current,
    Utility,
}

/// The single account held by an owner.
///
/// The balance is only ever changed through the accountant; this type computes
/// candidate balances but never stores them on its own.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone)]
pub struct Account {
    pub id: AccountId,
    pub owner: OwnerId,
    /// Available balance in minor units.
    pub balance: MinorUnits,
    pub status: AccountStatus,
    pub kind: AccountKind,
}

impl Account {
    /// A fresh active current account with a zero balance.
    pub fn open(owner: OwnerId) -> Self {
        Self {
            id: AccountId::new(),
            owner,
            balance: MinorUnits::ZERO,
            status: AccountStatus::Active,
            kind: AccountKind::Current,
        }
    }

    pub fn ensure_accessible(&self) -> Result<()> {
        if self.status.is_locked() {
            return Err(LedgerError::AccountAccessDenied {
                status: self.status,
            });
        }
        Ok(())
    }

    /// Balance after crediting `amount`.
    pub fn credited(&self, amount: MinorUnits) -> Result<MinorUnits> {
        self.balance
            .checked_add(amount)
            .ok_or_else(|| LedgerError::InvalidAmount(format!("credit of {amount} overflows")))
    }

    /// Balance after debiting `amount`, refusing to go below zero.
    pub fn debited(&self, amount: MinorUnits) -> Result<MinorUnits> {
        if amount > self.balance {
            return Err(LedgerError::InsufficientBalance {
                requested: amount,
                available: self.balance,
            });
        }
        self.balance
            .checked_sub(amount)
            .ok_or_else(|| LedgerError::InvalidAmount(format!("debit of {amount} underflows")))
    }
}
