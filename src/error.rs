use crate::domain::account::AccountStatus;
use crate::domain::charge::{ChargeId, Route};
use crate::domain::customer::{OwnerId, Role};
use crate::domain::money::MinorUnits;
use crate::domain::movement::{MovementKind, TopologyViolation};
use miette::Diagnostic;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, LedgerError>;

/// Coarse classification a boundary layer maps to its own responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad request; never retried.
    Validation,
    /// Something is not provisioned.
    NotFound,
    /// Already exists.
    Conflict,
    /// Opaque failure, eligible for caller-level retry.
    Internal,
    /// Account is frozen or suspended.
    AccessDenied,
}

#[derive(Error, Diagnostic, Debug)]
pub enum LedgerError {
    #[error("cannot transact within the same account")]
    #[diagnostic(code(ledger::validation))]
    SameAccountTransaction,

    #[error(transparent)]
    #[diagnostic(code(ledger::validation))]
    Topology(#[from] TopologyViolation),

    #[error("cannot {operation} amounts less than {floor}")]
    #[diagnostic(code(ledger::validation))]
    AmountBelowMinimum { floor: i64, operation: MovementKind },

    #[error("invalid amount: {0}")]
    #[diagnostic(code(ledger::validation))]
    InvalidAmount(String),

    #[error("given agent is not a super agent")]
    #[diagnostic(code(ledger::validation))]
    NotSuperAgent,

    #[error("missing `{0}` field")]
    #[diagnostic(code(ledger::validation))]
    MissingField(&'static str),

    #[error("invalid configuration: {0}")]
    #[diagnostic(code(ledger::validation))]
    InvalidConfig(String),

    #[error("account for {0} has not been created")]
    #[diagnostic(code(ledger::not_found))]
    AccountNotFound(OwnerId),

    #[error("no tariff has been set for {0}")]
    #[diagnostic(code(ledger::not_found))]
    ChargeNotSet(Route),

    #[error("charge {0} not found")]
    #[diagnostic(code(ledger::not_found))]
    ChargeNotFound(ChargeId),

    #[error("{role} `{external_id}` not found")]
    #[diagnostic(code(ledger::not_found))]
    CustomerNotFound { external_id: String, role: Role },

    #[error("{0} already has an account")]
    #[diagnostic(code(ledger::conflict))]
    AccountExists(OwnerId),

    #[error("customer `{0}` already exists")]
    #[diagnostic(code(ledger::conflict))]
    CustomerExists(String),

    #[error("a charge for {0} already exists")]
    #[diagnostic(code(ledger::conflict))]
    ChargeExists(Route),

    #[error("couldn't access account, it is {status}")]
    #[diagnostic(code(ledger::access_denied))]
    AccountAccessDenied { status: AccountStatus },

    #[error("cannot debit {requested}, account balance is {available}")]
    #[diagnostic(code(ledger::validation))]
    InsufficientBalance {
        requested: MinorUnits,
        available: MinorUnits,
    },

    #[error("balance of {0} kept changing, giving up")]
    #[diagnostic(code(ledger::internal))]
    BalanceContention(OwnerId),

    #[error("deadline passed before the movement was settled")]
    #[diagnostic(code(ledger::internal))]
    DeadlineExceeded,

    #[error("storage error: {0}")]
    #[diagnostic(code(ledger::internal))]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("CSV error: {0}")]
    #[diagnostic(code(ledger::internal))]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    #[diagnostic(code(ledger::internal))]
    Io(#[from] std::io::Error),
}

impl LedgerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LedgerError::SameAccountTransaction
            | LedgerError::Topology(_)
            | LedgerError::AmountBelowMinimum { .. }
            | LedgerError::InvalidAmount(_)
            | LedgerError::NotSuperAgent
            | LedgerError::MissingField(_)
            | LedgerError::InvalidConfig(_)
            | LedgerError::InsufficientBalance { .. } => ErrorKind::Validation,
            LedgerError::AccountNotFound(_)
            | LedgerError::ChargeNotSet(_)
            | LedgerError::ChargeNotFound(_)
            | LedgerError::CustomerNotFound { .. } => ErrorKind::NotFound,
            LedgerError::AccountExists(_)
            | LedgerError::CustomerExists(_)
            | LedgerError::ChargeExists(_) => ErrorKind::Conflict,
            LedgerError::AccountAccessDenied { .. } => ErrorKind::AccessDenied,
            LedgerError::BalanceContention(_)
            | LedgerError::DeadlineExceeded
            | LedgerError::Storage(_)
            | LedgerError::Csv(_)
            | LedgerError::Io(_) => ErrorKind::Internal,
        }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        let message: String = message.into();
        LedgerError::Storage(message.into())
    }
}

impl From<serde_json::Error> for LedgerError {
    fn from(err: serde_json::Error) -> Self {
        LedgerError::Storage(Box::new(err))
    }
}

#[cfg(feature = "storage-rocksdb")]
impl From<rocksdb::Error> for LedgerError {
    fn from(err: rocksdb::Error) -> Self {
        LedgerError::Storage(Box::new(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            LedgerError::SameAccountTransaction.kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            LedgerError::AccountNotFound(OwnerId::new()).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            LedgerError::AccountAccessDenied {
                status: AccountStatus::Frozen
            }
            .kind(),
            ErrorKind::AccessDenied
        );
        assert_eq!(
            LedgerError::AccountExists(OwnerId::new()).kind(),
            ErrorKind::Conflict
        );
        assert_eq!(LedgerError::storage("down").kind(), ErrorKind::Internal);
    }

    #[test]
    fn test_messages_render_major_units() {
        let err = LedgerError::InsufficientBalance {
            requested: MinorUnits::new(2_200),
            available: MinorUnits::new(1_000),
        };
        assert_eq!(
            err.to_string(),
            "cannot debit 22.00, account balance is 10.00"
        );

        let err = LedgerError::AmountBelowMinimum {
            floor: 10,
            operation: MovementKind::Deposit,
        };
        assert_eq!(err.to_string(), "cannot deposit amounts less than 10");
    }

    #[test]
    fn test_diagnostic_code_follows_kind() {
        let err = LedgerError::Topology(TopologyViolation::SuperAgentCannotTransfer);
        let code = err.code().map(|c| c.to_string());
        assert_eq!(code.as_deref(), Some("ledger::validation"));
    }
}
