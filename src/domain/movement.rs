use crate::domain::customer::{Customer, Role};
use crate::domain::money::Amount;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// The reason attached to every balance change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Deposit,
    Withdraw,
    Transfer,
    /// Administrative credit of a super-agent's account.
    FloatAssignment,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Deposit => "deposit",
            Operation::Withdraw => "withdraw",
            Operation::Transfer => "transfer",
            Operation::FloatAssignment => "float_assignment",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The customer-initiated subset of [`Operation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementKind {
    Deposit,
    Withdraw,
    Transfer,
}

impl MovementKind {
    /// Smallest amount, in major units, a movement of this kind may carry.
    pub fn minimum(&self) -> i64 {
        match self {
            MovementKind::Deposit => 10,
            MovementKind::Withdraw => 1,
            MovementKind::Transfer => 10,
        }
    }

    /// Deposits are never charged, so no tariff route exists for them.
    pub fn is_chargeable(&self) -> bool {
        !matches!(self, MovementKind::Deposit)
    }
}

impl From<MovementKind> for Operation {
    fn from(kind: MovementKind) -> Self {
        match kind {
            MovementKind::Deposit => Operation::Deposit,
            MovementKind::Withdraw => Operation::Withdraw,
            MovementKind::Transfer => Operation::Transfer,
        }
    }
}

impl fmt::Display for MovementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Operation::from(*self).fmt(f)
    }
}

impl FromStr for MovementKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "deposit" => Ok(MovementKind::Deposit),
            "withdraw" | "withdrawal" => Ok(MovementKind::Withdraw),
            "transfer" => Ok(MovementKind::Transfer),
            other => Err(format!("unknown movement kind `{other}`")),
        }
    }
}

/// A requested movement of value between two customers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Movement {
    pub kind: MovementKind,
    pub source: Customer,
    pub destination: Customer,
    pub amount: Amount,
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum TopologyViolation {
    #[error("administrators do not hold accounts")]
    AdminHoldsNoAccount,
    #[error("deposits can only be made at an agent")]
    DepositOnlyAtAgent,
    #[error("a super agent can only deposit to an agent")]
    SuperAgentDepositsToAgentsOnly,
    #[error("a merchant cannot receive deposits")]
    MerchantCannotReceiveDeposit,
    #[error("a super agent cannot take part in withdrawals")]
    SuperAgentCannotWithdraw,
    #[error("withdrawals can only be made at an agent")]
    WithdrawOnlyAtAgent,
    #[error("a super agent cannot take part in transfers")]
    SuperAgentCannotTransfer,
}

/// Who may move value to whom, per movement kind.
///
/// Every (kind, source, destination) combination is covered by exactly one arm.
pub fn check_topology(
    kind: MovementKind,
    source: Role,
    destination: Role,
) -> Result<(), TopologyViolation> {
    use MovementKind::{Deposit, Transfer, Withdraw};
    use Role::{Admin, Agent, Merchant, Subscriber, SuperAgent};
    use TopologyViolation::*;

    match (kind, source, destination) {
        (_, Admin, _) | (_, _, Admin) => Err(AdminHoldsNoAccount),

        (Deposit, Subscriber | Merchant, _) => Err(DepositOnlyAtAgent),
        (Deposit, SuperAgent, Agent) => Ok(()),
        (Deposit, SuperAgent, Subscriber | Merchant | SuperAgent) => {
            Err(SuperAgentDepositsToAgentsOnly)
        }
        (Deposit, Agent, Merchant) => Err(MerchantCannotReceiveDeposit),
        (Deposit, Agent, Subscriber | Agent | SuperAgent) => Ok(()),

        (Withdraw, SuperAgent, _) | (Withdraw, _, SuperAgent) => Err(SuperAgentCannotWithdraw),
        (Withdraw, _, Subscriber | Merchant) => Err(WithdrawOnlyAtAgent),
        (Withdraw, Subscriber | Merchant | Agent, Agent) => Ok(()),

        (Transfer, SuperAgent, _) | (Transfer, _, SuperAgent) => Err(SuperAgentCannotTransfer),
        (Transfer, Subscriber | Merchant | Agent, Subscriber | Merchant | Agent) => Ok(()),
    }
}
