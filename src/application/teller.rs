use crate::application::transactor::Transactor;
use crate::domain::customer::{Customer, Role};
use crate::domain::money::Amount;
use crate::domain::movement::{Movement, MovementKind};
use crate::domain::ports::CustomerDirectoryRef;
use crate::error::Result;
use std::sync::Arc;

/// Customer-facing entry points that take the counterparty by its external identifier.
pub struct Teller {
    directory: CustomerDirectoryRef,
    transactor: Arc<Transactor>,
}

impl Teller {
    pub fn new(directory: CustomerDirectoryRef, transactor: Arc<Transactor>) -> Self {
        Self {
            directory,
            transactor,
        }
    }

    /// `agent` deposits `amount` into the account of `customer`.
    pub async fn deposit(
        &self,
        agent: Customer,
        customer: &str,
        customer_role: Role,
        amount: Amount,
    ) -> Result<()> {
        let destination = self.directory.resolve(customer, customer_role).await?;
        self.move_value(MovementKind::Deposit, agent, destination, amount)
            .await
    }

    /// `customer` withdraws `amount` at the agent known as `agent`.
    pub async fn withdraw(&self, customer: Customer, agent: &str, amount: Amount) -> Result<()> {
        let destination = self.directory.resolve(agent, Role::Agent).await?;
        self.move_value(MovementKind::Withdraw, customer, destination, amount)
            .await
    }

    pub async fn transfer(
        &self,
        sender: Customer,
        recipient: &str,
        recipient_role: Role,
        amount: Amount,
    ) -> Result<()> {
        let destination = self.directory.resolve(recipient, recipient_role).await?;
        self.move_value(MovementKind::Transfer, sender, destination, amount)
            .await
    }

    async fn move_value(
        &self,
        kind: MovementKind,
        source: Customer,
        destination: Customer,
        amount: Amount,
    ) -> Result<()> {
        self.transactor
            .transact(Movement {
                kind,
                source,
                destination,
                amount,
            })
            .await
    }
}
