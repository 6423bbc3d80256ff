use crate::application::accountant::Accountant;
use crate::application::events::{EventPublisher, TransactionCompleted};
use crate::application::tariff::TariffManager;
use crate::domain::customer::{Customer, Role};
use crate::domain::money::{Amount, MinorUnits};
use crate::domain::movement::{Movement, Operation, check_topology};
use crate::domain::statement::EntryType;
use crate::error::{LedgerError, Result};
use rust_decimal::Decimal;
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{info, warn};

/// Checks a movement without touching any store.
///
/// Same-owner movements are rejected first, then the role topology, then the
/// minimum amount for the movement kind.
pub fn validate(movement: &Movement) -> Result<()> {
    if movement.source.id == movement.destination.id {
        return Err(LedgerError::SameAccountTransaction);
    }
    check_topology(
        movement.kind,
        movement.source.role,
        movement.destination.role,
    )?;
    let floor = movement.kind.minimum();
    if movement.amount.value() < floor {
        return Err(LedgerError::AmountBelowMinimum {
            floor,
            operation: movement.kind,
        });
    }
    Ok(())
}

/// Applies the business rules for deposits, withdrawals and transfers.
///
/// The source always pays `amount + fee` and the destination receives `amount`.
/// Both sides are written in a single commit; the fee is credited to no one.
pub struct Transactor {
    accountant: Arc<Accountant>,
    tariff: Arc<TariffManager>,
    events: EventPublisher,
}

impl Transactor {
    pub fn new(
        accountant: Arc<Accountant>,
        tariff: Arc<TariffManager>,
        events: EventPublisher,
    ) -> Self {
        Self {
            accountant,
            tariff,
            events,
        }
    }

    pub async fn transact(&self, movement: Movement) -> Result<()> {
        self.execute(movement, None).await
    }

    /// Like [`Transactor::transact`], but gives up if `deadline` passes before
    /// the settlement starts. Once balances are being written the call runs to completion.
    pub async fn transact_within(&self, movement: Movement, deadline: Instant) -> Result<()> {
        self.execute(movement, Some(deadline)).await
    }

    /// Credits a super-agent's account with administrative float.
    pub async fn assign_float(&self, agent: Customer, amount: Amount) -> Result<Decimal> {
        if agent.role != Role::SuperAgent {
            return Err(LedgerError::NotSuperAgent);
        }
        let credit = amount.to_minor();
        let account = self
            .accountant
            .post(agent.id, credit, Operation::FloatAssignment, EntryType::Credit)
            .await?;
        info!(owner = %agent.id, amount = %credit, "float assigned");
        self.events.transaction_completed(TransactionCompleted::new(
            &account,
            Operation::FloatAssignment,
            credit,
        ));
        Ok(account.balance.to_major())
    }

    async fn execute(&self, movement: Movement, deadline: Option<Instant>) -> Result<()> {
        validate(&movement)?;
        let Movement {
            kind,
            source,
            destination,
            amount,
        } = movement;

        let fee = if kind.is_chargeable() {
            self.tariff
                .get_charge(kind, source.role, destination.role)
                .await?
        } else {
            MinorUnits::ZERO
        };

        if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            warn!(%kind, source = %source.id, destination = %destination.id, "deadline passed before settlement");
            return Err(LedgerError::DeadlineExceeded);
        }

        let credit = amount.to_minor();
        let debit = credit
            .checked_add(fee)
            .ok_or_else(|| LedgerError::InvalidAmount(format!("{amount} plus fee overflows")))?;
        let operation = Operation::from(kind);

        let settlement = self
            .accountant
            .settle(source.id, debit, destination.id, credit, operation)
            .await?;
        info!(
            %kind,
            source = %source.id,
            destination = %destination.id,
            amount = %credit,
            %fee,
            "movement settled"
        );

        self.events.transaction_completed(TransactionCompleted::new(
            &settlement.payer,
            operation,
            debit,
        ));
        self.events.transaction_completed(TransactionCompleted::new(
            &settlement.payee,
            operation,
            credit,
        ));
        Ok(())
    }
}
