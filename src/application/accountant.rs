use crate::application::ledger::StatementLedger;
use crate::domain::account::Account;
use crate::domain::customer::OwnerId;
use crate::domain::money::MinorUnits;
use crate::domain::movement::Operation;
use crate::domain::ports::{AccountStoreRef, Commit, Posting};
use crate::domain::statement::EntryType;
use crate::error::{LedgerError, Result};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::{debug, warn};

/// Both accounts after a settled movement.
#[derive(Debug, Clone, PartialEq)]
pub struct Settlement {
    pub payer: Account,
    pub payee: Account,
}

/// Serializes read-modify-write sequences per owner inside this process.
///
/// The store's compare-and-set still guards against writers outside it.
/// An owner's entry lives only while someone holds or waits for its lock.
#[derive(Default)]
struct OwnerLocks {
    locks: Mutex<HashMap<OwnerId, Arc<AsyncMutex<()>>>>,
}

impl OwnerLocks {
    fn handle(&self, owner: OwnerId) -> Arc<AsyncMutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        locks.entry(owner).or_default().clone()
    }

    async fn lock(&self, owner: OwnerId) -> OwnerGuard<'_> {
        let guard = self.handle(owner).lock_owned().await;
        OwnerGuard {
            owner,
            locks: self,
            guard: Some(guard),
        }
    }

    /// Locks two distinct owners in a fixed order so opposite transfers cannot deadlock.
    async fn lock_pair(&self, a: OwnerId, b: OwnerId) -> [OwnerGuard<'_>; 2] {
        let (first, second) = if a <= b { (a, b) } else { (b, a) };
        let first = self.lock(first).await;
        let second = self.lock(second).await;
        [first, second]
    }

    fn release(&self, owner: OwnerId, guard: OwnedMutexGuard<()>) {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        drop(guard);
        // only the map still refers to it: nobody holds or waits for this owner
        if locks
            .get(&owner)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(&owner);
        }
    }
}

struct OwnerGuard<'a> {
    owner: OwnerId,
    locks: &'a OwnerLocks,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for OwnerGuard<'_> {
    fn drop(&mut self) {
        if let Some(guard) = self.guard.take() {
            self.locks.release(self.owner, guard);
        }
    }
}

/// The only component allowed to change balances.
///
/// Every write is conditioned on the balance read just before it, and carries
/// the statement row that audits it.
pub struct Accountant {
    accounts: AccountStoreRef,
    ledger: StatementLedger,
    locks: OwnerLocks,
    max_retries: usize,
}

impl Accountant {
    pub fn new(accounts: AccountStoreRef, ledger: StatementLedger, max_retries: usize) -> Self {
        Self {
            accounts,
            ledger,
            locks: OwnerLocks::default(),
            max_retries: max_retries.max(1),
        }
    }

    /// Opens a zero-balance account for a newly registered owner.
    pub async fn open_account(&self, owner: OwnerId) -> Result<Account> {
        self.accounts.create(Account::open(owner)).await
    }

    /// Current balance in major units.
    pub async fn balance(&self, owner: OwnerId) -> Result<Decimal> {
        let account = self.accessible(owner).await?;
        Ok(account.balance.to_major())
    }

    /// Credits `amount` minor units and returns the new balance in major units.
    pub async fn credit(
        &self,
        owner: OwnerId,
        amount: MinorUnits,
        reason: Operation,
    ) -> Result<Decimal> {
        let account = self.post(owner, amount, reason, EntryType::Credit).await?;
        Ok(account.balance.to_major())
    }

    /// Debits `amount` minor units and returns the new balance in major units.
    pub async fn debit(
        &self,
        owner: OwnerId,
        amount: MinorUnits,
        reason: Operation,
    ) -> Result<Decimal> {
        let account = self.post(owner, amount, reason, EntryType::Debit).await?;
        Ok(account.balance.to_major())
    }

    /// Single-account mutation, returning the committed account.
    pub(crate) async fn post(
        &self,
        owner: OwnerId,
        amount: MinorUnits,
        reason: Operation,
        kind: EntryType,
    ) -> Result<Account> {
        ensure_positive(amount)?;
        let _guard = self.locks.lock(owner).await;

        for attempt in 1..=self.max_retries {
            let account = self.accessible(owner).await?;
            let posting = self.posting(&account, amount, reason, kind)?;

            match self.accounts.commit(vec![posting]).await? {
                Commit::Applied(accounts) => {
                    let account = accounts
                        .into_iter()
                        .next()
                        .ok_or_else(|| LedgerError::storage("commit returned no account"))?;
                    debug!(%owner, ?kind, %amount, balance = %account.balance, "balance updated");
                    return Ok(account);
                }
                Commit::Stale { .. } => {
                    warn!(%owner, attempt, "balance changed while updating, retrying");
                }
            }
        }

        Err(LedgerError::BalanceContention(owner))
    }

    /// Debits the payer and credits the payee as one unit of work.
    ///
    /// The debit side is validated first; if either side is rejected nothing is written.
    pub async fn settle(
        &self,
        payer: OwnerId,
        debit: MinorUnits,
        payee: OwnerId,
        credit: MinorUnits,
        reason: Operation,
    ) -> Result<Settlement> {
        if payer == payee {
            return Err(LedgerError::SameAccountTransaction);
        }
        ensure_positive(debit)?;
        ensure_positive(credit)?;
        let _guards = self.locks.lock_pair(payer, payee).await;

        for attempt in 1..=self.max_retries {
            let payer_account = self.accessible(payer).await?;
            let debit_posting = self.posting(&payer_account, debit, reason, EntryType::Debit)?;
            let payee_account = self.accessible(payee).await?;
            let credit_posting = self.posting(&payee_account, credit, reason, EntryType::Credit)?;

            match self
                .accounts
                .commit(vec![debit_posting, credit_posting])
                .await?
            {
                Commit::Applied(accounts) => {
                    let mut accounts = accounts.into_iter();
                    let (Some(payer), Some(payee)) = (accounts.next(), accounts.next()) else {
                        return Err(LedgerError::storage("commit returned fewer accounts"));
                    };
                    return Ok(Settlement { payer, payee });
                }
                Commit::Stale { owner } => {
                    warn!(%owner, attempt, "balance changed while settling, retrying");
                }
            }
        }

        Err(LedgerError::BalanceContention(payer))
    }

    /// Loads the owner's account, refusing frozen and suspended ones.
    async fn accessible(&self, owner: OwnerId) -> Result<Account> {
        let account = self
            .accounts
            .get(owner)
            .await?
            .ok_or(LedgerError::AccountNotFound(owner))?;
        account.ensure_accessible()?;
        Ok(account)
    }

    fn posting(
        &self,
        account: &Account,
        amount: MinorUnits,
        reason: Operation,
        kind: EntryType,
    ) -> Result<Posting> {
        let balance = match kind {
            EntryType::Credit => account.credited(amount)?,
            EntryType::Debit => account.debited(amount)?,
        };
        let statement = self
            .ledger
            .record(account.owner, account, reason, amount, kind);
        Ok(Posting {
            owner: account.owner,
            expected: account.balance,
            balance,
            statement,
        })
    }
}

fn ensure_positive(amount: MinorUnits) -> Result<()> {
    if amount.is_positive() {
        Ok(())
    } else {
        Err(LedgerError::InvalidAmount(format!(
            "{amount} is not a positive amount"
        )))
    }
}
