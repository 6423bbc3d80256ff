use async_trait::async_trait;
use rust_decimal_macros::dec;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use wallet_ledger::application::accountant::Accountant;
use wallet_ledger::application::ledger::StatementLedger;
use wallet_ledger::domain::account::{Account, AccountStatus};
use wallet_ledger::domain::customer::OwnerId;
use wallet_ledger::domain::money::MinorUnits;
use wallet_ledger::domain::movement::Operation;
use wallet_ledger::domain::ports::{
    AccountStore, AccountStoreRef, Commit, Posting, StatementStore, StatementStoreRef,
};
use wallet_ledger::error::{ErrorKind, LedgerError, Result};
use wallet_ledger::infrastructure::in_memory::InMemoryStore;

/// Wraps a real store and changes how `commit` behaves.
struct Faulty {
    inner: InMemoryStore,
    mode: Mode,
    commits: AtomicUsize,
}

enum Mode {
    Unavailable,
    AlwaysStale,
}

#[async_trait]
impl AccountStore for Faulty {
    async fn create(&self, account: Account) -> Result<Account> {
        self.inner.create(account).await
    }

    async fn get(&self, owner: OwnerId) -> Result<Option<Account>> {
        self.inner.get(owner).await
    }

    async fn commit(&self, postings: Vec<Posting>) -> Result<Commit> {
        self.commits.fetch_add(1, Ordering::SeqCst);
        match self.mode {
            Mode::Unavailable => Err(LedgerError::storage("disk full")),
            Mode::AlwaysStale => Ok(Commit::Stale {
                owner: postings[0].owner,
            }),
        }
    }

    async fn all_accounts(&self) -> Result<Vec<Account>> {
        self.inner.all_accounts().await
    }
}

async fn accountant_over(mode: Mode) -> (InMemoryStore, Arc<Faulty>, Accountant, OwnerId, OwnerId) {
    let store = InMemoryStore::new();
    let payer = OwnerId::new();
    let payee = OwnerId::new();

    // fund through a healthy accountant before swapping in the faulty port
    let healthy = Arc::new(store.clone());
    let setup = Accountant::new(healthy.clone(), StatementLedger::new(healthy), 4);
    setup.open_account(payer).await.unwrap();
    setup.open_account(payee).await.unwrap();
    setup
        .credit(payer, MinorUnits::new(10_000), Operation::FloatAssignment)
        .await
        .unwrap();

    let faulty = Arc::new(Faulty {
        inner: store.clone(),
        mode,
        commits: AtomicUsize::new(0),
    });
    let accounts: AccountStoreRef = faulty.clone();
    let statements: StatementStoreRef = Arc::new(store.clone());
    let accountant = Accountant::new(accounts, StatementLedger::new(statements), 4);
    (store, faulty, accountant, payer, payee)
}

#[tokio::test]
async fn test_failed_commit_leaves_both_accounts_untouched() {
    let (store, _, accountant, payer, payee) = accountant_over(Mode::Unavailable).await;

    let err = accountant
        .settle(
            payer,
            MinorUnits::new(5_000),
            payee,
            MinorUnits::new(5_000),
            Operation::Transfer,
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Internal);

    assert_eq!(accountant.balance(payer).await.unwrap(), dec!(100));
    assert_eq!(accountant.balance(payee).await.unwrap(), dec!(0));
    let rows = store.statements(payee, chrono::Utc::now(), 10).await.unwrap();
    assert!(rows.is_empty());
}

#[tokio::test]
async fn test_endless_contention_gives_up_after_the_retry_limit() {
    let (_, faulty, accountant, payer, payee) = accountant_over(Mode::AlwaysStale).await;

    let err = accountant
        .settle(
            payer,
            MinorUnits::new(100),
            payee,
            MinorUnits::new(100),
            Operation::Transfer,
        )
        .await
        .unwrap_err();

    assert!(matches!(err, LedgerError::BalanceContention(owner) if owner == payer));
    assert_eq!(faulty.commits.load(Ordering::SeqCst), 4);
    assert_eq!(accountant.balance(payer).await.unwrap(), dec!(100));
}

#[tokio::test]
async fn test_ports_move_across_tasks() {
    let store = InMemoryStore::new();
    let accounts: AccountStoreRef = Arc::new(store.clone());
    let statements: StatementStoreRef = Arc::new(store);
    let owner = OwnerId::new();

    let handle = tokio::spawn(async move {
        accounts.create(Account::open(owner)).await.unwrap();
        accounts.get(owner).await.unwrap().unwrap()
    });
    let account = handle.await.unwrap();
    assert_eq!(account.owner, owner);

    let rows = tokio::spawn(async move { statements.statements(owner, chrono::Utc::now(), 5).await })
        .await
        .unwrap()
        .unwrap();
    assert!(rows.is_empty());
}

/// Freezes the account as soon as it has been read for a write.
struct FreezeAfterRead {
    inner: InMemoryStore,
}

#[async_trait]
impl AccountStore for FreezeAfterRead {
    async fn create(&self, account: Account) -> Result<Account> {
        self.inner.create(account).await
    }

    async fn get(&self, owner: OwnerId) -> Result<Option<Account>> {
        let account = self.inner.get(owner).await?;
        if account.is_some() {
            self.inner.set_status(owner, AccountStatus::Frozen).await?;
        }
        Ok(account)
    }

    async fn commit(&self, postings: Vec<Posting>) -> Result<Commit> {
        self.inner.commit(postings).await
    }

    async fn all_accounts(&self) -> Result<Vec<Account>> {
        self.inner.all_accounts().await
    }
}

#[tokio::test]
async fn test_freeze_between_read_and_write_blocks_the_credit() {
    let store = InMemoryStore::new();
    let owner = OwnerId::new();
    store.create(Account::open(owner)).await.unwrap();

    let accounts: AccountStoreRef = Arc::new(FreezeAfterRead {
        inner: store.clone(),
    });
    let statements: StatementStoreRef = Arc::new(store.clone());
    let accountant = Accountant::new(accounts, StatementLedger::new(statements), 4);

    let err = accountant
        .credit(owner, MinorUnits::new(500), Operation::Deposit)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        LedgerError::AccountAccessDenied {
            status: AccountStatus::Frozen
        }
    ));

    let stored = store.get(owner).await.unwrap().unwrap();
    assert_eq!(stored.status, AccountStatus::Frozen);
    assert_eq!(stored.balance, MinorUnits::ZERO);
    assert!(store.statements(owner, chrono::Utc::now(), 10).await.unwrap().is_empty());
}
