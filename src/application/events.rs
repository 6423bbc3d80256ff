use crate::config::LedgerConfig;
use crate::domain::account::{Account, AccountId};
use crate::domain::customer::{OwnerId, Role};
use crate::domain::money::MinorUnits;
use crate::domain::movement::Operation;
use crate::domain::transaction::{TransactionId, TransactionRecord};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::{Notify, mpsc};
use tracing::{debug, warn};

/// A customer that should be given an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CustomerCreated {
    pub owner: OwnerId,
    pub role: Role,
}

/// One committed leg of a movement, to be persisted for reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionCompleted {
    pub owner: OwnerId,
    pub account: AccountId,
    pub operation: Operation,
    pub amount: MinorUnits,
    pub timestamp: DateTime<Utc>,
}

impl TransactionCompleted {
    pub fn new(account: &Account, operation: Operation, amount: MinorUnits) -> Self {
        Self {
            owner: account.owner,
            account: account.id,
            operation,
            amount,
            timestamp: Utc::now(),
        }
    }

    pub fn into_record(self) -> TransactionRecord {
        TransactionRecord {
            id: TransactionId::new(),
            operation: self.operation,
            amount: self.amount,
            owner: self.owner,
            account: self.account,
            timestamp: self.timestamp,
        }
    }
}

/// Counts events that were published but not yet handled or dropped.
#[derive(Debug, Default)]
pub(crate) struct InFlight {
    count: AtomicUsize,
    idle: Notify,
}

impl InFlight {
    pub(crate) fn begin(&self) {
        self.count.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn end(&self) {
        if self.count.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.idle.notify_waiters();
        }
    }

    pub(crate) async fn wait_idle(&self) {
        loop {
            let notified = self.idle.notified();
            tokio::pin!(notified);
            // register before checking so a concurrent `end` is not missed
            notified.as_mut().enable();
            if self.count.load(Ordering::SeqCst) == 0 {
                return;
            }
            notified.await;
        }
    }
}

/// Producer side of both event queues.
///
/// Sends happen on detached tasks, so publishing never waits on a full queue.
#[derive(Clone)]
pub struct EventPublisher {
    customers: mpsc::Sender<CustomerCreated>,
    transactions: mpsc::Sender<TransactionCompleted>,
    in_flight: Arc<InFlight>,
}

impl EventPublisher {
    /// Announces a new customer; administrators are skipped since they hold no account.
    pub fn customer_created(&self, owner: OwnerId, role: Role) {
        if !role.holds_account() {
            debug!(%owner, %role, "no account provisioned for role");
            return;
        }
        self.publish(&self.customers, CustomerCreated { owner, role });
    }

    pub fn transaction_completed(&self, event: TransactionCompleted) {
        self.publish(&self.transactions, event);
    }

    /// Waits until every event published so far has been handled or dropped.
    pub async fn settle(&self) {
        self.in_flight.wait_idle().await;
    }

    fn publish<T>(&self, queue: &mpsc::Sender<T>, event: T)
    where
        T: Send + 'static,
    {
        self.in_flight.begin();
        let queue = queue.clone();
        let in_flight = Arc::clone(&self.in_flight);
        tokio::spawn(async move {
            if queue.send(event).await.is_err() {
                warn!("event queue is closed, dropping event");
                in_flight.end();
            }
        });
    }
}

/// Consumer side of one queue.
pub(crate) struct Queue<T> {
    pub(crate) rx: mpsc::Receiver<T>,
    pub(crate) in_flight: Arc<InFlight>,
}

pub(crate) struct EventQueues {
    pub(crate) publisher: EventPublisher,
    pub(crate) customers: Queue<CustomerCreated>,
    pub(crate) transactions: Queue<TransactionCompleted>,
}

pub(crate) fn event_queues(config: &LedgerConfig) -> EventQueues {
    let (customers_tx, customers_rx) = mpsc::channel(config.customer_queue_capacity);
    let (transactions_tx, transactions_rx) = mpsc::channel(config.transaction_queue_capacity);
    let in_flight = Arc::new(InFlight::default());

    EventQueues {
        publisher: EventPublisher {
            customers: customers_tx,
            transactions: transactions_tx,
            in_flight: Arc::clone(&in_flight),
        },
        customers: Queue {
            rx: customers_rx,
            in_flight: Arc::clone(&in_flight),
        },
        transactions: Queue {
            rx: transactions_rx,
            in_flight,
        },
    }
}
