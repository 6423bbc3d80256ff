use crate::application::accountant::Accountant;
use crate::application::events::{
    CustomerCreated, EventPublisher, EventQueues, Queue, TransactionCompleted, event_queues,
};
use crate::config::LedgerConfig;
use crate::domain::ports::TransactionStoreRef;
use crate::domain::transaction::TransactionRecord;
use async_trait::async_trait;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info};

#[async_trait]
trait EventHandler: Send + Sync + 'static {
    type Event: Send + 'static;
    const NAME: &'static str;

    /// Failures are handled here; the worker loop never stops on one.
    async fn handle(&self, event: Self::Event);
}

struct AccountProvisioner {
    accountant: Arc<Accountant>,
}

#[async_trait]
impl EventHandler for AccountProvisioner {
    type Event = CustomerCreated;
    const NAME: &'static str = "account-provisioner";

    async fn handle(&self, event: CustomerCreated) {
        match self.accountant.open_account(event.owner).await {
            Ok(account) => {
                info!(owner = %event.owner, role = %event.role, account = %account.id, "account created")
            }
            Err(e) => {
                error!(owner = %event.owner, role = %event.role, error = %e, "could not create account, dropping event")
            }
        }
    }
}

/// A transaction record that could not be persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct DeadLetter {
    pub record: TransactionRecord,
    pub reason: String,
}

#[derive(Debug, Clone, Default)]
struct DeadLetters(Arc<Mutex<Vec<DeadLetter>>>);

impl DeadLetters {
    fn push(&self, letter: DeadLetter) {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(letter);
    }

    fn snapshot(&self) -> Vec<DeadLetter> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

struct TransactionRecorder {
    transactions: TransactionStoreRef,
    dead_letters: DeadLetters,
}

#[async_trait]
impl EventHandler for TransactionRecorder {
    type Event = TransactionCompleted;
    const NAME: &'static str = "transaction-recorder";

    async fn handle(&self, event: TransactionCompleted) {
        let record = event.into_record();
        if let Err(e) = self.transactions.add(record.clone()).await {
            error!(owner = %record.owner, operation = %record.operation, error = %e, "could not save transaction");
            self.dead_letters.push(DeadLetter {
                record,
                reason: e.to_string(),
            });
        }
    }
}

async fn run<H: EventHandler>(
    handler: H,
    mut queue: Queue<H::Event>,
    mut shutdown: watch::Receiver<bool>,
) {
    info!(worker = H::NAME, "worker started");
    loop {
        tokio::select! {
            event = queue.rx.recv() => match event {
                Some(event) => {
                    handler.handle(event).await;
                    queue.in_flight.end();
                }
                None => break,
            },
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
        }
    }

    // refuse new events, then finish what is already queued
    queue.rx.close();
    let mut drained = 0usize;
    while let Some(event) = queue.rx.recv().await {
        handler.handle(event).await;
        queue.in_flight.end();
        drained += 1;
    }
    info!(worker = H::NAME, drained, "worker stopped");
}

/// The two background consumers and their shared lifecycle.
pub struct Pipeline {
    shutdown: watch::Sender<bool>,
    handles: Vec<JoinHandle<()>>,
    dead_letters: DeadLetters,
    publisher: EventPublisher,
}

impl Pipeline {
    pub fn start(
        config: &LedgerConfig,
        accountant: Arc<Accountant>,
        transactions: TransactionStoreRef,
    ) -> Self {
        let EventQueues {
            publisher,
            customers,
            transactions: completed,
        } = event_queues(config);
        let (shutdown, signal) = watch::channel(false);
        let dead_letters = DeadLetters::default();

        let handles = vec![
            tokio::spawn(run(
                AccountProvisioner { accountant },
                customers,
                signal.clone(),
            )),
            tokio::spawn(run(
                TransactionRecorder {
                    transactions,
                    dead_letters: dead_letters.clone(),
                },
                completed,
                signal,
            )),
        ];

        Self {
            shutdown,
            handles,
            dead_letters,
            publisher,
        }
    }

    pub fn publisher(&self) -> EventPublisher {
        self.publisher.clone()
    }

    pub fn dead_letters(&self) -> Vec<DeadLetter> {
        self.dead_letters.snapshot()
    }

    pub async fn settle(&self) {
        self.publisher.settle().await;
    }

    /// Waits for every published event to be handled, then stops both workers
    /// after they drain their queues.
    pub async fn shutdown(self) {
        self.publisher.settle().await;
        self.shutdown.send_replace(true);
        for handle in self.handles {
            if let Err(e) = handle.await {
                error!(error = %e, "worker task failed");
            }
        }
    }
}
