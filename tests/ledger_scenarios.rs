use chrono::Utc;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;
use wallet_ledger::application::engine::WalletEngine;
use wallet_ledger::config::LedgerConfig;
use wallet_ledger::domain::charge::Route;
use wallet_ledger::domain::customer::{Customer, OwnerId, Role};
use wallet_ledger::domain::money::{Amount, MinorUnits};
use wallet_ledger::domain::movement::{Movement, MovementKind, Operation, TopologyViolation};
use wallet_ledger::domain::ports::{Stores, TransactionStore};
use wallet_ledger::domain::statement::Entry;
use wallet_ledger::error::LedgerError;
use wallet_ledger::infrastructure::in_memory::{InMemoryCustomerDirectory, InMemoryStore};

async fn engine() -> WalletEngine {
    let mut engine = WalletEngine::start(
        &LedgerConfig::default(),
        Stores::shared(InMemoryStore::new()),
    );
    engine.wait_for_tariff().await;
    engine
}

async fn customer(engine: &WalletEngine, role: Role, balance: i64) -> Customer {
    let customer = Customer::new(OwnerId::new(), role);
    engine.accountant().open_account(customer.id).await.unwrap();
    if balance > 0 {
        engine
            .accountant()
            .credit(
                customer.id,
                Amount::new(balance).unwrap().to_minor(),
                Operation::FloatAssignment,
            )
            .await
            .unwrap();
    }
    customer
}

async fn set_fee(engine: &WalletEngine, route: Route, fee: i64) {
    let charge = engine.tariff().charge_for(route).await.unwrap();
    engine
        .tariff()
        .update_charge(charge.id, MinorUnits::new(fee * 100))
        .await
        .unwrap();
}

fn movement(kind: MovementKind, source: Customer, destination: Customer, amount: i64) -> Movement {
    Movement {
        kind,
        source,
        destination,
        amount: Amount::new(amount).unwrap(),
    }
}

async fn balance(engine: &WalletEngine, customer: Customer) -> Decimal {
    engine.accountant().balance(customer.id).await.unwrap()
}

#[tokio::test]
async fn test_agent_deposit_to_subscriber() {
    let engine = engine().await;
    let agent = customer(&engine, Role::Agent, 1_000).await;
    let subscriber = customer(&engine, Role::Subscriber, 0).await;

    engine
        .transactor()
        .transact(movement(MovementKind::Deposit, agent, subscriber, 100))
        .await
        .unwrap();

    assert_eq!(balance(&engine, subscriber).await, dec!(100));
    assert_eq!(balance(&engine, agent).await, dec!(900));

    let ledger = engine.ledger();
    let subscriber_rows = ledger.statements(subscriber.id, Utc::now(), 10).await.unwrap();
    assert_eq!(subscriber_rows.len(), 1);
    assert_eq!(subscriber_rows[0].entry, Entry::Credit(MinorUnits::new(10_000)));

    let agent_rows = ledger.statements(agent.id, Utc::now(), 1).await.unwrap();
    assert_eq!(agent_rows[0].entry, Entry::Debit(MinorUnits::new(10_000)));
    assert_eq!(agent_rows[0].operation, Operation::Deposit);
}

#[tokio::test]
async fn test_withdraw_fee_is_charged_but_not_credited() {
    let engine = engine().await;
    set_fee(
        &engine,
        Route::new(MovementKind::Withdraw, Role::Subscriber, Role::Agent),
        2,
    )
    .await;
    let subscriber = customer(&engine, Role::Subscriber, 50).await;
    let agent = customer(&engine, Role::Agent, 500).await;

    engine
        .transactor()
        .transact(movement(MovementKind::Withdraw, subscriber, agent, 20))
        .await
        .unwrap();

    assert_eq!(balance(&engine, subscriber).await, dec!(28));
    assert_eq!(balance(&engine, agent).await, dec!(520));

    let rows = engine
        .ledger()
        .statements(subscriber.id, Utc::now(), 1)
        .await
        .unwrap();
    assert_eq!(rows[0].debit_amount(), MinorUnits::new(2_200));
}

#[tokio::test]
async fn test_super_agents_cannot_transfer_to_each_other() {
    let engine = engine().await;
    let a = customer(&engine, Role::SuperAgent, 100).await;
    let b = customer(&engine, Role::SuperAgent, 100).await;

    let err = engine
        .transactor()
        .transact(movement(MovementKind::Transfer, a, b, 50))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        LedgerError::Topology(TopologyViolation::SuperAgentCannotTransfer)
    ));
    assert_eq!(balance(&engine, a).await, dec!(100));
    assert_eq!(balance(&engine, b).await, dec!(100));
}

#[tokio::test]
async fn test_random_transfers_conserve_value_minus_fees() {
    let engine = engine().await;
    set_fee(
        &engine,
        Route::new(MovementKind::Transfer, Role::Subscriber, Role::Subscriber),
        1,
    )
    .await;

    let mut subscribers = Vec::new();
    for _ in 0..8 {
        subscribers.push(customer(&engine, Role::Subscriber, 300).await);
    }

    let mut rng = StdRng::seed_from_u64(42);
    let mut settled = 0i64;
    for _ in 0..300 {
        let from = rng.gen_range(0..subscribers.len());
        let to = rng.gen_range(0..subscribers.len());
        let amount = rng.gen_range(1..=120);
        match engine
            .transactor()
            .transact(movement(
                MovementKind::Transfer,
                subscribers[from],
                subscribers[to],
                amount,
            ))
            .await
        {
            Ok(()) => settled += 1,
            Err(
                LedgerError::SameAccountTransaction
                | LedgerError::AmountBelowMinimum { .. }
                | LedgerError::InsufficientBalance { .. },
            ) => {}
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    let mut total = Decimal::ZERO;
    for subscriber in &subscribers {
        let balance = balance(&engine, *subscriber).await;
        assert!(balance >= Decimal::ZERO);
        total += balance;
    }
    assert!(settled > 0);
    assert_eq!(total, Decimal::from(8 * 300 - settled));
}

#[tokio::test]
async fn test_teller_resolves_counterparties() {
    let engine = engine().await;
    let directory = InMemoryCustomerDirectory::new();
    let publisher = engine.publisher();

    let boss = directory.register("boss@example.com", Role::SuperAgent).await.unwrap();
    let agent = directory.register("agent@example.com", Role::Agent).await.unwrap();
    let subscriber = directory.register("0700000001", Role::Subscriber).await.unwrap();
    for registered in [boss, agent, subscriber] {
        publisher.customer_created(registered.id, registered.role);
    }
    engine.settle().await;

    let teller = engine.teller(Arc::new(directory.clone()));
    engine
        .transactor()
        .assign_float(boss, Amount::new(1_000).unwrap())
        .await
        .unwrap();
    teller
        .deposit(boss, "agent@example.com", Role::Agent, Amount::new(600).unwrap())
        .await
        .unwrap();
    teller
        .deposit(agent, "0700000001", Role::Subscriber, Amount::new(200).unwrap())
        .await
        .unwrap();
    teller
        .withdraw(subscriber, "agent@example.com", Amount::new(50).unwrap())
        .await
        .unwrap();

    assert_eq!(balance(&engine, boss).await, dec!(400));
    assert_eq!(balance(&engine, agent).await, dec!(450));
    assert_eq!(balance(&engine, subscriber).await, dec!(150));

    // a super-agent found through an agent lookup is still a super-agent
    let err = teller
        .withdraw(subscriber, "boss@example.com", Amount::new(10).unwrap())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        LedgerError::Topology(TopologyViolation::SuperAgentCannotWithdraw)
    ));

    let err = teller
        .transfer(subscriber, "nobody", Role::Subscriber, Amount::new(10).unwrap())
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::CustomerNotFound { .. }));
}

#[tokio::test]
async fn test_every_leg_becomes_a_transaction_record() {
    let store = InMemoryStore::new();
    let mut engine = WalletEngine::start(&LedgerConfig::default(), Stores::shared(store.clone()));
    engine.wait_for_tariff().await;
    let agent = customer(&engine, Role::Agent, 1_000).await;
    let subscriber = customer(&engine, Role::Subscriber, 0).await;

    for _ in 0..5 {
        engine
            .transactor()
            .transact(movement(MovementKind::Deposit, agent, subscriber, 10))
            .await
            .unwrap();
    }
    engine.settle().await;
    assert!(engine.dead_letters().is_empty());
    engine.shutdown().await.unwrap();

    let records = store.all_transactions().await.unwrap();
    assert_eq!(records.len(), 10);
    assert_eq!(
        records.iter().filter(|r| r.owner == subscriber.id).count(),
        5
    );
}
