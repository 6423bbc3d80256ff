//! Application layer orchestrating the ledger core.
//!
//! The `WalletEngine` wires the `Accountant` (the only writer of balances), the
//! `TariffManager`, the `Transactor` business rules and the background event
//! `Pipeline` onto a set of storage ports.

pub mod accountant;
pub mod engine;
pub mod events;
pub mod ledger;
pub mod tariff;
pub mod teller;
pub mod transactor;
pub mod workers;
