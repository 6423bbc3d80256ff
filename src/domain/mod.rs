//! Domain types and the persistence ports the ledger depends on.

pub mod account;
pub mod charge;
pub mod customer;
pub mod money;
pub mod movement;
pub mod ports;
pub mod statement;
pub mod transaction;
