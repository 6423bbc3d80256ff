//! Outer adapters driving the ledger core.

pub mod csv;
