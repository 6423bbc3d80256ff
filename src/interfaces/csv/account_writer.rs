use crate::domain::account::AccountStatus;
use crate::domain::customer::Role;
use crate::error::Result;
use rust_decimal::Decimal;
use serde::Serialize;
use std::io::Write;

/// Final state of one customer's account.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BalanceRow {
    pub customer: String,
    pub role: Role,
    pub balance: Decimal,
    pub status: AccountStatus,
}

pub struct AccountWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> AccountWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    /// Writes the rows sorted by customer identifier.
    pub fn write_rows(&mut self, mut rows: Vec<BalanceRow>) -> Result<()> {
        rows.sort_by(|a, b| a.customer.cmp(&b.customer));
        for row in rows {
            self.writer.serialize(row)?;
        }
        self.writer.flush()?;
        Ok(())
    }
}
