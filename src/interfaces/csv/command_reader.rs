use crate::domain::customer::Role;
use crate::domain::money::{Amount, MinorUnits};
use crate::error::{LedgerError, Result};
use serde::Deserialize;
use std::io::Read;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CommandKind {
    /// Registers `source` in `source_role`.
    Register,
    /// Assigns float to the super-agent `source`.
    Float,
    Deposit,
    Withdraw,
    Transfer,
    /// Sets the withdraw fee from `source_role` to `destination_role`.
    WithdrawFee,
    TransferFee,
}

/// One row of the command file.
///
/// Columns that a command does not use may be left empty.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CommandRecord {
    pub command: CommandKind,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub source_role: Option<Role>,
    #[serde(default)]
    pub destination: Option<String>,
    #[serde(default)]
    pub destination_role: Option<Role>,
    #[serde(default)]
    pub amount: Option<String>,
}

impl CommandRecord {
    pub fn source(&self) -> Result<&str> {
        self.source
            .as_deref()
            .ok_or(LedgerError::MissingField("source"))
    }

    pub fn source_role(&self) -> Result<Role> {
        self.source_role
            .ok_or(LedgerError::MissingField("source_role"))
    }

    pub fn destination(&self) -> Result<&str> {
        self.destination
            .as_deref()
            .ok_or(LedgerError::MissingField("destination"))
    }

    pub fn destination_role(&self) -> Result<Role> {
        self.destination_role
            .ok_or(LedgerError::MissingField("destination_role"))
    }

    /// Whole major-unit amount of a movement or float assignment.
    pub fn amount(&self) -> Result<Amount> {
        Amount::parse(self.raw_amount()?)
    }

    /// Fee in major units, up to two decimal places.
    pub fn fee(&self) -> Result<MinorUnits> {
        MinorUnits::parse_major(self.raw_amount()?)
    }

    fn raw_amount(&self) -> Result<&str> {
        self.amount
            .as_deref()
            .ok_or(LedgerError::MissingField("amount"))
    }
}

/// Reads ledger commands from a CSV source.
///
/// Whitespace is trimmed and short rows are accepted, so trailing unused
/// columns can be omitted.
pub struct CommandReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> CommandReader<R> {
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    /// Lazily deserializes one command per row.
    pub fn commands(self) -> impl Iterator<Item = Result<CommandRecord>> {
        self.reader
            .into_deserialize()
            .map(|result| result.map_err(LedgerError::from))
    }
}
