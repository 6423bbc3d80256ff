use crate::error::{LedgerError, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Minor units per major currency unit.
pub const MINOR_PER_MAJOR: i64 = 100;

/// A monetary value in minor currency units (paisas, cents).
///
/// Balances and fees are carried in this form everywhere inside the ledger.
/// Conversion to a displayable major-unit value happens only through [`MinorUnits::to_major`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct MinorUnits(i64);

impl MinorUnits {
    pub const ZERO: Self = Self(0);

    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> i64 {
        self.0
    }

    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }

    pub fn is_negative(&self) -> bool {
        self.0 < 0
    }

    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Self)
    }

    pub fn checked_sub(self, rhs: Self) -> Option<Self> {
        self.0.checked_sub(rhs.0).map(Self)
    }

    /// Exact major-unit value with two decimal places.
    pub fn to_major(&self) -> Decimal {
        Decimal::new(self.0, 2)
    }

    /// Parses a major-unit decimal such as `2.50` into minor units.
    ///
    /// Rejects negative values and anything finer than one minor unit.
    pub fn parse_major(text: &str) -> Result<Self> {
        let value: Decimal = text
            .trim()
            .parse()
            .map_err(|_| LedgerError::InvalidAmount(format!("`{text}` is not a number")))?;
        if value.is_sign_negative() {
            return Err(LedgerError::InvalidAmount(format!(
                "`{text}` must not be negative"
            )));
        }
        let minor = value * Decimal::from(MINOR_PER_MAJOR);
        if !minor.fract().is_zero() {
            return Err(LedgerError::InvalidAmount(format!(
                "`{text}` has more than two decimal places"
            )));
        }
        i64::try_from(minor)
            .map(Self)
            .map_err(|_| LedgerError::InvalidAmount(format!("`{text}` is out of range")))
    }
}

impl fmt::Display for MinorUnits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_major())
    }
}

/// A positive, whole major-unit amount requested for a movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Amount(i64);

impl Amount {
    pub fn new(value: i64) -> Result<Self> {
        if value <= 0 {
            return Err(LedgerError::InvalidAmount(
                "amount must be positive".to_string(),
            ));
        }
        if value.checked_mul(MINOR_PER_MAJOR).is_none() {
            return Err(LedgerError::InvalidAmount(format!(
                "amount {value} is out of range"
            )));
        }
        Ok(Self(value))
    }

    pub fn value(&self) -> i64 {
        self.0
    }

    pub fn to_minor(&self) -> MinorUnits {
        // bounded in `new`
        MinorUnits(self.0 * MINOR_PER_MAJOR)
    }

    /// Parses a whole major-unit amount; `10` and `10.00` are accepted, `10.5` is not.
    pub fn parse(text: &str) -> Result<Self> {
        let value: Decimal = text
            .trim()
            .parse()
            .map_err(|_| LedgerError::InvalidAmount(format!("`{text}` is not a number")))?;
        if !value.fract().is_zero() {
            return Err(LedgerError::InvalidAmount(format!(
                "`{text}` is not a whole amount"
            )));
        }
        let whole = i64::try_from(value)
            .map_err(|_| LedgerError::InvalidAmount(format!("`{text}` is out of range")))?;
        Self::new(whole)
    }
}

impl TryFrom<i64> for Amount {
    type Error = LedgerError;

    fn try_from(value: i64) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Amount> for MinorUnits {
    fn from(amount: Amount) -> Self {
        amount.to_minor()
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
