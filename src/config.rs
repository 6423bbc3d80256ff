use crate::error::{LedgerError, Result};
use serde::Deserialize;
use std::path::Path;

/// Runtime knobs of the ledger core.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LedgerConfig {
    /// Bound of the customer-creation queue.
    pub customer_queue_capacity: usize,
    /// Bound of the transaction-completion queue.
    pub transaction_queue_capacity: usize,
    /// Compare-and-set attempts before a balance write gives up.
    pub max_balance_retries: usize,
    /// `tracing_subscriber::EnvFilter` directive used by the binary.
    pub log_filter: String,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            customer_queue_capacity: 10,
            transaction_queue_capacity: 50,
            max_balance_retries: 8,
            log_filter: "info".to_string(),
        }
    }
}

impl LedgerConfig {
    /// Reads a JSON config file; missing fields keep their defaults.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)
            .map_err(|e| LedgerError::InvalidConfig(e.to_string()))?;
        config.validated()
    }

    pub fn validated(self) -> Result<Self> {
        if self.customer_queue_capacity == 0 || self.transaction_queue_capacity == 0 {
            return Err(LedgerError::InvalidConfig(
                "queue capacities must be at least 1".to_string(),
            ));
        }
        if self.max_balance_retries == 0 {
            return Err(LedgerError::InvalidConfig(
                "max_balance_retries must be at least 1".to_string(),
            ));
        }
        Ok(self)
    }
}
