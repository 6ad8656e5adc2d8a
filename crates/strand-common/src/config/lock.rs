//! Lock manager configuration.

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_RESOURCE_CAPACITY, DEFAULT_TXN_CAPACITY, RESOURCE_SEPARATOR, ROOT_RESOURCE_NAME,
};
use crate::error::{LockError, LockResult};

/// Lock manager configuration.
///
/// None of these settings change which locks are granted; they only shape
/// allocation, naming, and self-checking.
///
/// # Example
///
/// ```rust
/// use strand_common::config::LockManagerConfig;
///
/// let config = LockManagerConfig::default();
/// assert_eq!(config.root_context, "database");
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockManagerConfig {
    /// Name of the root resource served by `database_context()`.
    /// Default: "database"
    #[serde(default = "default_root_context")]
    pub root_context: String,

    /// Initial capacity of the resource-entry map.
    /// Default: 64
    #[serde(default = "default_resource_capacity")]
    pub resource_capacity: usize,

    /// Initial capacity of the per-transaction lock map.
    /// Default: 16
    #[serde(default = "default_txn_capacity")]
    pub txn_capacity: usize,

    /// Verify the lock table invariants after every mutating operation
    /// and panic on violation.
    /// Default: false
    #[serde(default)]
    pub check_invariants: bool,
}

fn default_root_context() -> String {
    ROOT_RESOURCE_NAME.to_string()
}

fn default_resource_capacity() -> usize {
    DEFAULT_RESOURCE_CAPACITY
}

fn default_txn_capacity() -> usize {
    DEFAULT_TXN_CAPACITY
}

impl Default for LockManagerConfig {
    fn default() -> Self {
        Self {
            root_context: default_root_context(),
            resource_capacity: default_resource_capacity(),
            txn_capacity: default_txn_capacity(),
            check_invariants: false,
        }
    }
}

impl LockManagerConfig {
    /// Creates a configuration for testing, with invariant checks enabled.
    #[must_use]
    pub fn for_testing() -> Self {
        Self {
            resource_capacity: 8,
            txn_capacity: 4,
            check_invariants: true,
            ..Default::default()
        }
    }

    /// Validates the configuration and returns an error if invalid.
    pub fn validate(&self) -> LockResult<()> {
        if self.root_context.is_empty() {
            return Err(LockError::invalid_config("root_context must not be empty"));
        }

        if self.root_context.contains(RESOURCE_SEPARATOR) {
            return Err(LockError::invalid_config(format!(
                "root_context must be a single segment, got {:?}",
                self.root_context
            )));
        }

        Ok(())
    }
}
