//! Configuration types and defaults for the migration lock.

use crate::error::{LeaseError, Result};
use std::fmt;

/// Default heartbeat interval while holding the lease.
pub const DEFAULT_REFRESH_INTERVAL_MILLIS: u64 = 20_000;

/// Default age beyond which a lease is stale.
pub const DEFAULT_MAX_IDLE_MILLIS: u64 = 60_000;

/// Default delay between acquisition attempts.
pub const DEFAULT_POLLING_DELAY_MILLIS: u64 = 10_000;

// Default value functions for serde
pub(crate) fn default_database() -> String {
    "migrations.db".to_string()
}
pub(crate) fn default_lock_table() -> String {
    "migration_lock".to_string()
}
pub(crate) fn default_refresh_interval_millis() -> u64 {
    DEFAULT_REFRESH_INTERVAL_MILLIS
}
pub(crate) fn default_max_idle_millis() -> u64 {
    DEFAULT_MAX_IDLE_MILLIS
}
pub(crate) fn default_polling_delay_millis() -> u64 {
    DEFAULT_POLLING_DELAY_MILLIS
}
pub(crate) fn default_busy_timeout_millis() -> u64 {
    5_000
}

/// A validated SQL identifier naming the lock table.
///
/// Table names cannot be bound as statement parameters, so every statement
/// formats this name in; only `[A-Za-z_][A-Za-z0-9_]*` is accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockTable(String);

impl LockTable {
    pub fn new(name: &str) -> Result<Self> {
        let mut chars = name.chars();
        let valid = match chars.next() {
            Some(first) if first.is_ascii_alphabetic() || first == '_' => {
                chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
            }
            _ => false,
        };

        if !valid {
            return Err(LeaseError::Config(format!(
                "lock_table '{}' is not a valid identifier (expected [A-Za-z_][A-Za-z0-9_]*)",
                name
            )));
        }
        Ok(Self(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LockTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
