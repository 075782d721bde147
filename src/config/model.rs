//! Config struct definition and default implementation.

use super::types::*;
use serde::{Deserialize, Serialize};

/// Configuration for the migration lock.
///
/// This struct represents the contents of `migration-lock.yaml`.
/// Unknown fields in the YAML are ignored for forward compatibility.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    // =========================================================================
    // Database settings
    // =========================================================================
    /// Path to the shared SQLite database.
    #[serde(default = "default_database")]
    pub database: String,

    /// Name of the single-row lock table.
    #[serde(default = "default_lock_table")]
    pub lock_table: String,

    /// How long a statement waits on a locked database before failing.
    #[serde(default = "default_busy_timeout_millis")]
    pub busy_timeout_millis: u64,

    // =========================================================================
    // Lease settings
    // =========================================================================
    /// Interval between heartbeat writes while holding the lease (0 = default).
    #[serde(default = "default_refresh_interval_millis")]
    pub refresh_interval_millis: u64,

    /// Age beyond which another node's lease is stale (0 = default).
    #[serde(default = "default_max_idle_millis")]
    pub max_idle_millis: u64,

    /// Delay between acquisition attempts while the lock is busy (0 = default).
    #[serde(default = "default_polling_delay_millis")]
    pub polling_delay_millis: u64,

    /// Identity recorded as the lock holder. Defaults to `user@host (pid N)`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: default_database(),
            lock_table: default_lock_table(),
            busy_timeout_millis: default_busy_timeout_millis(),
            refresh_interval_millis: default_refresh_interval_millis(),
            max_idle_millis: default_max_idle_millis(),
            polling_delay_millis: default_polling_delay_millis(),
            owner: None,
        }
    }
}
