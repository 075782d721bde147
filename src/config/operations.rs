//! Config loading, validation, and utility operations.

use super::model::Config;
use super::types::{
    DEFAULT_MAX_IDLE_MILLIS, DEFAULT_POLLING_DELAY_MILLIS, DEFAULT_REFRESH_INTERVAL_MILLIS,
    LockTable,
};
use crate::error::{LeaseError, Result};
use std::path::Path;
use std::time::Duration;

impl Config {
    /// Load config from a YAML file.
    ///
    /// Unknown fields in the YAML are silently ignored for forward compatibility.
    ///
    /// # Returns
    ///
    /// * `Ok(Config)` - Successfully loaded and validated config
    /// * `Err(LeaseError::Config)` - Read error, parse error or validation failure
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path).map_err(|e| {
            LeaseError::Config(format!(
                "failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        Self::from_yaml(&content)
    }

    /// Load config from a YAML file, or defaults when the file does not exist.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Parse config from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Config = serde_yaml::from_str(yaml)
            .map_err(|e| LeaseError::Config(format!("failed to parse config YAML: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Serialize config to YAML string.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self)
            .map_err(|e| LeaseError::Config(format!("failed to serialize config to YAML: {}", e)))
    }

    /// Validate config values and return error on invalid values.
    ///
    /// Validation rules:
    /// - `lock_table` must be a plain SQL identifier
    /// - `database` must be non-empty
    /// - the effective `max_idle_millis` must exceed the effective `refresh_interval_millis`,
    ///   otherwise a live holder could look stale between two heartbeats
    pub fn validate(&self) -> Result<()> {
        LockTable::new(&self.lock_table)?;

        if self.database.trim().is_empty() {
            return Err(LeaseError::Config(
                "config validation failed: database must not be empty".to_string(),
            ));
        }

        if self.max_idle() <= self.refresh_interval() {
            return Err(LeaseError::Config(format!(
                "config validation failed: max_idle_millis ({}) must be greater than refresh_interval_millis ({})",
                self.max_idle().as_millis(),
                self.refresh_interval().as_millis()
            )));
        }

        Ok(())
    }

    /// The validated lock table identifier.
    pub fn lock_table(&self) -> Result<LockTable> {
        LockTable::new(&self.lock_table)
    }

    /// Effective heartbeat interval; a zero value falls back to the default.
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(or_default(
            self.refresh_interval_millis,
            DEFAULT_REFRESH_INTERVAL_MILLIS,
        ))
    }

    /// Effective staleness threshold; a zero value falls back to the default.
    pub fn max_idle(&self) -> Duration {
        Duration::from_millis(or_default(self.max_idle_millis, DEFAULT_MAX_IDLE_MILLIS))
    }

    /// Effective wait between acquisition attempts; a zero value falls back to the default.
    pub fn polling_delay(&self) -> Duration {
        Duration::from_millis(or_default(
            self.polling_delay_millis,
            DEFAULT_POLLING_DELAY_MILLIS,
        ))
    }

    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_millis)
    }
}

fn or_default(value: u64, default: u64) -> u64 {
    if value == 0 { default } else { value }
}
