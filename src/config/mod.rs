//! Configuration model for the migration lock.
//!
//! This module defines the Config struct that represents `migration-lock.yaml`.
//! It supports forward-compatible YAML parsing (unknown fields are ignored),
//! sensible defaults for optional fields, and validation of config values.
//!
//! The two lease tunables are consumed through [`ConfigSource`], which is read
//! on every use so a running node picks up retuned values.

mod model;
mod operations;
mod source;
pub mod types;


// Re-export public API
pub use model::Config;
pub use source::{ConfigFile, ConfigSource};
pub use types::LockTable;
