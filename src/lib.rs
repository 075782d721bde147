//! migration-lock: a stale-detecting distributed lock for schema migrations.
//!
//! Several nodes share one database and must not migrate its schema at the
//! same time. Exclusion comes from a lock row in that database (the native
//! lock). On top of it, the holder stamps a lease timestamp at a fixed
//! interval; a waiting node that finds the stamp older than the staleness
//! threshold forcibly releases the lock and takes it over, so a crashed
//! holder cannot block migrations forever.
//!
//! The entry point is [`coordinator::StaleLockCoordinator`]:
//!
//! - [`store`]: reads and writes the lease timestamp
//! - [`scheduler`]: runs the heartbeat at a fixed delay
//! - [`native`]: the underlying database lock
//! - [`locks`]: operator view for inspecting and clearing the lock

pub mod cli;
pub mod clock;
pub mod commands;
pub mod config;
pub mod coordinator;
pub mod db;
pub mod error;
pub mod exit_codes;
pub mod locks;
pub mod native;
pub mod scheduler;
pub mod store;

#[cfg(test)]
pub(crate) mod test_support;

pub use coordinator::{LeaseGuard, StaleLockCoordinator};
pub use error::{LeaseError, Result};
