//! Implementation of the `migration-lock run` command.
//!
//! Holds the shared lock for the lifetime of a child process:
//!
//! 1. Waits for the lock, taking over a holder whose lease went stale
//! 2. Refreshes the lease on a background thread while the child runs
//! 3. Releases the lock once the child exits, whatever its status
//!
//! The config file is re-read for `max_idle_millis` on every staleness check
//! and for `refresh_interval_millis` whenever the heartbeat is scheduled.

use crate::clock::{Clock, SystemClock};
use crate::config::{Config, ConfigFile, ConfigSource};
use crate::coordinator::StaleLockCoordinator;
use crate::db::Database;
use crate::error::{LeaseError, Result};
use crate::locks::default_owner;
use crate::native::NativeLock;
use crate::scheduler::{Scheduler, ThreadScheduler};
use crate::store::LeaseStore;
use std::path::Path;
use std::process::Command;
use std::sync::Arc;
use tracing::{info, info_span};

/// Execute the `migration-lock run` command.
pub fn cmd_run(config_path: &Path, config: &Config, command_line: &str) -> Result<()> {
    let argv = split_command(command_line)?;
    let db = Database::from_config(config)?;
    let owner = config.owner.clone().unwrap_or_else(default_owner);

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let native: Arc<dyn NativeLock> = Arc::new(db.native_lock(owner.clone(), clock.clone())?);
    let store: Arc<dyn LeaseStore> = Arc::new(db.lease_store()?);
    let scheduler = ThreadScheduler::new();
    let settings: Arc<dyn ConfigSource> = Arc::new(ConfigFile::new(config_path));

    let coordinator = StaleLockCoordinator::new(
        native,
        Arc::new(scheduler.clone()) as Arc<dyn Scheduler>,
        settings,
        clock,
    )
    .with_span(info_span!("migration_lock", owner = %owner, table = %db.table()));
    coordinator.set_database(store);

    info!(command = %command_line, "waiting for migration lock");
    let outcome = coordinator.run_exclusive(|| Command::new(&argv[0]).args(&argv[1..]).status());
    scheduler.shutdown();

    let status = outcome?.map_err(|e| {
        LeaseError::CommandFailed(format!("failed to start '{}': {}", argv[0], e))
    })?;

    if !status.success() {
        return Err(LeaseError::CommandFailed(format!(
            "'{}' exited with {}",
            command_line, status
        )));
    }

    info!(command = %command_line, "command finished; lock released");
    Ok(())
}

/// Split a command line into program and arguments without invoking a shell.
fn split_command(command_line: &str) -> Result<Vec<String>> {
    let argv = shell_words::split(command_line)
        .map_err(|e| LeaseError::UserError(format!("invalid command '{}': {}", command_line, e)))?;
    if argv.is_empty() {
        return Err(LeaseError::UserError("command must not be empty".to_string()));
    }
    Ok(argv)
}
