//! Command implementations for migration-lock.
//!
//! This module provides the dispatcher that routes CLI commands to their
//! implementations.

mod run;

#[cfg(test)]
mod tests;

use crate::cli::{Command, ReleaseArgs, StatusArgs};
use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::db::Database;
use crate::error::{LeaseError, Result};
use crate::locks;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Dispatch a command to its implementation.
///
/// The configuration is loaded once here; a missing file means defaults.
pub fn dispatch(config_path: &Path, command: Command) -> Result<()> {
    let config = Config::load_or_default(config_path)?;
    match command {
        Command::Init => cmd_init(&config),
        Command::Status(args) => cmd_status(&config, args),
        Command::Release(args) => cmd_release(&config, args),
        Command::Run(args) => run::cmd_run(config_path, &config, &args.command),
    }
}

fn cmd_init(config: &Config) -> Result<()> {
    let db = Database::from_config(config)?;
    info!(database = %db.path().display(), table = %db.table(), "lock table ready");
    println!("Lock table '{}' ready in {}", db.table(), db.path().display());
    Ok(())
}

fn cmd_status(config: &Config, args: StatusArgs) -> Result<()> {
    let db = Database::from_config(config)?;
    let info = locks::lock_status(&db, config.max_idle(), &SystemClock)?;

    if args.json {
        let rendered = serde_json::to_string_pretty(&info)
            .map_err(|e| LeaseError::UserError(format!("failed to render lock state: {}", e)))?;
        println!("{}", rendered);
        return Ok(());
    }

    println!("Lock {}:", info.table);
    if !info.locked {
        println!("  State:      unlocked");
        return Ok(());
    }

    println!("  State:      locked");
    println!("  Owner:      {}", info.owner.as_deref().unwrap_or("unknown"));
    if let Some(granted_at) = info.granted_at {
        println!("  Refreshed:  {}", granted_at.format("%Y-%m-%d %H:%M:%S UTC"));
    }
    println!("  Age:        {}", info.age_string());
    if info.is_stale {
        println!(
            "  Status:     STALE (exceeds {} ms threshold)",
            config.max_idle().as_millis()
        );
        println!();
        println!("Note: the next node to request the lock will take it over.");
        println!("Use `migration-lock release --force` to clear it now.");
    }

    Ok(())
}

fn cmd_release(config: &Config, args: ReleaseArgs) -> Result<()> {
    // Require --force flag
    if !args.force {
        return Err(LeaseError::UserError(
            "refusing to clear lock without --force flag.\n\n\
             Clearing the lock can corrupt the schema if the holder is still migrating.\n\
             Only clear the lock if you are certain the holder has crashed.\n\n\
             To clear the lock, run:\n  migration-lock release --force"
                .to_string(),
        ));
    }

    let db = Database::from_config(config)?;
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let cleared = locks::clear_lock(&db, config.max_idle(), clock)?;

    info!(
        owner = ?cleared.owner,
        age = %cleared.age_string(),
        was_stale = cleared.is_stale,
        "lock cleared by operator"
    );
    println!(
        "Cleared lock held by {} (last refreshed {} ago{})",
        cleared.owner.as_deref().unwrap_or("unknown"),
        cleared.age_string(),
        if cleared.is_stale { ", stale" } else { "" }
    );

    Ok(())
}
