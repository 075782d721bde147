//! CLI argument parsing for migration-lock.
//!
//! Uses clap derive macros for declarative argument definitions.
//! This module defines the command structure; actual implementations
//! are in the `commands` module.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Default configuration file, resolved against the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "migration-lock.yaml";

/// migration-lock: serialize schema migrations across nodes sharing one database.
///
/// A node holding the lock refreshes a lease timestamp while it works. A node
/// that finds the lease older than the staleness threshold takes the lock over.
#[derive(Parser, Debug)]
#[command(name = "migration-lock")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the YAML configuration file (missing file means defaults).
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Log heartbeats and polling at debug level.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands for migration-lock.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create the lock table and its single row.
    ///
    /// Idempotent: an existing table and row are left untouched.
    Init,

    /// Show who holds the lock and whether their lease is stale.
    Status(StatusArgs),

    /// Forcibly clear the lock.
    ///
    /// Requires --force flag to prevent accidental clearing.
    Release(ReleaseArgs),

    /// Run a command while holding the lock.
    ///
    /// Waits for the lock, refreshes the lease while the command runs,
    /// then releases it. The command is not run through a shell.
    Run(RunArgs),
}

/// Arguments for the `status` command.
#[derive(Parser, Debug)]
pub struct StatusArgs {
    /// Print the lock state as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `release` command.
#[derive(Parser, Debug)]
pub struct ReleaseArgs {
    /// Force clearing the lock (required for safety).
    #[arg(long)]
    pub force: bool,
}

/// Arguments for the `run` command.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Command line to run, e.g. "./migrate.sh --apply".
    pub command: String,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
