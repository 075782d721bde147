//! Error types for the migration lock.
//!
//! Uses thiserror for derive macros and provides operator-actionable messages.

use crate::exit_codes;
use thiserror::Error;

/// Main error type for lease operations.
///
/// Each variant maps to a specific exit code for the CLI.
#[derive(Error, Debug)]
pub enum LeaseError {
    /// User provided invalid arguments or the system is in an invalid state.
    #[error("{0}")]
    UserError(String),

    /// Configuration could not be read or failed validation.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// A statement against the lock table failed.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// The coordinator was used before its lease store was supplied.
    #[error("Lease coordinator not configured: {0}")]
    NotConfigured(String),

    /// The heartbeat task could not be scheduled.
    #[error("Failed to schedule lease refresh: {0}")]
    Schedule(String),

    /// The native lock could not be released; the lease is still held.
    #[error("Failed to release lock: {0}")]
    Release(String),

    /// Lock state does not allow the requested operation.
    #[error("Lock operation failed: {0}")]
    LockError(String),

    /// The command run under the lease failed.
    #[error("Command failed: {0}")]
    CommandFailed(String),

    /// I/O failure (spawning commands, reading files).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl LeaseError {
    /// Returns the appropriate exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            LeaseError::UserError(_) | LeaseError::Config(_) => exit_codes::USER_ERROR,
            LeaseError::Database(_) => exit_codes::DATABASE_FAILURE,
            LeaseError::CommandFailed(_) | LeaseError::Io(_) => exit_codes::COMMAND_FAILURE,
            LeaseError::NotConfigured(_)
            | LeaseError::Schedule(_)
            | LeaseError::Release(_)
            | LeaseError::LockError(_) => exit_codes::LOCK_FAILURE,
        }
    }
}

/// Result type alias for lease operations.
pub type Result<T> = std::result::Result<T, LeaseError>;
