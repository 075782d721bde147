//! Exit code constants for the migration-lock CLI.
//!
//! - 0: Success
//! - 1: User error (bad args, invalid configuration)
//! - 2: Database failure
//! - 3: The wrapped migration command failed
//! - 4: Lock failure (could not heartbeat, could not release)

/// Successful execution.
pub const SUCCESS: i32 = 0;

/// User error: bad arguments or invalid configuration.
pub const USER_ERROR: i32 = 1;

/// Database failure: the lock table could not be read or written.
pub const DATABASE_FAILURE: i32 = 2;

/// The command run under the lease exited unsuccessfully.
pub const COMMAND_FAILURE: i32 = 3;

/// Lock failure: heartbeat could not be scheduled or the lock could not be released.
pub const LOCK_FAILURE: i32 = 4;
