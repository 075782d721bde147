//! Lock status and clearing operations.

use super::owner::default_owner;
use super::types::LockInfo;
use crate::clock::Clock;
use crate::coordinator::lease_is_stale;
use crate::db::Database;
use crate::error::{LeaseError, Result};
use crate::native::NativeLock;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// Read the current state of the lock.
///
/// # Arguments
///
/// * `db` - The shared database
/// * `max_idle` - Staleness threshold
/// * `clock` - Source of "now" for the lease age
///
/// # Returns
///
/// * `Ok(LockInfo)` - The lock state
/// * `Err(LeaseError::LockError)` - The lock row does not exist (run `init`)
pub fn lock_status(db: &Database, max_idle: Duration, clock: &dyn Clock) -> Result<LockInfo> {
    let row = db.read_lock_row()?.ok_or_else(|| {
        LeaseError::LockError(format!(
            "lock row missing from table '{}'; run `migration-lock init`",
            db.table()
        ))
    })?;

    let now = clock.now();
    let is_stale = row.locked
        && row
            .granted_at
            .is_some_and(|granted_at| lease_is_stale(granted_at, now, max_idle));

    Ok(LockInfo {
        table: db.table().to_string(),
        locked: row.locked,
        owner: row.locked_by,
        granted_at: row.granted_at,
        idle_millis: row
            .granted_at
            .map(|granted_at| now.signed_duration_since(granted_at).num_milliseconds()),
        is_stale,
    })
}

/// Forcibly clear the lock.
///
/// The caller is responsible for verifying that clearing the lock is
/// appropriate (e.g., checking --force). A live holder that is cleared keeps
/// running its migration unprotected.
///
/// # Returns
///
/// * `Ok(LockInfo)` - The lock state before clearing (for audit purposes)
/// * `Err(LeaseError::UserError)` - The lock is not held
pub fn clear_lock(db: &Database, max_idle: Duration, clock: Arc<dyn Clock>) -> Result<LockInfo> {
    let before = lock_status(db, max_idle, clock.as_ref())?;
    if !before.locked {
        return Err(LeaseError::UserError(format!(
            "lock '{}' is not held; nothing to clear",
            before.table
        )));
    }

    if !before.is_stale {
        warn!(owner = ?before.owner, "clearing a lock whose lease is still fresh");
    }

    db.native_lock(default_owner(), clock)?.force_release()?;
    Ok(before)
}
