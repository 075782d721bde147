//! Row-flag lock on the shared lock table.

use super::NativeLock;
use crate::clock::Clock;
use crate::config::LockTable;
use crate::db::{LOCK_ROW_ID, format_timestamp};
use crate::error::Result;
use rusqlite::{Connection, params};
use std::fmt;
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

/// Lock implemented as a conditional update of the `locked` flag.
///
/// Acquisition also stamps `granted_at` and records the owner in `locked_by`.
/// Releasing clears the flag but leaves the stamp in place.
pub struct SqliteNativeLock {
    conn: Mutex<Connection>,
    table: LockTable,
    owner: String,
    clock: Arc<dyn Clock>,
}

impl SqliteNativeLock {
    pub fn new(conn: Connection, table: LockTable, owner: String, clock: Arc<dyn Clock>) -> Self {
        Self {
            conn: Mutex::new(conn),
            table,
            owner,
            clock,
        }
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }
}

impl fmt::Debug for SqliteNativeLock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteNativeLock")
            .field("table", &self.table)
            .field("owner", &self.owner)
            .finish_non_exhaustive()
    }
}

impl NativeLock for SqliteNativeLock {
    fn try_acquire(&self) -> Result<bool> {
        let conn = self.conn.lock().unwrap_or_else(|p| p.into_inner());
        let changed = conn.execute(
            &format!(
                "UPDATE {} SET locked = 1, granted_at = ?1, locked_by = ?2 WHERE id = ?3 AND locked = 0",
                self.table
            ),
            params![format_timestamp(self.clock.now()), self.owner, LOCK_ROW_ID],
        )?;
        Ok(changed == 1)
    }

    fn force_release(&self) -> Result<()> {
        let conn = self.conn.lock().unwrap_or_else(|p| p.into_inner());
        conn.execute(
            &format!(
                "UPDATE {} SET locked = 0, locked_by = NULL WHERE id = ?1",
                self.table
            ),
            params![LOCK_ROW_ID],
        )?;
        Ok(())
    }

    fn release(&self) -> Result<()> {
        let conn = self.conn.lock().unwrap_or_else(|p| p.into_inner());
        let changed = conn.execute(
            &format!(
                "UPDATE {} SET locked = 0, locked_by = NULL WHERE id = ?1 AND locked = 1 AND locked_by = ?2",
                self.table
            ),
            params![LOCK_ROW_ID, self.owner],
        )?;

        if changed == 0 {
            // Someone force-released us; whatever is in the row now is not ours to clear.
            warn!(owner = %self.owner, "lock was no longer held by this owner at release");
        } else {
            debug!(owner = %self.owner, "lock released");
        }
        Ok(())
    }
}
