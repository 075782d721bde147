//! Lock table provisioning.

use super::LOCK_ROW_ID;
use crate::config::LockTable;
use crate::error::Result;
use rusqlite::Connection;
use tracing::debug;

/// Create the lock table and its fixed row if either is missing.
///
/// Safe to run concurrently from several nodes: both statements are no-ops
/// once the table and row exist.
pub fn ensure_lock_table(conn: &Connection, table: &LockTable) -> Result<()> {
    conn.execute_batch(&format!(
        r#"
        CREATE TABLE IF NOT EXISTS {table} (
            id INTEGER PRIMARY KEY,
            locked INTEGER NOT NULL DEFAULT 0,
            granted_at TEXT,
            locked_by TEXT
        );

        INSERT OR IGNORE INTO {table} (id, locked) VALUES ({LOCK_ROW_ID}, 0);
        "#
    ))?;
    debug!(table = %table, "lock table ready");
    Ok(())
}
