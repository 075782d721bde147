//! Lease store backed by the shared lock table.

use super::LeaseStore;
use crate::config::LockTable;
use crate::db::{LOCK_ROW_ID, format_timestamp, parse_timestamp};
use crate::error::Result;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use std::sync::Mutex;

/// Lease store holding one dedicated connection for its whole life.
#[derive(Debug)]
pub struct SqliteLeaseStore {
    conn: Mutex<Connection>,
    table: LockTable,
}

impl SqliteLeaseStore {
    pub fn new(conn: Connection, table: LockTable) -> Self {
        Self {
            conn: Mutex::new(conn),
            table,
        }
    }
}

impl LeaseStore for SqliteLeaseStore {
    fn read_granted_at(&self) -> Result<Option<DateTime<Utc>>> {
        let conn = self.conn.lock().unwrap_or_else(|p| p.into_inner());
        let mut stmt = conn.prepare_cached(&format!(
            "SELECT granted_at FROM {} WHERE id = ?1",
            self.table
        ))?;

        let stamp: Option<Option<String>> = stmt
            .query_row(params![LOCK_ROW_ID], |row| row.get(0))
            .optional()?;

        match stamp.flatten() {
            Some(value) => Ok(Some(parse_timestamp(&value, 0)?)),
            None => Ok(None),
        }
    }

    fn write_granted_at(&self, at: DateTime<Utc>) -> Result<bool> {
        let conn = self.conn.lock().unwrap_or_else(|p| p.into_inner());
        let mut stmt = conn.prepare_cached(&format!(
            "UPDATE {} SET granted_at = ?1 WHERE id = ?2",
            self.table
        ))?;

        let changed = stmt.execute(params![format_timestamp(at), LOCK_ROW_ID])?;
        Ok(changed == 1)
    }
}
