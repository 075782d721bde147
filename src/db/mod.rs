//! Connection provider for the database shared by all nodes.
//!
//! Every collaborator gets its own connection: each native lock handle and
//! each lease store opens a dedicated one, so heartbeats are not queued
//! behind statements issued on the lock handle's connection.

mod schema;

#[cfg(test)]
mod tests;

use crate::clock::Clock;
use crate::config::{Config, LockTable};
use crate::error::Result;
use crate::native::SqliteNativeLock;
use crate::store::SqliteLeaseStore;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension, types::Type};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

pub use schema::ensure_lock_table;

/// Fixed identity of the single lock row.
pub const LOCK_ROW_ID: i64 = 1;

/// Snapshot of the lock row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockRow {
    pub locked: bool,
    pub granted_at: Option<DateTime<Utc>>,
    pub locked_by: Option<String>,
}

/// Handle on the shared SQLite database holding the lock table.
#[derive(Debug, Clone)]
pub struct Database {
    path: PathBuf,
    table: LockTable,
    busy_timeout: Duration,
}

impl Database {
    /// Open the database at `path` and provision the lock table and its row.
    ///
    /// If the file doesn't exist, it will be created.
    pub fn open<P: AsRef<Path>>(path: P, table: LockTable, busy_timeout: Duration) -> Result<Self> {
        let db = Self {
            path: path.as_ref().to_path_buf(),
            table,
            busy_timeout,
        };

        let conn = db.connect()?;
        let _mode: String = conn.query_row("PRAGMA journal_mode=WAL", [], |row| row.get(0))?;
        ensure_lock_table(&conn, &db.table)?;
        Ok(db)
    }

    /// Open the database named by the configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::open(&config.database, config.lock_table()?, config.busy_timeout())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn table(&self) -> &LockTable {
        &self.table
    }

    /// Open a fresh connection with the configured busy timeout.
    pub fn connect(&self) -> Result<Connection> {
        let conn = Connection::open(&self.path)?;
        conn.busy_timeout(self.busy_timeout)?;
        Ok(conn)
    }

    /// A lease store on its own dedicated connection.
    pub fn lease_store(&self) -> Result<SqliteLeaseStore> {
        Ok(SqliteLeaseStore::new(self.connect()?, self.table.clone()))
    }

    /// A native lock handle recording `owner` as the holder.
    pub fn native_lock(
        &self,
        owner: impl Into<String>,
        clock: Arc<dyn Clock>,
    ) -> Result<SqliteNativeLock> {
        Ok(SqliteNativeLock::new(
            self.connect()?,
            self.table.clone(),
            owner.into(),
            clock,
        ))
    }

    /// Read the whole lock row, if present.
    pub fn read_lock_row(&self) -> Result<Option<LockRow>> {
        let conn = self.connect()?;
        let sql = format!(
            "SELECT locked, granted_at, locked_by FROM {} WHERE id = ?1",
            self.table
        );
        let row = conn
            .query_row(&sql, [LOCK_ROW_ID], |row| {
                let locked: i64 = row.get(0)?;
                let granted_at: Option<String> = row.get(1)?;
                let locked_by: Option<String> = row.get(2)?;
                Ok((locked, granted_at, locked_by))
            })
            .optional()?;

        match row {
            None => Ok(None),
            Some((locked, granted_at, locked_by)) => Ok(Some(LockRow {
                locked: locked != 0,
                granted_at: granted_at.as_deref().map(|s| parse_timestamp(s, 1)).transpose()?,
                locked_by,
            })),
        }
    }
}

/// Render a timestamp the way it is stored in the lock table.
pub(crate) fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse a stored timestamp; `column` is only used for the error.
pub(crate) fn parse_timestamp(value: &str, column: usize) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|at| at.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(column, Type::Text, Box::new(e)))
}
