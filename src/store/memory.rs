//! In-process lease store for simulating several nodes in one process.

use super::LeaseStore;
use crate::error::{LeaseError, Result};
use chrono::{DateTime, Utc};
use rusqlite::ffi;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

#[derive(Debug, Default)]
struct Row {
    granted_at: Option<DateTime<Utc>>,
}

/// Lease store kept in memory.
///
/// Writes are serialized by a mutex, so the last committed write wins.
/// `set_failing` makes every operation fail like a busy database until cleared.
#[derive(Debug)]
pub struct MemoryLeaseStore {
    row: Mutex<Option<Row>>,
    writes: AtomicUsize,
    failing: AtomicBool,
}

impl Default for MemoryLeaseStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryLeaseStore {
    /// A store whose row exists but has never been stamped.
    pub fn new() -> Self {
        Self {
            row: Mutex::new(Some(Row::default())),
            writes: AtomicUsize::new(0),
            failing: AtomicBool::new(false),
        }
    }

    /// A store with no lease row at all.
    pub fn without_row() -> Self {
        Self {
            row: Mutex::new(None),
            ..Self::new()
        }
    }

    /// Number of successful stamp writes so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(LeaseError::Database(rusqlite::Error::SqliteFailure(
                ffi::Error::new(ffi::SQLITE_BUSY),
                Some("database is locked".to_string()),
            )));
        }
        Ok(())
    }
}

impl LeaseStore for MemoryLeaseStore {
    fn read_granted_at(&self) -> Result<Option<DateTime<Utc>>> {
        self.check_available()?;
        let row = self.row.lock().unwrap_or_else(|p| p.into_inner());
        Ok(row.as_ref().and_then(|r| r.granted_at))
    }

    fn write_granted_at(&self, at: DateTime<Utc>) -> Result<bool> {
        self.check_available()?;
        let mut row = self.row.lock().unwrap_or_else(|p| p.into_inner());
        match row.as_mut() {
            Some(r) => {
                r.granted_at = Some(at);
                self.writes.fetch_add(1, Ordering::SeqCst);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
