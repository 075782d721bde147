//! Lease store: the liveness heartbeat kept on the fixed lock row.
//!
//! The store is not the mutex itself; the native lock serializes the
//! critical section. The store only records when the holder last proved it
//! was alive, so that a crashed holder can be recognised and taken over.
//!
//! Both operations are a single statement and never retry; the coordinator
//! owns retry policy.

mod memory;
mod sqlite;

#[cfg(test)]
mod tests;

use crate::error::Result;
use chrono::{DateTime, Utc};

pub use memory::MemoryLeaseStore;
pub use sqlite::SqliteLeaseStore;

/// Read/write access to the lease's `granted_at` timestamp.
pub trait LeaseStore: Send + Sync {
    /// The last stamp, or `None` when the row (or its stamp) is absent.
    fn read_granted_at(&self) -> Result<Option<DateTime<Utc>>>;

    /// Overwrite the stamp. Returns `false` when there is no row to update.
    fn write_granted_at(&self, at: DateTime<Utc>) -> Result<bool>;
}
