//! Native lock primitive wrapped by the coordinator.
//!
//! The primitive provides exclusion but knows nothing about crashed holders;
//! staleness detection lives in the coordinator.

mod memory;
mod sqlite;

#[cfg(test)]
mod tests;

use crate::error::Result;

pub use memory::{MemoryLockTable, MemoryNativeLock};
pub use sqlite::SqliteNativeLock;

/// An exclusive lock shared by every node.
pub trait NativeLock: Send + Sync {
    /// One non-blocking attempt. `Ok(false)` means another holder has it.
    fn try_acquire(&self) -> Result<bool>;

    /// Clear the lock whoever holds it.
    fn force_release(&self) -> Result<()>;

    /// Release the lock held by this handle.
    fn release(&self) -> Result<()>;
}
