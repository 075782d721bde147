//! In-process lock shared by simulated nodes.

use super::NativeLock;
use crate::error::Result;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// The shared lock cell. Hand each simulated node its own [`MemoryNativeLock`].
#[derive(Debug, Default)]
pub struct MemoryLockTable {
    holder: Mutex<Option<u64>>,
    next_handle: AtomicU64,
    acquisitions: AtomicUsize,
    forced_releases: AtomicUsize,
}

impl MemoryLockTable {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// A new handle with its own identity.
    pub fn handle(self: &Arc<Self>) -> MemoryNativeLock {
        MemoryNativeLock {
            table: Arc::clone(self),
            id: self.next_handle.fetch_add(1, Ordering::SeqCst) + 1,
        }
    }

    pub fn is_locked(&self) -> bool {
        self.holder.lock().unwrap_or_else(|p| p.into_inner()).is_some()
    }

    /// Identity of the handle currently holding the lock.
    pub fn holder(&self) -> Option<u64> {
        *self.holder.lock().unwrap_or_else(|p| p.into_inner())
    }

    pub fn acquisitions(&self) -> usize {
        self.acquisitions.load(Ordering::SeqCst)
    }

    pub fn forced_releases(&self) -> usize {
        self.forced_releases.load(Ordering::SeqCst)
    }
}

/// One node's handle on a [`MemoryLockTable`].
#[derive(Debug)]
pub struct MemoryNativeLock {
    table: Arc<MemoryLockTable>,
    id: u64,
}

impl MemoryNativeLock {
    pub fn id(&self) -> u64 {
        self.id
    }
}

impl NativeLock for MemoryNativeLock {
    fn try_acquire(&self) -> Result<bool> {
        let mut holder = self.table.holder.lock().unwrap_or_else(|p| p.into_inner());
        if holder.is_some() {
            return Ok(false);
        }
        *holder = Some(self.id);
        self.table.acquisitions.fetch_add(1, Ordering::SeqCst);
        Ok(true)
    }

    fn force_release(&self) -> Result<()> {
        let mut holder = self.table.holder.lock().unwrap_or_else(|p| p.into_inner());
        *holder = None;
        self.table.forced_releases.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn release(&self) -> Result<()> {
        let mut holder = self.table.holder.lock().unwrap_or_else(|p| p.into_inner());
        if *holder == Some(self.id) {
            *holder = None;
        }
        Ok(())
    }
}
