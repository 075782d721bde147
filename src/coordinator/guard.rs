//! RAII lease guard.

use super::StaleLockCoordinator;
use crate::error::Result;
use tracing::warn;

/// Holds the lease until dropped or released.
///
/// If releasing fails during drop, a warning is logged; the coordinator keeps
/// heartbeating since it still holds the lock.
#[derive(Debug)]
pub struct LeaseGuard<'a> {
    coordinator: &'a StaleLockCoordinator,
    released: bool,
}

impl<'a> LeaseGuard<'a> {
    pub(super) fn new(coordinator: &'a StaleLockCoordinator) -> Self {
        Self {
            coordinator,
            released: false,
        }
    }

    /// Release now and report failure instead of logging it.
    pub fn release(mut self) -> Result<()> {
        self.released = true;
        self.coordinator.release()
    }
}

impl Drop for LeaseGuard<'_> {
    fn drop(&mut self) {
        if !self.released
            && let Err(e) = self.coordinator.release()
        {
            warn!(error = %e, "failed to release lease");
        }
    }
}
