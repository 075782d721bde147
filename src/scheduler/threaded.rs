//! Thread-backed scheduler.

use super::{Scheduler, Task, TaskHandle};
use crate::error::{LeaseError, Result};
use std::collections::BTreeSet;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread;
use std::time::Duration;
use tracing::{debug, warn};

/// Runs each scheduled task on its own named thread.
///
/// Cloning shares the same active-task set and shutdown state.
#[derive(Debug, Clone, Default)]
pub struct ThreadScheduler {
    inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    next_id: AtomicU64,
    active: Mutex<BTreeSet<u64>>,
    shut_down: AtomicBool,
}

impl Inner {
    fn set_active(&self, id: u64, active: bool) {
        let mut set = self.active.lock().unwrap_or_else(|p| p.into_inner());
        if active {
            set.insert(id);
        } else {
            set.remove(&id);
        }
    }
}

#[derive(Debug, Default)]
struct Control {
    cancelled: Mutex<bool>,
    wakeup: Condvar,
}

impl Control {
    fn cancel(&self) {
        *self.cancelled.lock().unwrap_or_else(|p| p.into_inner()) = true;
        self.wakeup.notify_all();
    }
}

impl ThreadScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of tasks scheduled and not yet cancelled.
    pub fn active_tasks(&self) -> usize {
        self.inner
            .active
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .len()
    }

    /// Refuse all further `schedule` calls. Running tasks are unaffected.
    pub fn shutdown(&self) {
        self.inner.shut_down.store(true, Ordering::SeqCst);
    }
}

impl Scheduler for ThreadScheduler {
    fn schedule(&self, interval: Duration, mut task: Task) -> Result<TaskHandle> {
        if self.inner.shut_down.load(Ordering::SeqCst) {
            return Err(LeaseError::Schedule(
                "scheduler has been shut down".to_string(),
            ));
        }
        if interval.is_zero() {
            return Err(LeaseError::Schedule(
                "interval must be greater than zero".to_string(),
            ));
        }

        let id = self.inner.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let control = Arc::new(Control::default());
        self.inner.set_active(id, true);

        let worker_control = Arc::clone(&control);
        let worker_inner = Arc::clone(&self.inner);
        let spawned = thread::Builder::new()
            .name(format!("lease-refresh-{id}"))
            .spawn(move || {
                run_fixed_delay(&worker_control, interval, &mut task);
                worker_inner.set_active(id, false);
            });

        let worker = match spawned {
            Ok(worker) => worker,
            Err(e) => {
                self.inner.set_active(id, false);
                return Err(LeaseError::Schedule(format!(
                    "failed to spawn refresh thread: {e}"
                )));
            }
        };
        debug!(task = id, interval_ms = interval.as_millis() as u64, "task scheduled");

        let inner = Arc::clone(&self.inner);
        Ok(TaskHandle::new(id, move || {
            control.cancel();
            // A task cancelling itself cannot wait for its own thread.
            if worker.thread().id() != thread::current().id() && worker.join().is_err() {
                warn!(task = id, "refresh thread terminated abnormally");
            }
            inner.set_active(id, false);
            debug!(task = id, "task cancelled");
        }))
    }
}

fn run_fixed_delay(control: &Control, interval: Duration, task: &mut Task) {
    loop {
        let cancelled = control.cancelled.lock().unwrap_or_else(|p| p.into_inner());
        let (cancelled, _) = control
            .wakeup
            .wait_timeout_while(cancelled, interval, |cancelled| !*cancelled)
            .unwrap_or_else(|p| p.into_inner());
        if *cancelled {
            return;
        }
        drop(cancelled);

        if panic::catch_unwind(AssertUnwindSafe(|| task())).is_err() {
            warn!("scheduled task panicked; keeping schedule");
        }
    }
}
