//! Periodic refresher: runs a callback at a fixed delay until cancelled.

mod threaded;


use crate::error::Result;
use std::fmt;
use std::time::Duration;

pub use threaded::ThreadScheduler;

/// A repeatedly invoked unit of work.
pub type Task = Box<dyn FnMut() + Send + 'static>;

/// Schedules fixed-delay periodic work.
pub trait Scheduler: Send + Sync {
    /// Run `task` every `interval`, first after one `interval` has passed.
    fn schedule(&self, interval: Duration, task: Task) -> Result<TaskHandle>;
}

/// Handle on a scheduled task.
///
/// Cancelling (explicitly or by dropping the handle) guarantees that no new
/// invocation starts afterwards; an invocation already running is waited for.
pub struct TaskHandle {
    id: u64,
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl TaskHandle {
    pub fn new(id: u64, cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            id,
            cancel: Some(Box::new(cancel)),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Stop the task.
    pub fn cancel(mut self) {
        self.cancel_now();
    }

    fn cancel_now(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for TaskHandle {
    fn drop(&mut self) {
        self.cancel_now();
    }
}

impl fmt::Debug for TaskHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskHandle")
            .field("id", &self.id)
            .field("cancelled", &self.cancel.is_none())
            .finish()
    }
}
