//! Stale-detecting lock coordinator.
//!
//! Gives one node at a time exclusive use of a resource shared by a fleet
//! (schema migrations on a shared database), and recovers when a holder dies
//! without releasing.
//!
//! # Protocol
//!
//! `acquire` loops until the native lock is obtained:
//!
//! 1. Try the native lock. Success means HELD.
//! 2. Otherwise read the lease stamp. If `now - granted_at > max_idle` the holder
//!    is presumed dead: force-release the native lock and try once more.
//! 3. Otherwise, or if the retry lost a race, sleep for the polling delay and repeat.
//!
//! The wait has no deadline. Migrations must eventually run, so the only way to
//! stop waiting is to stop the process.
//!
//! While HELD, a refresh task re-stamps the lease every `refresh_interval` on
//! the lease store's dedicated connection. The refresh task exists exactly
//! while the lease is held. `release` cancels it before unlocking and restores
//! it if unlocking fails.
//!
//! Dropping a coordinator that still holds the lease stops its heartbeat but
//! leaves the native lock set; other nodes take it over once it goes stale.

mod guard;


use crate::clock::Clock;
use crate::config::ConfigSource;
use crate::config::types::DEFAULT_POLLING_DELAY_MILLIS;
use crate::error::{LeaseError, Result};
use crate::native::NativeLock;
use crate::scheduler::{Scheduler, TaskHandle};
use crate::store::LeaseStore;
use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, RwLock};
use std::thread;
use std::time::Duration;
use tracing::{Span, debug, error, info, info_span, warn};

pub use guard::LeaseGuard;

/// Whether a lease stamped at `granted_at` has been idle longer than `max_idle`.
///
/// A stamp in the future (clock skew between nodes) is never stale.
pub fn lease_is_stale(granted_at: DateTime<Utc>, now: DateTime<Utc>, max_idle: Duration) -> bool {
    match now.signed_duration_since(granted_at).to_std() {
        Ok(age) => age > max_idle,
        Err(_) => false,
    }
}

/// Per-process state of the ownership attempt.
#[derive(Debug, Default)]
struct Session {
    refresh: Option<TaskHandle>,
}

/// Coordinates exclusive execution across nodes sharing one lock.
pub struct StaleLockCoordinator {
    native: Arc<dyn NativeLock>,
    scheduler: Arc<dyn Scheduler>,
    settings: Arc<dyn ConfigSource>,
    clock: Arc<dyn Clock>,
    store: RwLock<Option<Arc<dyn LeaseStore>>>,
    polling_delay_nanos: AtomicU64,
    // Held for the whole of acquire/release: one attempt per coordinator at a time.
    session: Mutex<Session>,
    held: AtomicBool,
    span: Span,
}

impl StaleLockCoordinator {
    /// The initial polling delay is taken from `settings`.
    pub fn new(
        native: Arc<dyn NativeLock>,
        scheduler: Arc<dyn Scheduler>,
        settings: Arc<dyn ConfigSource>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let polling_delay = effective_polling_delay(settings.polling_delay());
        Self {
            native,
            scheduler,
            settings,
            clock,
            store: RwLock::new(None),
            polling_delay_nanos: AtomicU64::new(duration_nanos(polling_delay)),
            session: Mutex::new(Session::default()),
            held: AtomicBool::new(false),
            span: info_span!("migration_lock"),
        }
    }

    /// Override the delay between acquisition attempts.
    pub fn with_polling_delay(self, delay: Duration) -> Self {
        self.set_polling_delay(delay);
        self
    }

    /// Log every operation, including heartbeats, under `span`.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Supply the lease store used for staleness checks and heartbeats.
    ///
    /// The store should sit on its own long-lived connection, not the one the
    /// guarded work uses. Must be called before [`acquire`](Self::acquire).
    pub fn set_database(&self, store: Arc<dyn LeaseStore>) {
        *self.store.write().unwrap_or_else(|p| p.into_inner()) = Some(store);
    }

    /// Change the wait between attempts. Applies from the next wait on, also
    /// to an `acquire` already in progress. This is not a deadline.
    ///
    /// A zero delay falls back to the default, as it does in the config file.
    pub fn set_polling_delay(&self, delay: Duration) {
        self.polling_delay_nanos
            .store(duration_nanos(effective_polling_delay(delay)), Ordering::SeqCst);
    }

    pub fn polling_delay(&self) -> Duration {
        Duration::from_nanos(self.polling_delay_nanos.load(Ordering::SeqCst))
    }

    /// Whether this coordinator currently holds the lease.
    pub fn is_held(&self) -> bool {
        self.held.load(Ordering::SeqCst)
    }

    /// Block until the lock is held, taking over a stale holder if needed.
    ///
    /// Fails if no lease store was supplied, if this coordinator already
    /// holds the lease, or if the heartbeat cannot be scheduled once the
    /// lock is obtained (the lock is then given back).
    pub fn acquire(&self) -> Result<()> {
        let _entered = self.span.enter();
        let mut session = self.lock_session();
        if self.is_held() {
            return Err(LeaseError::LockError(
                "lease is already held by this coordinator".to_string(),
            ));
        }
        let store = self.lease_store()?;

        loop {
            if self.attempt() {
                return self.start_holding(&mut session, &store);
            }

            if self.holder_is_stale(store.as_ref()) {
                warn!("current holder's lease is stale; forcing release");
                match self.native.force_release() {
                    Ok(()) => {
                        if self.attempt() {
                            return self.start_holding(&mut session, &store);
                        }
                        info!("another node took the lock after the forced release; waiting");
                    }
                    Err(e) => warn!(error = %e, "forced release failed"),
                }
            }

            let delay = self.polling_delay();
            debug!(delay_ms = delay.as_millis() as u64, "lock is busy; waiting");
            thread::sleep(delay);
        }
    }

    /// Stop the heartbeat and release the lock.
    ///
    /// If the native release fails, the lease stays held and the heartbeat is
    /// restarted; the failure is returned as [`LeaseError::Release`]. Should the
    /// restart fail too, the lease is still reported as held but is no longer
    /// refreshed, so other nodes take it over once it goes stale.
    pub fn release(&self) -> Result<()> {
        let _entered = self.span.enter();
        let mut session = self.lock_session();

        if let Some(refresh) = session.refresh.take() {
            refresh.cancel();
        }

        match self.native.release() {
            Ok(()) => {
                self.held.store(false, Ordering::SeqCst);
                info!("lock released");
                Ok(())
            }
            Err(e) => {
                // `held` is left as it was: the native lock is still set even
                // if the heartbeat cannot be resumed.
                if self.is_held() {
                    error!(error = %e, "failed to release lock; resuming lease refresh");
                    match self
                        .lease_store()
                        .and_then(|store| self.schedule_refresh(&store))
                    {
                        Ok(refresh) => session.refresh = Some(refresh),
                        Err(restart) => error!(
                            error = %restart,
                            "could not resume lease refresh; lock stays held without a heartbeat"
                        ),
                    }
                } else {
                    error!(error = %e, "failed to release lock");
                }
                Err(LeaseError::Release(e.to_string()))
            }
        }
    }

    /// Acquire and return a guard that releases when dropped.
    pub fn lock(&self) -> Result<LeaseGuard<'_>> {
        self.acquire()?;
        Ok(LeaseGuard::new(self))
    }

    /// Run `work` while holding the lease.
    ///
    /// The lease is released afterwards; a release failure is returned even
    /// though `work` completed.
    pub fn run_exclusive<T>(&self, work: impl FnOnce() -> T) -> Result<T> {
        let guard = self.lock()?;
        let output = work();
        guard.release()?;
        Ok(output)
    }

    fn lock_session(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(|p| p.into_inner())
    }

    fn lease_store(&self) -> Result<Arc<dyn LeaseStore>> {
        self.store
            .read()
            .unwrap_or_else(|p| p.into_inner())
            .clone()
            .ok_or_else(|| {
                LeaseError::NotConfigured("set_database must be called before acquire".to_string())
            })
    }

    fn attempt(&self) -> bool {
        match self.native.try_acquire() {
            Ok(acquired) => acquired,
            Err(e) => {
                warn!(error = %e, "lock attempt failed");
                false
            }
        }
    }

    fn holder_is_stale(&self, store: &dyn LeaseStore) -> bool {
        match store.read_granted_at() {
            Ok(Some(granted_at)) => {
                let now = self.clock.now();
                let max_idle = self.settings.max_idle();
                let stale = lease_is_stale(granted_at, now, max_idle);
                debug!(
                    granted_at = %granted_at,
                    idle_ms = now.signed_duration_since(granted_at).num_milliseconds(),
                    max_idle_ms = max_idle.as_millis() as u64,
                    stale,
                    "checked lease age"
                );
                stale
            }
            Ok(None) => {
                debug!("no lease stamp; cannot determine staleness");
                false
            }
            Err(e) => {
                warn!(error = %e, "staleness check failed");
                false
            }
        }
    }

    fn start_holding(&self, session: &mut Session, store: &Arc<dyn LeaseStore>) -> Result<()> {
        match store.write_granted_at(self.clock.now()) {
            Ok(true) => {}
            Ok(false) => warn!("no lease row to stamp"),
            Err(e) => warn!(error = %e, "failed to stamp lease on acquire"),
        }

        match self.schedule_refresh(store) {
            Ok(refresh) => {
                session.refresh = Some(refresh);
                self.held.store(true, Ordering::SeqCst);
                info!("lock acquired");
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "cannot refresh the lease; giving the lock back");
                if let Err(release) = self.native.release() {
                    error!(error = %release, "failed to give the lock back");
                }
                Err(e)
            }
        }
    }

    fn schedule_refresh(&self, store: &Arc<dyn LeaseStore>) -> Result<TaskHandle> {
        let interval = self.settings.refresh_interval();
        let store = Arc::clone(store);
        let clock = Arc::clone(&self.clock);
        let span = self.span.clone();

        self.scheduler.schedule(
            interval,
            Box::new(move || {
                let _entered = span.enter();
                refresh_lease(store.as_ref(), clock.as_ref());
            }),
        )
    }
}

impl fmt::Debug for StaleLockCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaleLockCoordinator")
            .field("held", &self.is_held())
            .field("polling_delay", &self.polling_delay())
            .finish_non_exhaustive()
    }
}

/// Heartbeat body. Never fails: errors are logged and the next run retries.
fn refresh_lease(store: &dyn LeaseStore, clock: &dyn Clock) {
    match store.write_granted_at(clock.now()) {
        Ok(true) => debug!("lease refreshed"),
        Ok(false) => warn!("lease row missing; refresh had no effect"),
        Err(e) => warn!(error = %e, "failed to refresh lease"),
    }
}

fn effective_polling_delay(delay: Duration) -> Duration {
    if delay.is_zero() {
        Duration::from_millis(DEFAULT_POLLING_DELAY_MILLIS)
    } else {
        delay
    }
}

fn duration_nanos(delay: Duration) -> u64 {
    u64::try_from(delay.as_nanos()).unwrap_or(u64::MAX)
}
