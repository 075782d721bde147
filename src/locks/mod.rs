//! Operator view of the shared lock.
//!
//! Reports who holds the lock row and whether their lease has gone stale,
//! and lets an operator clear a lock left behind by a crashed node without
//! waiting for another node to take it over.

mod operations;
mod owner;
mod types;


// Re-export public API
pub use operations::{clear_lock, lock_status};
pub use owner::default_owner;
pub use types::LockInfo;
