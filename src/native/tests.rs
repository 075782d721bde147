//! Tests for the native lock implementations.

use super::*;
use crate::clock::{Clock, ManualClock, SystemClock};
use crate::test_support::temp_database;
use chrono::Utc;
use std::sync::Arc;

#[test]
fn test_sqlite_lock_is_exclusive() {
    let (_temp, db) = temp_database();
    let a = db.native_lock("node-a", Arc::new(SystemClock)).unwrap();
    let b = db.native_lock("node-b", Arc::new(SystemClock)).unwrap();

    assert!(a.try_acquire().unwrap());
    assert!(!b.try_acquire().unwrap());
    assert!(!a.try_acquire().unwrap(), "lock is not reentrant");

    let row = db.read_lock_row().unwrap().unwrap();
    assert!(row.locked);
    assert_eq!(row.locked_by.as_deref(), Some("node-a"));
}

#[test]
fn test_sqlite_lock_acquire_stamps_granted_at() {
    let (_temp, db) = temp_database();
    let start = Utc::now();
    let clock = Arc::new(ManualClock::new(start));
    let lock = db.native_lock("node-a", clock.clone()).unwrap();

    assert!(lock.try_acquire().unwrap());

    let row = db.read_lock_row().unwrap().unwrap();
    assert_eq!(
        row.granted_at.unwrap().timestamp_millis(),
        clock.now().timestamp_millis()
    );
}

#[test]
fn test_sqlite_release_keeps_stamp_and_frees_lock() {
    let (_temp, db) = temp_database();
    let a = db.native_lock("node-a", Arc::new(SystemClock)).unwrap();
    let b = db.native_lock("node-b", Arc::new(SystemClock)).unwrap();

    assert!(a.try_acquire().unwrap());
    a.release().unwrap();

    let row = db.read_lock_row().unwrap().unwrap();
    assert!(!row.locked);
    assert!(row.locked_by.is_none());
    assert!(row.granted_at.is_some());

    assert!(b.try_acquire().unwrap());
}

#[test]
fn test_sqlite_release_does_not_clear_another_owner() {
    let (_temp, db) = temp_database();
    let a = db.native_lock("node-a", Arc::new(SystemClock)).unwrap();
    let b = db.native_lock("node-b", Arc::new(SystemClock)).unwrap();

    assert!(a.try_acquire().unwrap());
    b.force_release().unwrap();
    assert!(b.try_acquire().unwrap());

    // a was taken over; its late release must leave b's lock alone.
    a.release().unwrap();
    let row = db.read_lock_row().unwrap().unwrap();
    assert!(row.locked);
    assert_eq!(row.locked_by.as_deref(), Some("node-b"));
}

#[test]
fn test_sqlite_force_release_clears_any_holder() {
    let (_temp, db) = temp_database();
    let a = db.native_lock("node-a", Arc::new(SystemClock)).unwrap();
    let b = db.native_lock("node-b", Arc::new(SystemClock)).unwrap();

    assert!(a.try_acquire().unwrap());
    b.force_release().unwrap();

    assert!(!db.read_lock_row().unwrap().unwrap().locked);
}

#[test]
fn test_memory_lock_is_exclusive_per_handle() {
    let table = MemoryLockTable::new();
    let a = table.handle();
    let b = table.handle();
    assert_ne!(a.id(), b.id());

    assert!(a.try_acquire().unwrap());
    assert!(!b.try_acquire().unwrap());
    assert_eq!(table.holder(), Some(a.id()));

    // Releasing a lock you do not hold is a no-op.
    b.release().unwrap();
    assert!(table.is_locked());

    a.release().unwrap();
    assert!(!table.is_locked());
    assert!(b.try_acquire().unwrap());
    assert_eq!(table.acquisitions(), 2);
}

#[test]
fn test_memory_force_release_counts() {
    let table = MemoryLockTable::new();
    let a = table.handle();
    let b = table.handle();

    assert!(a.try_acquire().unwrap());
    b.force_release().unwrap();

    assert!(!table.is_locked());
    assert_eq!(table.forced_releases(), 1);
}
