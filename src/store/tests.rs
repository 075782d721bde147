//! Tests for the lease stores.

use super::*;
use crate::test_support::temp_database;
use chrono::Duration;
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};
use std::thread;

#[test]
fn test_sqlite_store_unstamped_row_reads_none() {
    let (_temp, db) = temp_database();
    let store = db.lease_store().unwrap();

    assert!(store.read_granted_at().unwrap().is_none());
}

#[test]
fn test_sqlite_store_read_returns_latest_write() {
    let (_temp, db) = temp_database();
    let writer = db.lease_store().unwrap();
    let reader = db.lease_store().unwrap();

    let start = Utc::now();
    for i in 0..10 {
        let at = start + Duration::seconds(i);
        assert!(writer.write_granted_at(at).unwrap());
        let read = reader.read_granted_at().unwrap().unwrap();
        assert_eq!(read.timestamp_millis(), at.timestamp_millis());
    }
}

#[test]
fn test_sqlite_store_without_row() {
    let (_temp, db) = temp_database();
    db.connect()
        .unwrap()
        .execute("DELETE FROM migration_lock WHERE id = 1", [])
        .unwrap();
    let store = db.lease_store().unwrap();

    assert!(!store.write_granted_at(Utc::now()).unwrap());
    assert!(store.read_granted_at().unwrap().is_none());
}

#[test]
fn test_sqlite_store_concurrent_writers_last_commit_wins() {
    let (_temp, db) = temp_database();
    let start = Utc::now();
    let committed = Arc::new(Mutex::new(Vec::new()));

    let handles: Vec<_> = (0..4)
        .map(|writer| {
            let store = db.lease_store().unwrap();
            let committed = Arc::clone(&committed);
            thread::spawn(move || {
                for i in 0..20 {
                    let at = start + Duration::milliseconds(writer * 1000 + i);
                    assert!(store.write_granted_at(at).unwrap());
                    committed.lock().unwrap().push(at.timestamp_millis());
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let written: BTreeSet<i64> = committed.lock().unwrap().iter().copied().collect();
    let read = db.lease_store().unwrap().read_granted_at().unwrap().unwrap();
    assert!(written.contains(&read.timestamp_millis()));
}

#[test]
fn test_memory_store_monotonic_writes() {
    let store = MemoryLeaseStore::new();
    assert!(store.read_granted_at().unwrap().is_none());

    let start = Utc::now();
    for i in 0..5 {
        let at = start + Duration::seconds(i);
        assert!(store.write_granted_at(at).unwrap());
        assert_eq!(store.read_granted_at().unwrap(), Some(at));
    }
    assert_eq!(store.write_count(), 5);
}

#[test]
fn test_memory_store_never_reads_older_than_completed_write() {
    let store = Arc::new(MemoryLeaseStore::new());
    let start = Utc::now();

    let handles: Vec<_> = (0..4)
        .map(|writer| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                // Stamps are unique per writer, so reading back this writer's
                // previous stamp would mean a completed write was lost.
                let mut last = None;
                for i in 0..50 {
                    let at = start + Duration::milliseconds(i * 10 + writer);
                    store.write_granted_at(at).unwrap();
                    let read = store.read_granted_at().unwrap().unwrap();
                    if let Some(prev) = last {
                        assert_ne!(read, prev, "read returned a stale stamp of this writer");
                    }
                    last = Some(at);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(store.write_count(), 200);
}

#[test]
fn test_memory_store_without_row() {
    let store = MemoryLeaseStore::without_row();
    assert!(!store.write_granted_at(Utc::now()).unwrap());
    assert!(store.read_granted_at().unwrap().is_none());
    assert_eq!(store.write_count(), 0);
}

#[test]
fn test_memory_store_failing_switch() {
    let store = MemoryLeaseStore::new();
    store.set_failing(true);
    assert!(store.write_granted_at(Utc::now()).is_err());
    assert!(store.read_granted_at().is_err());

    store.set_failing(false);
    assert!(store.write_granted_at(Utc::now()).unwrap());
}
