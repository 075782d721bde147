//! Tests for the connection provider and schema.

use super::*;
use crate::store::LeaseStore;
use crate::test_support::temp_database;
use chrono::Duration as ChronoDuration;

#[test]
fn test_open_provisions_unlocked_row() {
    let (_temp, db) = temp_database();

    let row = db.read_lock_row().unwrap().unwrap();
    assert!(!row.locked);
    assert!(row.granted_at.is_none());
    assert!(row.locked_by.is_none());
}

#[test]
fn test_open_is_idempotent() {
    let (_temp, db) = temp_database();
    assert!(db.lease_store().unwrap().write_granted_at(Utc::now()).unwrap());

    // Reopening must neither fail nor reset the existing row.
    let again = Database::open(db.path(), db.table().clone(), Duration::from_secs(1)).unwrap();
    assert!(again.read_lock_row().unwrap().unwrap().granted_at.is_some());
}

#[test]
fn test_read_lock_row_missing_row() {
    let (_temp, db) = temp_database();
    db.connect()
        .unwrap()
        .execute("DELETE FROM migration_lock", [])
        .unwrap();

    assert!(db.read_lock_row().unwrap().is_none());
}

#[test]
fn test_custom_table_name() {
    let temp = tempfile::TempDir::new().unwrap();
    let table = LockTable::new("schema_lock").unwrap();
    let db = Database::open(temp.path().join("custom.db"), table, Duration::from_secs(1)).unwrap();

    assert_eq!(db.table().as_str(), "schema_lock");
    assert!(db.read_lock_row().unwrap().is_some());
}

#[test]
fn test_timestamp_format_roundtrip_keeps_millis() {
    let at = Utc::now();
    let parsed = parse_timestamp(&format_timestamp(at), 0).unwrap();
    assert_eq!(parsed.timestamp_millis(), at.timestamp_millis());
    assert!(at.signed_duration_since(parsed) < ChronoDuration::milliseconds(1));
}

#[test]
fn test_parse_timestamp_rejects_garbage() {
    assert!(parse_timestamp("yesterday", 1).is_err());
}
