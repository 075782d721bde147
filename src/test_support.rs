use crate::config::{Config, LockTable};
use crate::db::Database;
use std::time::Duration;
use tempfile::TempDir;

/// A provisioned lock database in a fresh temporary directory.
///
/// Keep the `TempDir` alive for as long as the database is used.
pub(crate) fn temp_database() -> (TempDir, Database) {
    let temp_dir = TempDir::new().unwrap();
    let db = Database::open(
        temp_dir.path().join("migrations.db"),
        LockTable::new("migration_lock").unwrap(),
        Duration::from_secs(5),
    )
    .unwrap();
    (temp_dir, db)
}

/// Lease settings scaled down to test speed.
pub(crate) fn lease_config(refresh_interval_millis: u64, max_idle_millis: u64) -> Config {
    Config {
        refresh_interval_millis,
        max_idle_millis,
        polling_delay_millis: 2,
        ..Config::default()
    }
}
