//! Tests for command dispatch.

use super::*;
use crate::cli::RunArgs;
use crate::exit_codes;
use crate::native::NativeLock;
use serial_test::serial;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// Write a config pointing at a database inside `temp_dir`.
fn write_config(temp_dir: &TempDir) -> PathBuf {
    let config_path = temp_dir.path().join("migration-lock.yaml");
    let config = Config {
        database: temp_dir.path().join("shared.db").display().to_string(),
        refresh_interval_millis: 50,
        max_idle_millis: 500,
        polling_delay_millis: 10,
        ..Config::default()
    };
    fs::write(&config_path, config.to_yaml().unwrap()).unwrap();
    config_path
}

#[test]
fn test_init_is_idempotent() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = write_config(&temp_dir);

    dispatch(&config_path, Command::Init).unwrap();
    dispatch(&config_path, Command::Init).unwrap();

    let config = Config::load(&config_path).unwrap();
    let db = Database::from_config(&config).unwrap();
    assert!(!db.read_lock_row().unwrap().unwrap().locked);
}

#[test]
fn test_status_on_fresh_database() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = write_config(&temp_dir);

    dispatch(&config_path, Command::Status(StatusArgs { json: true })).unwrap();
    dispatch(&config_path, Command::Status(StatusArgs { json: false })).unwrap();
}

#[test]
fn test_release_requires_force() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = write_config(&temp_dir);

    let err = dispatch(&config_path, Command::Release(ReleaseArgs { force: false })).unwrap_err();

    assert_eq!(err.exit_code(), exit_codes::USER_ERROR);
    assert!(err.to_string().contains("--force"));
}

#[test]
fn test_release_force_clears_held_lock() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = write_config(&temp_dir);
    let config = Config::load(&config_path).unwrap();
    let db = Database::from_config(&config).unwrap();
    let crashed = db.native_lock("crashed-node", Arc::new(SystemClock)).unwrap();
    assert!(crashed.try_acquire().unwrap());

    dispatch(&config_path, Command::Release(ReleaseArgs { force: true })).unwrap();

    assert!(!db.read_lock_row().unwrap().unwrap().locked);
}

#[test]
fn test_invalid_config_is_user_error() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("migration-lock.yaml");
    fs::write(&config_path, "lock_table: \"drop table\"\n").unwrap();

    let err = dispatch(&config_path, Command::Init).unwrap_err();
    assert_eq!(err.exit_code(), exit_codes::USER_ERROR);
}

#[cfg(unix)]
#[test]
#[serial]
fn test_run_releases_lock_after_success() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = write_config(&temp_dir);

    dispatch(
        &config_path,
        Command::Run(RunArgs {
            command: "true".to_string(),
        }),
    )
    .unwrap();

    let config = Config::load(&config_path).unwrap();
    let row = Database::from_config(&config)
        .unwrap()
        .read_lock_row()
        .unwrap()
        .unwrap();
    assert!(!row.locked);
    assert!(row.granted_at.is_some());
}

#[cfg(unix)]
#[test]
#[serial]
fn test_run_propagates_child_failure() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = write_config(&temp_dir);

    let err = dispatch(
        &config_path,
        Command::Run(RunArgs {
            command: "false".to_string(),
        }),
    )
    .unwrap_err();

    assert_eq!(err.exit_code(), exit_codes::COMMAND_FAILURE);
    let config = Config::load(&config_path).unwrap();
    let row = Database::from_config(&config)
        .unwrap()
        .read_lock_row()
        .unwrap()
        .unwrap();
    assert!(!row.locked);
}

#[test]
#[serial]
fn test_run_missing_program_fails_without_holding_lock() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = write_config(&temp_dir);

    let err = dispatch(
        &config_path,
        Command::Run(RunArgs {
            command: "definitely-not-a-real-program-7f3a".to_string(),
        }),
    )
    .unwrap_err();

    assert_eq!(err.exit_code(), exit_codes::COMMAND_FAILURE);
    let config = Config::load(&config_path).unwrap();
    let row = Database::from_config(&config)
        .unwrap()
        .read_lock_row()
        .unwrap()
        .unwrap();
    assert!(!row.locked);
}
