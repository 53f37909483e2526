// crates/tracevault-store-sqlite/tests/store_open_unit.rs
// ============================================================================
// Module: Store Open and Create Unit Tests
// Description: Tests for path validation, creation, version-gated opening,
//              and cross-handle concurrency.
// Purpose: Validate every way a store file can be created, opened, or
//          rejected.
// Dependencies: tracevault-store-sqlite, tracevault-core, rusqlite,
//               serde_json, tempfile
// ============================================================================

//! ## Overview
//! Unit-level tests for store lifecycle invariants:
//! - Path safety checks (length/component/directory rejection)
//! - Creation at the expected schema version
//! - Version-gated opening and any-version opening for tooling
//! - Open-or-create handling of absent, empty, and foreign files
//! - Probe checks without store construction
//! - Concurrent writers on separate handles

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions and helpers are permitted."
)]

use std::path::Path;
use std::path::PathBuf;
use std::thread;

use rusqlite::Connection;
use rusqlite::params;
use serde_json::json;
use tempfile::TempDir;
use tracevault_core::EntryKind;
use tracevault_core::EventSink;
use tracevault_core::ProcessId;
use tracevault_core::RetentionPolicy;
use tracevault_core::StoreError;
use tracevault_core::ThreadId;
use tracevault_core::Timestamp;
use tracevault_core::TraceEntry;
use tracevault_core::TraceReader;
use tracevault_store_sqlite::EXPECTED_SCHEMA_VERSION;
use tracevault_store_sqlite::JournalMode;
use tracevault_store_sqlite::Store;
use tracevault_store_sqlite::StoreConfig;
use tracevault_store_sqlite::SyncMode;

// ============================================================================
// SECTION: Helpers
// ============================================================================

fn store_path(temp: &TempDir) -> PathBuf {
    temp.path().join("trace.db")
}

fn sample_entry(message: &str) -> TraceEntry {
    TraceEntry {
        pid: ProcessId::new(4_242),
        process_start_time: Timestamp::from_unix_millis(1_000),
        process_name: "traced-app".to_string(),
        tid: ThreadId::new(7),
        timestamp: Timestamp::from_unix_millis(2_000),
        kind: EntryKind::Message,
        path: "src/main.cpp".to_string(),
        line: 42,
        group_name: None,
        function: "main".to_string(),
        message: message.to_string(),
        variables: Vec::new(),
        backtrace: Vec::new(),
        stack_position: 1,
        trace_keys: Vec::new(),
    }
}

fn raw_connection(path: &Path) -> Connection {
    Connection::open(path).expect("raw connection")
}

// ============================================================================
// SECTION: Path Validation
// ============================================================================

#[test]
fn create_rejects_directory_path() {
    let temp = TempDir::new().unwrap();
    let Err(err) = Store::create(temp.path()) else {
        panic!("expected directory path to fail");
    };
    assert!(matches!(err, StoreError::Path(_)));
}

#[test]
fn create_rejects_empty_path() {
    let Err(err) = Store::create(Path::new("")) else {
        panic!("expected empty path to fail");
    };
    assert!(matches!(err, StoreError::Path(_)));
}

#[test]
fn create_rejects_overlong_component() {
    let temp = TempDir::new().unwrap();
    let long_name = "a".repeat(300);
    let Err(err) = Store::create(&temp.path().join(long_name)) else {
        panic!("expected overlong component to fail");
    };
    assert!(matches!(err, StoreError::Path(_)));
}

#[test]
fn create_rejects_overlong_total_path() {
    let temp = TempDir::new().unwrap();
    let long_name = "a".repeat(5_000);
    let Err(err) = Store::create(&temp.path().join(long_name)) else {
        panic!("expected overlong path to fail");
    };
    assert!(matches!(err, StoreError::Path(_)));
}

#[test]
fn create_rejects_existing_file() {
    let temp = TempDir::new().unwrap();
    let path = store_path(&temp);
    Store::create(&path).expect("first create");
    let Err(err) = Store::create(&path) else {
        panic!("expected second create to fail");
    };
    assert!(matches!(err, StoreError::Path(_)));
}

// ============================================================================
// SECTION: Creation
// ============================================================================

#[test]
fn create_initializes_current_version() {
    let temp = TempDir::new().unwrap();
    let path = store_path(&temp);
    let store = Store::create(&path).expect("create");
    assert_eq!(store.current_version().expect("version"), EXPECTED_SCHEMA_VERSION);
    assert!(store.check_compatibility().expect("compatibility").is_compatible());
    assert_eq!(store.entry_count().expect("count"), 0);
}

#[test]
fn create_sets_wal_mode_by_default() {
    let temp = TempDir::new().unwrap();
    let path = store_path(&temp);
    let _store = Store::create(&path).expect("create");

    let conn = raw_connection(&path);
    let mode: String = conn.query_row("PRAGMA journal_mode", params![], |row| row.get(0)).unwrap();
    assert_eq!(mode.to_lowercase(), "wal");
}

#[test]
fn create_honors_delete_journal_mode() {
    let temp = TempDir::new().unwrap();
    let path = store_path(&temp);
    let config = StoreConfig {
        journal_mode: JournalMode::Delete,
        ..StoreConfig::default()
    };
    let _store = Store::create_with(&path, config).expect("create");

    let conn = raw_connection(&path);
    let mode: String = conn.query_row("PRAGMA journal_mode", params![], |row| row.get(0)).unwrap();
    assert_eq!(mode.to_lowercase(), "delete");
}

#[test]
fn created_store_reopens_cleanly() {
    let temp = TempDir::new().unwrap();
    let path = store_path(&temp);
    {
        let mut store = Store::create(&path).expect("create");
        store.write_entry(&sample_entry("first")).expect("write");
    }
    let store = Store::open(&path).expect("reopen");
    assert_eq!(store.entry_count().expect("count"), 1);
}

// ============================================================================
// SECTION: Version-Gated Opening
// ============================================================================

#[test]
fn open_rejects_missing_file() {
    let temp = TempDir::new().unwrap();
    let Err(err) = Store::open(&store_path(&temp)) else {
        panic!("expected missing file to fail");
    };
    assert!(matches!(err, StoreError::Path(_)));
}

#[test]
fn open_rejects_non_database_file() {
    let temp = TempDir::new().unwrap();
    let path = store_path(&temp);
    std::fs::write(&path, "this is not a database at all, not even close").unwrap();
    let Err(err) = Store::open(&path) else {
        panic!("expected garbage file to fail");
    };
    assert!(matches!(err, StoreError::Path(_)));
}

#[test]
fn open_rejects_database_without_version_stamp() {
    let temp = TempDir::new().unwrap();
    let path = store_path(&temp);
    let conn = raw_connection(&path);
    conn.execute_batch("CREATE TABLE unrelated (id INTEGER PRIMARY KEY);").unwrap();
    drop(conn);

    let Err(err) = Store::open(&path) else {
        panic!("expected unstamped database to fail");
    };
    assert!(matches!(err, StoreError::Path(_)));
}

#[test]
fn open_rejects_future_version() {
    let temp = TempDir::new().unwrap();
    let path = store_path(&temp);
    Store::create(&path).expect("create");
    let conn = raw_connection(&path);
    conn.execute("UPDATE schema_meta SET version = ?1", params![999_i64]).unwrap();
    drop(conn);

    let Err(err) = Store::open(&path) else {
        panic!("expected future version to fail");
    };
    assert!(matches!(err, StoreError::IncompatibleVersion(_)));
}

#[test]
fn open_rejects_known_older_version() {
    let temp = TempDir::new().unwrap();
    let path = store_path(&temp);
    Store::create(&path).expect("create");
    let conn = raw_connection(&path);
    conn.execute("UPDATE schema_meta SET version = ?1", params![2_i64]).unwrap();
    drop(conn);

    let Err(err) = Store::open(&path) else {
        panic!("expected older version to fail strict open");
    };
    assert!(matches!(err, StoreError::IncompatibleVersion(_)));
}

#[test]
fn open_any_version_accepts_known_older_version() {
    let temp = TempDir::new().unwrap();
    let path = store_path(&temp);
    Store::create(&path).expect("create");
    let conn = raw_connection(&path);
    conn.execute("UPDATE schema_meta SET version = ?1", params![2_i64]).unwrap();
    drop(conn);

    let store = Store::open_any_version(&path).expect("any-version open");
    assert_eq!(store.current_version().expect("version"), 2);
    assert!(!store.check_compatibility().expect("compatibility").is_compatible());
}

#[test]
fn open_any_version_rejects_unrecognized_version() {
    let temp = TempDir::new().unwrap();
    let path = store_path(&temp);
    Store::create(&path).expect("create");
    let conn = raw_connection(&path);
    conn.execute("UPDATE schema_meta SET version = ?1", params![999_i64]).unwrap();
    drop(conn);

    let Err(err) = Store::open_any_version(&path) else {
        panic!("expected unrecognized version to fail");
    };
    assert!(matches!(err, StoreError::IncompatibleVersion(_)));
}

// ============================================================================
// SECTION: Open or Create
// ============================================================================

#[test]
fn open_or_create_creates_missing_store() {
    let temp = TempDir::new().unwrap();
    let path = store_path(&temp);
    let store = Store::open_or_create(&path).expect("open or create");
    assert_eq!(store.current_version().expect("version"), EXPECTED_SCHEMA_VERSION);
    assert!(path.exists());
}

#[test]
fn open_or_create_opens_existing_store() {
    let temp = TempDir::new().unwrap();
    let path = store_path(&temp);
    {
        let mut store = Store::create(&path).expect("create");
        store.write_entry(&sample_entry("kept")).expect("write");
    }
    let store = Store::open_or_create(&path).expect("open existing");
    assert_eq!(store.entry_count().expect("count"), 1);
}

#[test]
fn open_or_create_initializes_empty_database_file() {
    let temp = TempDir::new().unwrap();
    let path = store_path(&temp);
    drop(std::fs::File::create(&path).unwrap());

    let store = Store::open_or_create(&path).expect("initialize empty file");
    assert_eq!(store.current_version().expect("version"), EXPECTED_SCHEMA_VERSION);
}

#[test]
fn open_or_create_rejects_foreign_database() {
    let temp = TempDir::new().unwrap();
    let path = store_path(&temp);
    let conn = raw_connection(&path);
    conn.execute_batch("CREATE TABLE unrelated (id INTEGER PRIMARY KEY);").unwrap();
    drop(conn);

    let Err(err) = Store::open_or_create(&path) else {
        panic!("expected foreign database to fail");
    };
    assert!(matches!(err, StoreError::Path(_)));
}

#[test]
fn open_or_create_rejects_version_mismatch() {
    let temp = TempDir::new().unwrap();
    let path = store_path(&temp);
    Store::create(&path).expect("create");
    let conn = raw_connection(&path);
    conn.execute("UPDATE schema_meta SET version = ?1", params![1_i64]).unwrap();
    drop(conn);

    let Err(err) = Store::open_or_create(&path) else {
        panic!("expected stamped mismatch to fail");
    };
    assert!(matches!(err, StoreError::IncompatibleVersion(_)));
}

// ============================================================================
// SECTION: Path Probes
// ============================================================================

#[test]
fn check_store_path_accepts_valid_store() {
    let temp = TempDir::new().unwrap();
    let path = store_path(&temp);
    Store::create(&path).expect("create");
    Store::check_store_path(&path).expect("probe");
    assert!(Store::is_valid_path(&path));
}

#[test]
fn check_store_path_rejects_missing_file() {
    let temp = TempDir::new().unwrap();
    let path = store_path(&temp);
    let Err(err) = Store::check_store_path(&path) else {
        panic!("expected missing file probe to fail");
    };
    assert!(matches!(err, StoreError::Path(_)));
    assert!(!Store::is_valid_path(&path));
}

#[test]
fn check_store_path_rejects_non_database_file() {
    let temp = TempDir::new().unwrap();
    let path = store_path(&temp);
    std::fs::write(&path, "plain text").unwrap();
    let Err(err) = Store::check_store_path(&path) else {
        panic!("expected garbage probe to fail");
    };
    assert!(matches!(err, StoreError::Path(_)));
}

#[test]
fn check_store_path_rejects_directory() {
    let temp = TempDir::new().unwrap();
    assert!(!Store::is_valid_path(temp.path()));
}

// ============================================================================
// SECTION: Configuration
// ============================================================================

#[test]
fn store_config_defaults_are_stable() {
    let config = StoreConfig::default();
    assert_eq!(config.busy_timeout_ms, 5_000);
    assert_eq!(config.journal_mode, JournalMode::Wal);
    assert_eq!(config.sync_mode, SyncMode::Full);
    assert_eq!(config.retention, RetentionPolicy::default());
}

#[test]
fn store_config_deserializes_missing_fields_to_defaults() {
    let config: StoreConfig = serde_json::from_value(json!({})).expect("empty config");
    assert_eq!(config.busy_timeout_ms, 5_000);
    assert_eq!(config.journal_mode, JournalMode::Wal);
}

#[test]
fn store_config_deserializes_explicit_fields() {
    let config: StoreConfig = serde_json::from_value(json!({
        "busy_timeout_ms": 250,
        "journal_mode": "delete",
        "sync_mode": "normal",
        "retention": { "soft_limit": 10, "hard_limit": 20 }
    }))
    .expect("explicit config");
    assert_eq!(config.busy_timeout_ms, 250);
    assert_eq!(config.journal_mode, JournalMode::Delete);
    assert_eq!(config.sync_mode, SyncMode::Normal);
    assert_eq!(config.retention, RetentionPolicy::new(10, 20));
}

// ============================================================================
// SECTION: Concurrency
// ============================================================================

#[test]
fn concurrent_writers_on_separate_handles_all_commit() {
    let temp = TempDir::new().unwrap();
    let path = store_path(&temp);
    Store::create(&path).expect("create");

    let mut handles = Vec::new();
    for worker in 0 .. 4_u32 {
        let path = path.clone();
        handles.push(thread::spawn(move || {
            let mut store = Store::open(&path).expect("worker open");
            for sequence in 0 .. 25 {
                let mut entry = sample_entry(&format!("worker {worker} message {sequence}"));
                entry.tid = ThreadId::new(worker);
                store.write_entry(&entry).expect("concurrent write");
            }
        }));
    }
    for handle in handles {
        handle.join().expect("join worker");
    }

    let store = Store::open(&path).expect("reopen");
    assert_eq!(store.entry_count().expect("count"), 100);
}

#[test]
fn concurrent_readers_share_the_file() {
    let temp = TempDir::new().unwrap();
    let path = store_path(&temp);
    {
        let mut store = Store::create(&path).expect("create");
        store.write_entry(&sample_entry("shared")).expect("write");
    }

    let mut handles = Vec::new();
    for _ in 0 .. 4 {
        let path = path.clone();
        handles.push(thread::spawn(move || {
            let store = Store::open(&path).expect("reader open");
            assert_eq!(store.entry_count().expect("count"), 1);
        }));
    }
    for handle in handles {
        handle.join().expect("join reader");
    }
}
