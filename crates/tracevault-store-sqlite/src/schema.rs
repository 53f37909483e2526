// crates/tracevault-store-sqlite/src/schema.rs
// ============================================================================
// Module: Store Schema
// Description: Current schema DDL and version stamp access.
// Purpose: Define the relational layout and the single source of version truth.
// Dependencies: rusqlite, tracevault-core
// ============================================================================

//! ## Overview
//! The stamped version in `schema_meta` is the sole source of truth for
//! compatibility decisions. Schema history:
//!
//! - Version 1: baseline layout with `group_name` stored inline on
//!   `trace_point`.
//! - Version 2: group names interned into `trace_point_group`; `trace_point`
//!   references them by `group_id`.
//! - Version 3 (current): per-entry trace keys in `trace_key` and
//!   `entry_trace_key`.
//!
//! Fresh stores are always created at the current version; older layouts are
//! reached only through the migration registry. A store created fresh and a
//! store upgraded from version 1 have identical schemas.

// ============================================================================
// SECTION: Imports
// ============================================================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use rusqlite::params;
use tracevault_core::StoreError;

use crate::transaction::TransactionScope;

// ============================================================================
// SECTION: Version Constants
// ============================================================================

/// Schema version fresh stores are created at and `open` requires.
pub const EXPECTED_SCHEMA_VERSION: i32 = 3;
/// Oldest schema version this build recognizes.
pub const MIN_SCHEMA_VERSION: i32 = 1;
/// Newest schema version this build recognizes.
pub const MAX_KNOWN_SCHEMA_VERSION: i32 = 3;

// ============================================================================
// SECTION: Current Schema DDL
// ============================================================================

/// Statements creating the current schema, excluding the version stamp row.
///
/// `trace_point.group_id` intentionally carries no REFERENCES clause: the
/// engine rejects DROP COLUMN on a column named in a foreign key constraint,
/// and the downgrade to version 1 drops that column. Group linkage is
/// enforced by the write path.
const CURRENT_SCHEMA_SQL: &str = "CREATE TABLE schema_meta (
        version INTEGER NOT NULL
    );
    CREATE TABLE process (
        id INTEGER PRIMARY KEY,
        name TEXT NOT NULL,
        pid INTEGER NOT NULL,
        start_time INTEGER NOT NULL,
        end_time INTEGER,
        UNIQUE (pid, start_time)
    );
    CREATE TABLE traced_thread (
        id INTEGER PRIMARY KEY,
        process_id INTEGER NOT NULL REFERENCES process(id),
        tid INTEGER NOT NULL,
        UNIQUE (process_id, tid)
    );
    CREATE TABLE path_name (
        id INTEGER PRIMARY KEY,
        name TEXT NOT NULL UNIQUE
    );
    CREATE TABLE function_name (
        id INTEGER PRIMARY KEY,
        name TEXT NOT NULL UNIQUE
    );
    CREATE TABLE trace_point_group (
        id INTEGER PRIMARY KEY,
        name TEXT NOT NULL UNIQUE
    );
    CREATE TABLE trace_point (
        id INTEGER PRIMARY KEY,
        type INTEGER NOT NULL,
        path_id INTEGER NOT NULL REFERENCES path_name(id),
        line INTEGER NOT NULL,
        function_id INTEGER NOT NULL REFERENCES function_name(id),
        group_id INTEGER
    );
    CREATE TABLE trace_entry (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        traced_thread_id INTEGER NOT NULL REFERENCES traced_thread(id),
        timestamp INTEGER NOT NULL,
        trace_point_id INTEGER NOT NULL REFERENCES trace_point(id),
        message TEXT NOT NULL,
        stack_position INTEGER NOT NULL
    );
    CREATE TABLE variable (
        trace_entry_id INTEGER NOT NULL REFERENCES trace_entry(id),
        position INTEGER NOT NULL,
        name TEXT NOT NULL,
        type INTEGER NOT NULL,
        value TEXT NOT NULL,
        PRIMARY KEY (trace_entry_id, position)
    );
    CREATE TABLE stackframe (
        trace_entry_id INTEGER NOT NULL REFERENCES trace_entry(id),
        depth INTEGER NOT NULL,
        module_name TEXT NOT NULL,
        function_name TEXT NOT NULL,
        function_offset INTEGER NOT NULL,
        source_file TEXT NOT NULL,
        line INTEGER NOT NULL,
        PRIMARY KEY (trace_entry_id, depth)
    );
    CREATE TABLE trace_key (
        id INTEGER PRIMARY KEY,
        name TEXT NOT NULL UNIQUE
    );
    CREATE TABLE entry_trace_key (
        trace_entry_id INTEGER NOT NULL REFERENCES trace_entry(id),
        trace_key_id INTEGER NOT NULL REFERENCES trace_key(id),
        position INTEGER NOT NULL,
        enabled INTEGER NOT NULL,
        PRIMARY KEY (trace_entry_id, position)
    );";

// ============================================================================
// SECTION: Schema Creation
// ============================================================================

/// Creates the current schema and stamps the expected version.
///
/// # Errors
///
/// Returns [`StoreError::Transaction`] when any statement fails.
pub(crate) fn create_current_schema(scope: &TransactionScope<'_>) -> Result<(), StoreError> {
    scope.execute_batch(CURRENT_SCHEMA_SQL)?;
    scope.execute(
        "INSERT INTO schema_meta (version) VALUES (?1)",
        params![i64::from(EXPECTED_SCHEMA_VERSION)],
    )?;
    Ok(())
}

// ============================================================================
// SECTION: Version Stamp Access
// ============================================================================

/// Reads the raw version stamp, `None` when the store carries none.
///
/// A missing `schema_meta` table and an empty stamp table both read as
/// `None`; the caller decides whether that means a fresh file or an
/// unrecognized one.
pub(crate) fn read_stamp(connection: &Connection) -> Result<Option<i64>, rusqlite::Error> {
    let has_table: Option<i64> = connection
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'schema_meta'",
            params![],
            |row| row.get(0),
        )
        .optional()?;
    if has_table.is_none() {
        return Ok(None);
    }
    connection
        .query_row("SELECT version FROM schema_meta LIMIT 1", params![], |row| row.get(0))
        .optional()
}

/// Converts a raw stamp into a version number.
///
/// # Errors
///
/// Returns [`StoreError::Corrupt`] when the stamp does not fit a version.
pub(crate) fn stamp_to_version(stamp: i64) -> Result<i32, StoreError> {
    i32::try_from(stamp)
        .map_err(|_| StoreError::Corrupt(format!("schema version stamp out of range: {stamp}")))
}

/// Rewrites the version stamp inside an open transaction scope.
///
/// # Errors
///
/// Returns [`StoreError::Transaction`] when the stamp cannot be written.
pub(crate) fn stamp_version(scope: &TransactionScope<'_>, version: i32) -> Result<(), StoreError> {
    let updated =
        scope.execute("UPDATE schema_meta SET version = ?1", params![i64::from(version)])?;
    if updated == 0 {
        scope.execute(
            "INSERT INTO schema_meta (version) VALUES (?1)",
            params![i64::from(version)],
        )?;
    }
    Ok(())
}

/// Counts user tables in the store file.
pub(crate) fn table_count(connection: &Connection) -> Result<i64, rusqlite::Error> {
    connection.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table'",
        params![],
        |row| row.get(0),
    )
}
