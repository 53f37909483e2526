// crates/tracevault-store-sqlite/tests/format_value_unit.rs
// ============================================================================
// Module: Value Formatting Unit Tests
// Description: Tests for engine-bound literal rendering.
// Purpose: Pin the rendered text for every literal variant, including the
//          quoting and escaping edge cases.
// Dependencies: tracevault-store-sqlite, tracevault-core, rusqlite, tempfile
// ============================================================================

//! ## Overview
//! Deterministic checks of [`ValueFormatter`] output:
//! - `NULL`, integer, and real literals render as bare tokens
//! - Text renders single-quoted with embedded quotes doubled
//! - Blobs render in hex notation
//! - Non-representable reals degrade to `NULL`

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

use rusqlite::Connection;
use tempfile::TempDir;
use tracevault_core::LiteralValue;
use tracevault_core::ValueFormatter;
use tracevault_store_sqlite::Store;

// ============================================================================
// SECTION: Helpers
// ============================================================================

fn formatting_store() -> (TempDir, Store) {
    let temp = TempDir::new().expect("temp dir");
    let store = Store::create(&temp.path().join("trace.db")).expect("create");
    (temp, store)
}

fn formatted(value: &LiteralValue) -> String {
    let (_temp, store) = formatting_store();
    store.format_value(value).expect("format")
}

// ============================================================================
// SECTION: Literal Rendering
// ============================================================================

#[test]
fn null_renders_as_null_text() {
    assert_eq!(formatted(&LiteralValue::Null), "NULL");
}

#[test]
fn integers_render_exactly() {
    assert_eq!(formatted(&LiteralValue::Integer(0)), "0");
    assert_eq!(formatted(&LiteralValue::Integer(-17)), "-17");
    assert_eq!(formatted(&LiteralValue::Integer(i64::MAX)), "9223372036854775807");
    assert_eq!(formatted(&LiteralValue::Integer(i64::MIN)), "-9223372036854775808");
}

#[test]
fn text_renders_single_quoted() {
    assert_eq!(formatted(&LiteralValue::Text("abc".to_string())), "'abc'");
    assert_eq!(formatted(&LiteralValue::Text(String::new())), "''");
}

#[test]
fn embedded_quotes_are_doubled() {
    assert_eq!(formatted(&LiteralValue::Text("it's".to_string())), "'it''s'");
    assert_eq!(formatted(&LiteralValue::Text("''".to_string())), "''''''");
}

#[test]
fn blobs_render_as_hex() {
    assert_eq!(formatted(&LiteralValue::Blob(vec![0x00, 0xFF, 0x10])), "X'00FF10'");
    assert_eq!(formatted(&LiteralValue::Blob(Vec::new())), "X''");
}

#[test]
fn binary_exact_reals_render_exactly() {
    assert_eq!(formatted(&LiteralValue::Real(1.5)), "1.5");
    assert_eq!(formatted(&LiteralValue::Real(-2.25)), "-2.25");
}

#[test]
fn nan_renders_as_null() {
    assert_eq!(formatted(&LiteralValue::Real(f64::NAN)), "NULL");
}

// ============================================================================
// SECTION: Re-Parse Safety
// ============================================================================

#[test]
fn formatted_text_is_safe_to_embed_in_statements() {
    let rendered = formatted(&LiteralValue::Text("it's; DROP TABLE trace_entry".to_string()));
    let scratch = Connection::open_in_memory().expect("scratch connection");
    let sql = format!("SELECT {rendered}");
    let evaluated: String = scratch.query_row(&sql, [], |row| row.get(0)).expect("evaluate");
    assert_eq!(evaluated, "it's; DROP TABLE trace_entry");
}
