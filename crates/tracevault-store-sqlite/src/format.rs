// crates/tracevault-store-sqlite/src/format.rs
// ============================================================================
// Module: Engine-Bound Value Formatting
// Description: Literal rendering delegated to the storage engine itself.
// Purpose: Produce SQL literal text the engine is guaranteed to parse back.
// Dependencies: tracevault-core, rusqlite
// ============================================================================

//! ## Overview
//! Formatting goes through the engine's own `quote()` function instead of a
//! hand-written escaper, so the produced text always matches the quoting and
//! escaping rules of the engine build actually linked in. A `NULL` literal
//! renders as the text `NULL`, text doubles embedded quotes, and blobs render
//! in `X'..'` hex notation.

// ============================================================================
// SECTION: Imports
// ============================================================================

use rusqlite::params;
use rusqlite::types::Value;
use tracevault_core::LiteralValue;
use tracevault_core::StoreError;
use tracevault_core::ValueFormatter;

use crate::store::Store;
use crate::transaction::transaction_error;

// ============================================================================
// SECTION: Conversion
// ============================================================================

/// Converts a literal into the engine's owned value type for binding.
fn literal_to_sql(value: &LiteralValue) -> Value {
    match value {
        LiteralValue::Null => Value::Null,
        LiteralValue::Integer(value) => Value::Integer(*value),
        LiteralValue::Real(value) => Value::Real(*value),
        LiteralValue::Text(value) => Value::Text(value.clone()),
        LiteralValue::Blob(value) => Value::Blob(value.clone()),
    }
}

// ============================================================================
// SECTION: Store Contract Implementation
// ============================================================================

impl ValueFormatter for Store {
    fn format_value(&self, value: &LiteralValue) -> Result<String, StoreError> {
        self.connection()
            .query_row("SELECT quote(?1)", params![literal_to_sql(value)], |row| row.get(0))
            .map_err(|err| transaction_error(&err))
    }
}
