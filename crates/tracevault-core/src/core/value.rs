// crates/tracevault-core/src/core/value.rs
// ============================================================================
// Module: Tracevault Literal Values
// Description: Engine-neutral SQL literal values for the formatting capability.
// Purpose: Let callers request engine-exact literal text without SQL strings.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! [`LiteralValue`] carries one SQL-typed value across the formatting
//! interface. The store renders it to literal text using the engine's own
//! quoting rules, so formatted output never drifts from what the engine
//! itself would produce.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Literal Value
// ============================================================================

/// One SQL-typed value to be rendered as an engine-exact literal.
///
/// # Invariants
/// - Variants map one-to-one onto the engine's storage classes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LiteralValue {
    /// SQL NULL.
    Null,
    /// 64-bit signed integer.
    Integer(i64),
    /// 64-bit floating-point value.
    Real(f64),
    /// UTF-8 text value.
    Text(String),
    /// Raw byte blob.
    Blob(Vec<u8>),
}
