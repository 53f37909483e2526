// crates/tracevault-core/src/error.rs
// ============================================================================
// Module: Tracevault Store Errors
// Description: Error taxonomy shared by every store operation.
// Purpose: Give callers stable variants for programmatic handling.
// Dependencies: thiserror
// ============================================================================

//! ## Overview
//! Every public store operation returns [`StoreError`]. Variants separate
//! the caller's likely responses: report a bad path, run migration tooling,
//! retry or surface a transaction failure, or treat the store as damaged.
//! No store operation terminates the process.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

// ============================================================================
// SECTION: Store Error
// ============================================================================

/// Trace store errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
/// - A failed operation leaves the store unchanged.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Store path is missing, unwritable, or not a recognized store file.
    #[error("trace store path error: {0}")]
    Path(String),
    /// Stamped schema version cannot be used by this build.
    #[error("trace store version mismatch: {0}")]
    IncompatibleVersion(String),
    /// Transactional operation failed and was rolled back.
    #[error("trace store transaction error (code {code}): {message}")]
    Transaction {
        /// Driver error message.
        message: String,
        /// Engine extended result code, or -1 when the driver gave none.
        code: i32,
    },
    /// Migration step failed and was rolled back.
    #[error("trace store migration {from} -> {to} failed: {message}")]
    Migration {
        /// Stamped version the step started from.
        from: i32,
        /// Version the step was moving to.
        to: i32,
        /// Underlying failure message.
        message: String,
    },
    /// Store file is recognized but its contents are malformed.
    #[error("trace store corruption: {0}")]
    Corrupt(String),
}
