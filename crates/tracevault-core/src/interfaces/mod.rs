// crates/tracevault-core/src/interfaces/mod.rs
// ============================================================================
// Module: Tracevault Interfaces
// Description: Backend-agnostic traits for writing, reading, and formatting.
// Purpose: Define the contract surfaces a trace store backend implements.
// Dependencies: crate::core, crate::error
// ============================================================================

//! ## Overview
//! Interfaces define how the ingestion path and read-side consumers talk to
//! a trace store without embedding backend details. Implementations must be
//! atomic per operation and fail without partial effects.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;

use serde::Deserialize;
use serde::Serialize;

use crate::core::EntryId;
use crate::core::LiteralValue;
use crate::core::ProcessShutdownEvent;
use crate::core::StackFrame;
use crate::core::TraceEntry;
use crate::core::TracedApplicationInfo;
use crate::error::StoreError;

// ============================================================================
// SECTION: Compatibility
// ============================================================================

/// Result of comparing a store's stamped schema version with the build's.
///
/// # Invariants
/// - Stamps newer than any version this build knows are always `Incompatible`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Compatibility {
    /// Stamp matches the expected schema version.
    Compatible,
    /// Stamp is older; an upgrade path is registered.
    NeedsUpgrade {
        /// Human-readable description of the required upgrade.
        detail: String,
    },
    /// Stamp is newer but still known; a downgrade path is registered.
    NeedsDowngrade {
        /// Human-readable description of the required downgrade.
        detail: String,
    },
    /// Stamp cannot be used by this build.
    Incompatible {
        /// Human-readable description of the mismatch.
        detail: String,
    },
}

impl Compatibility {
    /// Returns whether the store can be opened for normal use as-is.
    #[must_use]
    pub const fn is_compatible(&self) -> bool {
        matches!(self, Self::Compatible)
    }
}

// ============================================================================
// SECTION: Event Sink
// ============================================================================

/// Write-side contract for the ingestion path.
pub trait EventSink {
    /// Appends one trace entry and all of its dependents atomically.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the transaction fails; nothing is written.
    fn write_entry(&mut self, entry: &TraceEntry) -> Result<EntryId, StoreError>;

    /// Records a shutdown marker for one traced process instance.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the transaction fails; nothing is written.
    fn write_shutdown(&mut self, event: &ProcessShutdownEvent) -> Result<(), StoreError>;
}

// ============================================================================
// SECTION: Trace Reader
// ============================================================================

/// Read-side contract for viewers and tooling.
pub trait TraceReader {
    /// Returns the recorded backtrace of an entry, innermost frame first.
    ///
    /// An entry without a recorded stack yields an empty vector, not an
    /// error.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the read fails.
    fn backtrace_for_entry(&self, id: EntryId) -> Result<Vec<StackFrame>, StoreError>;

    /// Returns every distinct trace-point group name seen by the store.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the read fails.
    fn seen_group_ids(&self) -> Result<BTreeSet<String>, StoreError>;

    /// Returns one summary per traced process instance.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the read fails.
    fn traced_applications(&self) -> Result<Vec<TracedApplicationInfo>, StoreError>;

    /// Reconstructs a full entry with its dependents, or `None` if absent.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the read fails or stored codes are
    /// unrecognized.
    fn entry_by_id(&self, id: EntryId) -> Result<Option<TraceEntry>, StoreError>;

    /// Returns the number of retained entries.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the read fails.
    fn entry_count(&self) -> Result<u64, StoreError>;
}

// ============================================================================
// SECTION: Value Formatter
// ============================================================================

/// Formatting capability bound to a concrete storage engine.
pub trait ValueFormatter {
    /// Renders a literal value using the engine's own quoting rules.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the engine rejects the value.
    fn format_value(&self, value: &LiteralValue) -> Result<String, StoreError>;
}
