// crates/tracevault-store-sqlite/src/stats.rs
// ============================================================================
// Module: Store Operation Counters
// Description: Lightweight counters for writes, trims, migrations, and errors.
// Purpose: Expose store activity for local diagnostics without a metrics layer.
// Dependencies: serde, tracevault-core
// ============================================================================

//! ## Overview
//! The store keeps in-process counters instead of emitting telemetry.
//! Counters accumulate per [`crate::store::Store`] instance and reset with
//! it; snapshots serialize for tooling output. Database failures are
//! classified by primary engine result code into busy, locked, and other
//! buckets.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use tracevault_core::StoreError;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Primary engine result code for busy contention.
const SQLITE_BUSY: i32 = 5;
/// Primary engine result code for table lock contention.
const SQLITE_LOCKED: i32 = 6;

// ============================================================================
// SECTION: Counter Types
// ============================================================================

/// Classified database failure counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DbErrorCounts {
    /// Failures with the busy result code.
    pub busy: u64,
    /// Failures with the locked result code.
    pub locked: u64,
    /// All other database failures.
    pub other: u64,
}

/// Snapshot of store operation counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpStatsSnapshot {
    /// Trace entries appended successfully.
    pub entries_written: u64,
    /// Shutdown markers recorded successfully.
    pub shutdowns_written: u64,
    /// Entries removed by trim passes.
    pub entries_trimmed: u64,
    /// Trim passes that removed at least one entry.
    pub trim_passes: u64,
    /// Migration steps committed.
    pub migration_steps: u64,
    /// Classified database failure counters.
    pub db_errors: DbErrorCounts,
}

/// Internal mutable counters before snapshot serialization.
#[derive(Debug, Default)]
pub(crate) struct OpStats {
    /// Trace entries appended successfully.
    entries_written: u64,
    /// Shutdown markers recorded successfully.
    shutdowns_written: u64,
    /// Entries removed by trim passes.
    entries_trimmed: u64,
    /// Trim passes that removed at least one entry.
    trim_passes: u64,
    /// Migration steps committed.
    migration_steps: u64,
    /// Classified database failure counters.
    db_errors: DbErrorCounts,
}

impl OpStats {
    /// Records one successful entry append.
    pub(crate) fn record_entry_written(&mut self) {
        self.entries_written += 1;
    }

    /// Records one successful shutdown marker.
    pub(crate) fn record_shutdown_written(&mut self) {
        self.shutdowns_written += 1;
    }

    /// Records a trim pass that removed `removed` entries.
    pub(crate) fn record_trim(&mut self, removed: u64) {
        if removed > 0 {
            self.trim_passes += 1;
            self.entries_trimmed += removed;
        }
    }

    /// Records one committed migration step.
    pub(crate) fn record_migration_step(&mut self) {
        self.migration_steps += 1;
    }

    /// Classifies and records a failed store operation.
    pub(crate) fn record_failure(&mut self, error: &StoreError) {
        match error {
            StoreError::Transaction {
                code, ..
            } => match primary_code(*code) {
                SQLITE_BUSY => self.db_errors.busy += 1,
                SQLITE_LOCKED => self.db_errors.locked += 1,
                _ => self.db_errors.other += 1,
            },
            StoreError::Migration {
                ..
            } => self.db_errors.other += 1,
            StoreError::Path(_) | StoreError::IncompatibleVersion(_) | StoreError::Corrupt(_) => {}
        }
    }

    /// Returns a serializable copy of the current counters.
    pub(crate) fn snapshot(&self) -> OpStatsSnapshot {
        OpStatsSnapshot {
            entries_written: self.entries_written,
            shutdowns_written: self.shutdowns_written,
            entries_trimmed: self.entries_trimmed,
            trim_passes: self.trim_passes,
            migration_steps: self.migration_steps,
            db_errors: self.db_errors,
        }
    }

    /// Clears all counters.
    pub(crate) fn reset(&mut self) {
        *self = Self::default();
    }
}

// ============================================================================
// SECTION: Classification
// ============================================================================

/// Extracts the primary result code from an extended engine code.
const fn primary_code(code: i32) -> i32 {
    code & 0xff
}
