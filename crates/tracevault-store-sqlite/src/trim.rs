// crates/tracevault-store-sqlite/src/trim.rs
// ============================================================================
// Module: Retention Trimmer
// Description: Bounded-size enforcement over the recorded entry stream.
// Purpose: Drop the oldest entries and their dependents past a keep target.
// Dependencies: tracevault-core, rusqlite
// ============================================================================

//! ## Overview
//! Age is the insertion sequence: entry identifiers are allocated
//! monotonically and never reused, so "oldest" is simply "smallest
//! identifier". A trim pass finds the smallest identifier that survives,
//! then deletes every entry below it together with its variables, stack
//! frames, and trace-key rows in one transaction. Interned rows such as
//! processes, trace points, and names are never trimmed; they stay valid
//! targets for future entries.

// ============================================================================
// SECTION: Imports
// ============================================================================

use rusqlite::params;
use tracevault_core::StoreError;
use tracevault_core::TraceReader;

use crate::store::Store;
use crate::transaction::TransactionScope;

// ============================================================================
// SECTION: Trim Pass
// ============================================================================

/// Finds the smallest entry identifier that survives a trim to `keep`.
///
/// Returns `None` when no row needs to go: the store already holds at most
/// `keep` entries, or it is empty.
fn cutoff_id(scope: &TransactionScope<'_>, keep: u64) -> Result<Option<i64>, StoreError> {
    if keep == 0 {
        let newest: Option<i64> = scope.query_row_optional(
            "SELECT id FROM trace_entry ORDER BY id DESC LIMIT 1",
            params![],
            |row| row.get(0),
        )?;
        return Ok(newest.map(|id| id.saturating_add(1)));
    }
    let Ok(offset) = i64::try_from(keep - 1) else {
        return Ok(None);
    };
    scope.query_row_optional(
        "SELECT id FROM trace_entry ORDER BY id DESC LIMIT 1 OFFSET ?1",
        params![offset],
        |row| row.get(0),
    )
}

/// Deletes every entry below `cutoff` together with its dependents.
fn delete_below(scope: &TransactionScope<'_>, cutoff: i64) -> Result<u64, StoreError> {
    scope.execute("DELETE FROM variable WHERE trace_entry_id < ?1", params![cutoff])?;
    scope.execute("DELETE FROM stackframe WHERE trace_entry_id < ?1", params![cutoff])?;
    scope.execute("DELETE FROM entry_trace_key WHERE trace_entry_id < ?1", params![cutoff])?;
    let removed = scope.execute("DELETE FROM trace_entry WHERE id < ?1", params![cutoff])?;
    Ok(u64::try_from(removed).unwrap_or(u64::MAX))
}

/// One full trim pass inside an open transaction scope.
fn trim_pass(scope: &TransactionScope<'_>, keep: u64) -> Result<u64, StoreError> {
    let Some(cutoff) = cutoff_id(scope, keep)? else {
        return Ok(0);
    };
    delete_below(scope, cutoff)
}

// ============================================================================
// SECTION: Store Operations
// ============================================================================

impl Store {
    /// Trims the store down to at most `keep` newest entries.
    ///
    /// Returns the number of entries removed. A store already at or below
    /// `keep` is left untouched and reports zero. Process rows and shutdown
    /// markers survive trimming.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Transaction`] when the pass fails; no rows are
    /// removed in that case.
    pub fn trim_to(&mut self, keep: u64) -> Result<u64, StoreError> {
        let removed = self.with_transaction(|scope| trim_pass(scope, keep))?;
        self.stats_mut().record_trim(removed);
        Ok(removed)
    }

    /// Trims to the configured soft limit when the hard limit is exceeded.
    ///
    /// Returns the number of entries removed, zero when the retention policy
    /// did not trigger.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when counting or trimming fails.
    pub fn enforce_retention(&mut self) -> Result<u64, StoreError> {
        let count = self.entry_count()?;
        let policy = self.config().retention;
        if !policy.wants_trim(count) {
            return Ok(0);
        }
        self.trim_to(policy.target())
    }
}
