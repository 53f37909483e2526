// crates/tracevault-store-sqlite/src/transaction.rs
// ============================================================================
// Module: Transaction Scope
// Description: Scope-bound unit of work over one store connection.
// Purpose: Guarantee commit-on-success and rollback-on-any-exit semantics.
// Dependencies: rusqlite, tracevault-core
// ============================================================================

//! ## Overview
//! [`TransactionScope`] wraps one engine transaction. The scope cannot be
//! copied or cloned and cannot outlive its connection borrow; dropping it
//! without an explicit commit rolls the transaction back, so every early
//! return and error path releases cleanly. Driver failures surface as
//! [`StoreError::Transaction`] carrying the engine's extended result code.

// ============================================================================
// SECTION: Imports
// ============================================================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use rusqlite::Params;
use rusqlite::Row;
use rusqlite::Transaction;
use rusqlite::TransactionBehavior;
use tracevault_core::StoreError;

// ============================================================================
// SECTION: Error Mapping
// ============================================================================

/// Converts a driver error into the transaction error variant.
///
/// The extended result code is preserved when the driver supplies one;
/// driver-side failures without an engine code report -1.
pub(crate) fn transaction_error(error: &rusqlite::Error) -> StoreError {
    let code = match error {
        rusqlite::Error::SqliteFailure(failure, _) => failure.extended_code,
        _ => -1,
    };
    StoreError::Transaction {
        message: error.to_string(),
        code,
    }
}

// ============================================================================
// SECTION: Transaction Scope
// ============================================================================

/// One unit of work bound to a connection borrow.
///
/// # Invariants
/// - At most one scope exists per connection at a time; scopes never nest.
/// - Dropping the scope without [`TransactionScope::commit`] rolls back.
pub struct TransactionScope<'conn> {
    /// Underlying engine transaction; rolls back on drop.
    tx: Transaction<'conn>,
}

impl<'conn> TransactionScope<'conn> {
    /// Wraps an engine transaction in a scope.
    pub(crate) const fn new(tx: Transaction<'conn>) -> Self {
        Self {
            tx,
        }
    }

    /// Executes one statement and returns the affected row count.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Transaction`] when the statement fails.
    pub fn execute<P: Params>(&self, sql: &str, params: P) -> Result<usize, StoreError> {
        self.tx.execute(sql, params).map_err(|err| transaction_error(&err))
    }

    /// Executes a batch of statements separated by semicolons.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Transaction`] when any statement fails.
    pub fn execute_batch(&self, sql: &str) -> Result<(), StoreError> {
        self.tx.execute_batch(sql).map_err(|err| transaction_error(&err))
    }

    /// Executes an INSERT and returns the identifier of the new row.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Transaction`] when the insert fails.
    pub fn insert<P: Params>(&self, sql: &str, params: P) -> Result<i64, StoreError> {
        self.tx.execute(sql, params).map_err(|err| transaction_error(&err))?;
        Ok(self.tx.last_insert_rowid())
    }

    /// Runs a single-row query, returning `None` when no row matches.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Transaction`] when the query fails.
    pub fn query_row_optional<T, P, F>(
        &self,
        sql: &str,
        params: P,
        map: F,
    ) -> Result<Option<T>, StoreError>
    where
        P: Params,
        F: FnOnce(&Row<'_>) -> rusqlite::Result<T>,
    {
        self.tx.query_row(sql, params, map).optional().map_err(|err| transaction_error(&err))
    }

    /// Runs a single-row query yielding one integer column.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Transaction`] when the query fails or yields
    /// no row.
    pub fn query_i64<P: Params>(&self, sql: &str, params: P) -> Result<i64, StoreError> {
        self.tx
            .query_row(sql, params, |row| row.get(0))
            .map_err(|err| transaction_error(&err))
    }

    /// Commits the scope, consuming it.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Transaction`] when the commit fails; the
    /// transaction is rolled back in that case.
    pub fn commit(self) -> Result<(), StoreError> {
        self.tx.commit().map_err(|err| transaction_error(&err))
    }
}

// ============================================================================
// SECTION: Transaction Runner
// ============================================================================

/// Runs one closure inside a fresh write transaction on `connection`.
///
/// The transaction begins `IMMEDIATE` so the write lock is taken up front
/// and contended writers wait out the busy timeout instead of failing on
/// first write. It commits when `operation` returns `Ok` and rolls back on
/// any error or early exit.
pub(crate) fn run_transaction<T, F>(
    connection: &mut Connection,
    operation: F,
) -> Result<T, StoreError>
where
    F: FnOnce(&TransactionScope<'_>) -> Result<T, StoreError>,
{
    let tx = connection
        .transaction_with_behavior(TransactionBehavior::Immediate)
        .map_err(|err| transaction_error(&err))?;
    let scope = TransactionScope::new(tx);
    let value = operation(&scope)?;
    scope.commit()?;
    Ok(value)
}
