// crates/tracevault-store-sqlite/src/lib.rs
// ============================================================================
// Module: Tracevault SQLite Store
// Description: Schema-versioned trace-event store backed by SQLite.
// Purpose: Persist trace entries durably across schema evolution.
// Dependencies: tracevault-core, rusqlite, serde
// ============================================================================

//! ## Overview
//! This crate implements the tracevault storage contract on `SQLite`. One
//! [`Store`] owns one connection; every mutating operation runs inside a
//! scope-bound transaction that commits on success and rolls back on any
//! failure. Schema evolution moves through an explicit migration registry
//! keyed by adjacent version pairs, and retention trimming keeps entry
//! growth bounded without touching process lifecycle rows.

// ============================================================================
// SECTION: Modules
// ============================================================================

mod events;
mod format;
mod trim;

pub mod migration;
pub mod schema;
pub mod stats;
pub mod store;
pub mod transaction;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use migration::MigrationRegistry;
pub use migration::MigrationStep;
pub use migration::Migrator;
pub use migration::StepFn;
pub use schema::EXPECTED_SCHEMA_VERSION;
pub use schema::MAX_KNOWN_SCHEMA_VERSION;
pub use schema::MIN_SCHEMA_VERSION;
pub use stats::DbErrorCounts;
pub use stats::OpStatsSnapshot;
pub use store::JournalMode;
pub use store::Store;
pub use store::StoreConfig;
pub use store::SyncMode;
pub use transaction::TransactionScope;
