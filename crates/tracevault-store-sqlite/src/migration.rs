// crates/tracevault-store-sqlite/src/migration.rs
// ============================================================================
// Module: Schema Migration Engine
// Description: Registry of single-step migrations and the engine running them.
// Purpose: Move a store between adjacent schema versions transactionally.
// Dependencies: tracevault-core, rusqlite
// ============================================================================

//! ## Overview
//! Every migration is a single step between adjacent schema versions, held in
//! an explicit registry keyed by the `(from, to)` pair. The engine walks the
//! registry one step at a time; each step body and the new version stamp
//! commit in one transaction, so an interrupted migration leaves the store at
//! a well-defined version. Classification against the expected version tells
//! callers whether a store is usable as-is, reachable through registered
//! steps, or out of reach.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use tracevault_core::Compatibility;
use tracevault_core::StoreError;

use crate::schema;
use crate::store::Store;
use crate::transaction::TransactionScope;
use crate::transaction::run_transaction;

// ============================================================================
// SECTION: Migration Step
// ============================================================================

/// Body of a migration step, run inside the step's transaction.
pub type StepFn = fn(&TransactionScope<'_>) -> Result<(), StoreError>;

/// One registered transformation between two adjacent schema versions.
#[derive(Debug, Clone, Copy)]
pub struct MigrationStep {
    /// Version the step starts from.
    pub from: i32,
    /// Version the step produces.
    pub to: i32,
    /// Short description of what the step changes.
    pub summary: &'static str,
    /// Transformation body.
    pub apply: StepFn,
}

// ============================================================================
// SECTION: Registry
// ============================================================================

/// Explicit registry of migration steps keyed by `(from, to)`.
#[derive(Debug, Clone, Default)]
pub struct MigrationRegistry {
    /// Registered steps by version pair.
    steps: BTreeMap<(i32, i32), MigrationStep>,
}

impl MigrationRegistry {
    /// Creates a registry with no steps.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            steps: BTreeMap::new(),
        }
    }

    /// Creates the registry holding every step this build ships.
    #[must_use]
    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        registry.register(MigrationStep {
            from: 1,
            to: 2,
            summary: "intern trace point group names into a dedicated table",
            apply: upgrade_v1_to_v2,
        });
        registry.register(MigrationStep {
            from: 2,
            to: 3,
            summary: "add trace key tables for per-entry key annotations",
            apply: upgrade_v2_to_v3,
        });
        registry.register(MigrationStep {
            from: 3,
            to: 2,
            summary: "drop trace key tables, discarding key annotations",
            apply: downgrade_v3_to_v2,
        });
        registry.register(MigrationStep {
            from: 2,
            to: 1,
            summary: "inline trace point group names back into trace points",
            apply: downgrade_v2_to_v1,
        });
        registry
    }

    /// Registers a step, replacing any step already present for its pair.
    pub fn register(&mut self, step: MigrationStep) {
        self.steps.insert((step.from, step.to), step);
    }

    /// Returns the step registered for a version pair, if any.
    #[must_use]
    pub fn step(&self, from: i32, to: i32) -> Option<&MigrationStep> {
        self.steps.get(&(from, to))
    }

    /// Returns whether single steps chain all the way from `from` to `to`.
    #[must_use]
    pub fn has_chain(&self, from: i32, to: i32) -> bool {
        let mut current = from;
        while current != to {
            let next = if current < to { current + 1 } else { current - 1 };
            if self.step(current, next).is_none() {
                return false;
            }
            current = next;
        }
        true
    }
}

// ============================================================================
// SECTION: Migrator
// ============================================================================

/// Engine that applies registered steps to a store.
#[derive(Debug, Clone)]
pub struct Migrator {
    /// Steps available to this engine.
    registry: MigrationRegistry,
}

impl Default for Migrator {
    fn default() -> Self {
        Self::new()
    }
}

impl Migrator {
    /// Creates an engine holding the builtin registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            registry: MigrationRegistry::builtin(),
        }
    }

    /// Creates an engine holding a caller-provided registry.
    #[must_use]
    pub const fn with_registry(registry: MigrationRegistry) -> Self {
        Self {
            registry,
        }
    }

    /// Returns the registry backing this engine.
    #[must_use]
    pub const fn registry(&self) -> &MigrationRegistry {
        &self.registry
    }

    /// Applies the single registered step upward from the store's version.
    ///
    /// The step body and the new version stamp commit together; on failure
    /// the store keeps its prior version and contents.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::IncompatibleVersion`] when no step is registered
    /// for the pair, and [`StoreError::Migration`] when the step fails.
    pub fn upgrade(&self, store: &mut Store) -> Result<i32, StoreError> {
        let current = store.current_version()?;
        self.apply_step(store, current, current + 1)
    }

    /// Applies the single registered step downward from the store's version.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::IncompatibleVersion`] when no step is registered
    /// for the pair, and [`StoreError::Migration`] when the step fails.
    pub fn downgrade(&self, store: &mut Store) -> Result<i32, StoreError> {
        let current = store.current_version()?;
        self.apply_step(store, current, current - 1)
    }

    /// Runs one registered step and stamps the new version transactionally.
    fn apply_step(&self, store: &mut Store, from: i32, to: i32) -> Result<i32, StoreError> {
        let Some(step) = self.registry.step(from, to) else {
            return Err(StoreError::IncompatibleVersion(format!(
                "no migration step registered from version {from} to version {to}"
            )));
        };
        let apply = step.apply;
        let outcome = run_transaction(store.connection_mut(), |scope| {
            apply(scope)?;
            schema::stamp_version(scope, to)?;
            Ok(())
        });
        match outcome {
            Ok(()) => {
                store.stats_mut().record_migration_step();
                Ok(to)
            },
            Err(error) => Err(StoreError::Migration {
                from,
                to,
                message: error.to_string(),
            }),
        }
    }

    /// Classifies a stamped version against the version this build expects.
    #[must_use]
    pub fn classify(&self, stamped: i32) -> Compatibility {
        let expected = schema::EXPECTED_SCHEMA_VERSION;
        if stamped == expected {
            return Compatibility::Compatible;
        }
        if stamped > schema::MAX_KNOWN_SCHEMA_VERSION {
            return Compatibility::Incompatible {
                detail: format!(
                    "store version {stamped} is newer than any version this build knows \
                     (maximum {max})",
                    max = schema::MAX_KNOWN_SCHEMA_VERSION
                ),
            };
        }
        if !self.registry.has_chain(stamped, expected) {
            return Compatibility::Incompatible {
                detail: format!(
                    "no migration path from version {stamped} to version {expected}"
                ),
            };
        }
        if stamped < expected {
            Compatibility::NeedsUpgrade {
                detail: format!("store version {stamped} must upgrade to version {expected}"),
            }
        } else {
            Compatibility::NeedsDowngrade {
                detail: format!("store version {stamped} must downgrade to version {expected}"),
            }
        }
    }
}

// ============================================================================
// SECTION: Builtin Steps
// ============================================================================

/// Interns trace-point group names into `trace_point_group` rows.
fn upgrade_v1_to_v2(scope: &TransactionScope<'_>) -> Result<(), StoreError> {
    scope.execute_batch(
        "CREATE TABLE trace_point_group (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL UNIQUE
        );
        INSERT INTO trace_point_group (name)
            SELECT DISTINCT group_name FROM trace_point
            WHERE group_name IS NOT NULL ORDER BY group_name;
        ALTER TABLE trace_point ADD COLUMN group_id INTEGER;
        UPDATE trace_point SET group_id = (
            SELECT id FROM trace_point_group
            WHERE trace_point_group.name = trace_point.group_name
        );
        ALTER TABLE trace_point DROP COLUMN group_name;",
    )
}

/// Adds the trace-key tables introduced by version 3.
fn upgrade_v2_to_v3(scope: &TransactionScope<'_>) -> Result<(), StoreError> {
    scope.execute_batch(
        "CREATE TABLE trace_key (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL UNIQUE
        );
        CREATE TABLE entry_trace_key (
            trace_entry_id INTEGER NOT NULL REFERENCES trace_entry(id),
            trace_key_id INTEGER NOT NULL REFERENCES trace_key(id),
            position INTEGER NOT NULL,
            enabled INTEGER NOT NULL,
            PRIMARY KEY (trace_entry_id, position)
        );",
    )
}

/// Drops the trace-key tables, discarding every key annotation.
///
/// The referencing table goes first so the foreign key on `trace_key_id`
/// never dangles mid-step.
fn downgrade_v3_to_v2(scope: &TransactionScope<'_>) -> Result<(), StoreError> {
    scope.execute_batch(
        "DROP TABLE entry_trace_key;
        DROP TABLE trace_key;",
    )
}

/// Inlines group names back into `trace_point` and drops the group table.
fn downgrade_v2_to_v1(scope: &TransactionScope<'_>) -> Result<(), StoreError> {
    scope.execute_batch(
        "ALTER TABLE trace_point ADD COLUMN group_name TEXT;
        UPDATE trace_point SET group_name = (
            SELECT name FROM trace_point_group
            WHERE trace_point_group.id = trace_point.group_id
        );
        ALTER TABLE trace_point DROP COLUMN group_id;
        DROP TABLE trace_point_group;",
    )
}
