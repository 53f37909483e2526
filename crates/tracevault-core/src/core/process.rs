// crates/tracevault-core/src/core/process.rs
// ============================================================================
// Module: Tracevault Process Lifecycle
// Description: Process shutdown events and traced application summaries.
// Purpose: Model process lifecycle records independent of individual entries.
// Dependencies: serde, crate::core::identity
// ============================================================================

//! ## Overview
//! Process lifecycle records outlive the entries a process produced: a
//! shutdown marker closes a process instance, and application summaries
//! enumerate every instance the store has seen. Retention trimming removes
//! entries but never these records.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::identity::ProcessId;
use crate::core::identity::Timestamp;

// ============================================================================
// SECTION: Lifecycle Records
// ============================================================================

/// Shutdown marker for one traced process instance.
///
/// # Invariants
/// - `(pid, start_time)` identifies the instance being closed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessShutdownEvent {
    /// Process identifier of the instance.
    pub pid: ProcessId,
    /// Start time of the instance.
    pub start_time: Timestamp,
    /// Time the instance stopped.
    pub stop_time: Timestamp,
    /// Executable name of the instance.
    pub name: String,
}

/// Summary of one traced process instance known to the store.
///
/// # Invariants
/// - `stop_time` is `None` while the instance has not reported shutdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TracedApplicationInfo {
    /// Process identifier of the instance.
    pub pid: ProcessId,
    /// Start time of the instance.
    pub start_time: Timestamp,
    /// Stop time of the instance, if it has shut down.
    pub stop_time: Option<Timestamp>,
    /// Executable name of the instance.
    pub name: String,
}
