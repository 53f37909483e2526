// crates/tracevault-core/src/core/entry.rs
// ============================================================================
// Module: Tracevault Entry Model
// Description: Trace entries and their owned dependents (variables, frames, keys).
// Purpose: Model one captured instrumentation event as a single value record.
// Dependencies: serde, crate::core::identity
// ============================================================================

//! ## Overview
//! A [`TraceEntry`] is the unit of ingestion: one instrumentation point
//! firing once inside one thread of one traced process instance. Dependents
//! (captured variables, the call backtrace, enable/disable trace keys) are
//! carried inline and persist atomically with their owning entry. Closed
//! enumerations persist as stable integer codes so stored data remains
//! readable across releases.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::identity::ProcessId;
use crate::core::identity::ThreadId;
use crate::core::identity::Timestamp;

// ============================================================================
// SECTION: Closed Enumerations
// ============================================================================

/// Kind of instrumentation point that produced an entry.
///
/// # Invariants
/// - Persisted codes are stable across releases; variants are never renumbered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    /// Plain log message emitted at a trace point.
    Message,
    /// Variable snapshot captured at a trace point.
    Snapshot,
    /// Watch-point notification for a monitored value.
    Watch,
    /// Error condition reported by the traced process.
    Error,
}

impl EntryKind {
    /// Returns the stable persisted code for this kind.
    #[must_use]
    pub const fn code(self) -> u32 {
        match self {
            Self::Message => 1,
            Self::Snapshot => 2,
            Self::Watch => 3,
            Self::Error => 4,
        }
    }

    /// Resolves a persisted code back to a kind, or `None` if unrecognized.
    #[must_use]
    pub const fn from_code(code: u32) -> Option<Self> {
        match code {
            1 => Some(Self::Message),
            2 => Some(Self::Snapshot),
            3 => Some(Self::Watch),
            4 => Some(Self::Error),
            _ => None,
        }
    }
}

/// Declared type of a captured variable value.
///
/// # Invariants
/// - Persisted codes are stable across releases; variants are never renumbered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariableKind {
    /// Type information was not supplied by the instrumentation layer.
    Unknown,
    /// UTF-8 string value.
    String,
    /// Integral numeric value.
    Number,
    /// Floating-point numeric value.
    Float,
    /// Boolean value.
    Boolean,
}

impl VariableKind {
    /// Returns the stable persisted code for this kind.
    #[must_use]
    pub const fn code(self) -> u32 {
        match self {
            Self::Unknown => 0,
            Self::String => 1,
            Self::Number => 2,
            Self::Float => 3,
            Self::Boolean => 4,
        }
    }

    /// Resolves a persisted code back to a kind, or `None` if unrecognized.
    #[must_use]
    pub const fn from_code(code: u32) -> Option<Self> {
        match code {
            0 => Some(Self::Unknown),
            1 => Some(Self::String),
            2 => Some(Self::Number),
            3 => Some(Self::Float),
            4 => Some(Self::Boolean),
            _ => None,
        }
    }
}

// ============================================================================
// SECTION: Entry Dependents
// ============================================================================

/// Named variable value captured alongside an entry.
///
/// # Invariants
/// - Owned by exactly one entry; shares its lifetime in the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variable {
    /// Variable name as written at the instrumentation point.
    pub name: String,
    /// Declared value type.
    pub kind: VariableKind,
    /// Value rendered to text by the instrumentation layer.
    pub value: String,
}

/// One frame of a captured call backtrace.
///
/// # Invariants
/// - Owned by exactly one entry; ordered innermost first within it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackFrame {
    /// Binary or shared object the frame executes in.
    pub module: String,
    /// Function name, demangled when available.
    pub function: String,
    /// Byte offset of the return address within the function.
    pub function_offset: u64,
    /// Source file of the frame, empty when unknown.
    pub source_file: String,
    /// Source line of the frame, zero when unknown.
    pub line: u32,
}

/// Enable/disable key attached to an entry.
///
/// # Invariants
/// - `name` is interned store-wide; `enabled` is recorded per entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceKey {
    /// Key name as configured in the traced process.
    pub name: String,
    /// Whether the key was enabled when the entry was captured.
    pub enabled: bool,
}

// ============================================================================
// SECTION: Trace Entry
// ============================================================================

/// One captured trace event with all of its owned dependents.
///
/// # Invariants
/// - `(pid, process_start_time)` identifies the producing process instance.
/// - `backtrace` order is innermost frame first and is preserved verbatim.
/// - Dependents persist atomically with the entry or not at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceEntry {
    /// Process identifier of the producing process.
    pub pid: ProcessId,
    /// Start time of the producing process instance.
    pub process_start_time: Timestamp,
    /// Executable name of the producing process.
    pub process_name: String,
    /// Thread identifier within the producing process.
    pub tid: ThreadId,
    /// Capture time of the event.
    pub timestamp: Timestamp,
    /// Kind of instrumentation point that fired.
    pub kind: EntryKind,
    /// Source file of the instrumentation point.
    pub path: String,
    /// Source line of the instrumentation point.
    pub line: u32,
    /// Optional group the instrumentation point belongs to.
    pub group_name: Option<String>,
    /// Function containing the instrumentation point.
    pub function: String,
    /// Message text supplied by the instrumentation point.
    pub message: String,
    /// Variables captured with the event, in capture order.
    pub variables: Vec<Variable>,
    /// Call backtrace at the event, innermost frame first.
    pub backtrace: Vec<StackFrame>,
    /// Call depth of the instrumentation point within its thread.
    pub stack_position: u64,
    /// Trace keys in effect for the event.
    pub trace_keys: Vec<TraceKey>,
}
