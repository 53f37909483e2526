// crates/tracevault-core/src/core/mod.rs
// ============================================================================
// Module: Tracevault Core Model
// Description: Value types describing trace events and process lifecycles.
// Purpose: Group the entity model modules and re-export their public types.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! The core model is a set of owned value records exchanged by copy between
//! the instrumentation-facing ingestion path, the store, and read-side
//! consumers. No type here borrows from a connection or carries backend
//! state.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod entry;
pub mod identity;
pub mod process;
pub mod retention;
pub mod value;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use entry::EntryKind;
pub use entry::StackFrame;
pub use entry::TraceEntry;
pub use entry::TraceKey;
pub use entry::Variable;
pub use entry::VariableKind;
pub use identity::EntryId;
pub use identity::ProcessId;
pub use identity::ThreadId;
pub use identity::Timestamp;
pub use process::ProcessShutdownEvent;
pub use process::TracedApplicationInfo;
pub use retention::RetentionPolicy;
pub use value::LiteralValue;
