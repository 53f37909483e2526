// crates/tracevault-core/src/lib.rs
// ============================================================================
// Module: Tracevault Core
// Description: Entity model, error taxonomy, and interfaces for the trace store.
// Purpose: Define the backend-agnostic contract shared by store implementations.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! Tracevault core defines the value model for execution-trace events
//! (entries, variables, stack frames, trace keys, process lifecycle records),
//! the error taxonomy shared by every store operation, the retention policy
//! type, and the traits a storage backend implements. The crate contains no
//! storage logic and no engine dependency; backends live in sibling crates.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod error;
pub mod interfaces;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use self::core::EntryId;
pub use self::core::EntryKind;
pub use self::core::LiteralValue;
pub use self::core::ProcessId;
pub use self::core::ProcessShutdownEvent;
pub use self::core::RetentionPolicy;
pub use self::core::StackFrame;
pub use self::core::ThreadId;
pub use self::core::Timestamp;
pub use self::core::TraceEntry;
pub use self::core::TraceKey;
pub use self::core::TracedApplicationInfo;
pub use self::core::Variable;
pub use self::core::VariableKind;
pub use error::StoreError;
pub use interfaces::Compatibility;
pub use interfaces::EventSink;
pub use interfaces::TraceReader;
pub use interfaces::ValueFormatter;
