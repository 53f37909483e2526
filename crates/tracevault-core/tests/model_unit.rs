// crates/tracevault-core/tests/model_unit.rs
// ============================================================================
// Module: Core Model Unit Tests
// Description: Targeted tests for entity codes, retention policy, and identity.
// Purpose: Validate stable persisted codes, policy thresholds, and serde forms.
// ============================================================================

//! ## Overview
//! Unit-level tests for the core model:
//! - Closed-enumeration code round-trips and unknown-code rejection
//! - Retention policy defaults and trigger thresholds
//! - Transparent serialization of identifier newtypes
//! - Compatibility classification helpers

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions and helpers are permitted."
)]

use tracevault_core::Compatibility;
use tracevault_core::EntryId;
use tracevault_core::EntryKind;
use tracevault_core::ProcessId;
use tracevault_core::RetentionPolicy;
use tracevault_core::Timestamp;
use tracevault_core::VariableKind;

// ============================================================================
// SECTION: Closed Enumeration Codes
// ============================================================================

#[test]
fn entry_kind_codes_are_stable() {
    assert_eq!(EntryKind::Message.code(), 1);
    assert_eq!(EntryKind::Snapshot.code(), 2);
    assert_eq!(EntryKind::Watch.code(), 3);
    assert_eq!(EntryKind::Error.code(), 4);
}

#[test]
fn entry_kind_code_round_trip() {
    for kind in [
        EntryKind::Message,
        EntryKind::Snapshot,
        EntryKind::Watch,
        EntryKind::Error,
    ] {
        assert_eq!(EntryKind::from_code(kind.code()), Some(kind));
    }
}

#[test]
fn entry_kind_rejects_unknown_codes() {
    assert_eq!(EntryKind::from_code(0), None);
    assert_eq!(EntryKind::from_code(5), None);
    assert_eq!(EntryKind::from_code(u32::MAX), None);
}

#[test]
fn variable_kind_codes_are_stable() {
    assert_eq!(VariableKind::Unknown.code(), 0);
    assert_eq!(VariableKind::String.code(), 1);
    assert_eq!(VariableKind::Number.code(), 2);
    assert_eq!(VariableKind::Float.code(), 3);
    assert_eq!(VariableKind::Boolean.code(), 4);
}

#[test]
fn variable_kind_code_round_trip() {
    for kind in [
        VariableKind::Unknown,
        VariableKind::String,
        VariableKind::Number,
        VariableKind::Float,
        VariableKind::Boolean,
    ] {
        assert_eq!(VariableKind::from_code(kind.code()), Some(kind));
    }
}

#[test]
fn variable_kind_rejects_unknown_codes() {
    assert_eq!(VariableKind::from_code(5), None);
    assert_eq!(VariableKind::from_code(u32::MAX), None);
}

// ============================================================================
// SECTION: Retention Policy
// ============================================================================

#[test]
fn retention_defaults_match_shipped_limits() {
    let policy = RetentionPolicy::default();
    assert_eq!(policy.soft_limit, 1_500_000);
    assert_eq!(policy.hard_limit, 2_000_000);
}

#[test]
fn retention_triggers_only_above_hard_limit() {
    let policy = RetentionPolicy::new(10, 20);
    assert!(!policy.wants_trim(0));
    assert!(!policy.wants_trim(20));
    assert!(policy.wants_trim(21));
    assert_eq!(policy.target(), 10);
}

#[test]
fn retention_deserializes_with_defaults() {
    let policy: RetentionPolicy = serde_json::from_str("{}").unwrap();
    assert_eq!(policy, RetentionPolicy::default());

    let partial: RetentionPolicy = serde_json::from_str(r#"{"soft_limit": 7}"#).unwrap();
    assert_eq!(partial.soft_limit, 7);
    assert_eq!(partial.hard_limit, 2_000_000);
}

// ============================================================================
// SECTION: Identity Types
// ============================================================================

#[test]
fn identifiers_serialize_transparently() {
    let pid = serde_json::to_string(&ProcessId::new(4_112)).unwrap();
    assert_eq!(pid, "4112");

    let id = serde_json::to_string(&EntryId::new(99)).unwrap();
    assert_eq!(id, "99");

    let ts: Timestamp = serde_json::from_str("1724198400000").unwrap();
    assert_eq!(ts.unix_millis(), 1_724_198_400_000);
}

#[test]
fn timestamps_order_chronologically() {
    let earlier = Timestamp::from_unix_millis(1_000);
    let later = Timestamp::from_unix_millis(2_000);
    assert!(earlier < later);
    assert_eq!(earlier.max(later), later);
}

// ============================================================================
// SECTION: Compatibility
// ============================================================================

#[test]
fn compatibility_helper_matches_variants() {
    assert!(Compatibility::Compatible.is_compatible());
    assert!(
        !Compatibility::NeedsUpgrade {
            detail: "stamp 1, expected 3".to_owned(),
        }
        .is_compatible()
    );
    assert!(
        !Compatibility::Incompatible {
            detail: "stamp 9 is newer than any known version".to_owned(),
        }
        .is_compatible()
    );
}
