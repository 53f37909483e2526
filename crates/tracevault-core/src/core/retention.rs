// crates/tracevault-core/src/core/retention.rs
// ============================================================================
// Module: Tracevault Retention Policy
// Description: Soft/hard entry-count thresholds driving automatic trimming.
// Purpose: Keep store growth bounded without trimming on every write.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Retention is hysteresis-based: nothing is trimmed until the entry count
//! exceeds the hard limit, and a trim pass then cuts back to the soft
//! limit. The gap between the two bounds how often trim passes run under a
//! steady write load.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Defaults
// ============================================================================

/// Default soft limit: the entry count a trim pass cuts back to.
const fn default_soft_limit() -> u64 {
    1_500_000
}

/// Default hard limit: the entry count that triggers a trim pass.
const fn default_hard_limit() -> u64 {
    2_000_000
}

// ============================================================================
// SECTION: Retention Policy
// ============================================================================

/// Entry-count thresholds for automatic retention trimming.
///
/// # Invariants
/// - `soft_limit <= hard_limit` for the hysteresis to bound pass frequency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetentionPolicy {
    /// Entry count a trim pass cuts back to.
    #[serde(default = "default_soft_limit")]
    pub soft_limit: u64,
    /// Entry count that triggers a trim pass.
    #[serde(default = "default_hard_limit")]
    pub hard_limit: u64,
}

impl RetentionPolicy {
    /// Creates a policy from explicit thresholds.
    #[must_use]
    pub const fn new(soft_limit: u64, hard_limit: u64) -> Self {
        Self {
            soft_limit,
            hard_limit,
        }
    }

    /// Returns whether a store holding `entry_count` entries should be trimmed.
    #[must_use]
    pub const fn wants_trim(&self, entry_count: u64) -> bool {
        entry_count > self.hard_limit
    }

    /// Returns the entry count a triggered trim pass keeps.
    #[must_use]
    pub const fn target(&self) -> u64 {
        self.soft_limit
    }
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            soft_limit: default_soft_limit(),
            hard_limit: default_hard_limit(),
        }
    }
}
