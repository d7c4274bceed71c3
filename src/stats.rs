//! Optional, caller-owned counters for structural tree events.
//!
//! Earlier prototypes in this lineage kept a process-global "slices moved"
//! counter for ad-hoc benchmarking. That does not survive into a library:
//! a counter shared by every table in the process is worse than useless once
//! more than one table exists. Instead, a caller who wants visibility passes
//! a `&EditStats` into the mutating entry points; by default none is passed
//! and the bookkeeping costs nothing.

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters incremented by the tree engine at structural-change events.
///
/// All fields use relaxed ordering: these are diagnostic counters, not
/// synchronization primitives, and the caller is expected to read them only
/// after joining whatever thread(s) performed the edits.
#[derive(Debug, Default)]
pub struct EditStats {
    /// Number of leaf splits performed.
    pub leaf_splits: AtomicU64,
    /// Number of inner-node splits performed.
    pub inner_splits: AtomicU64,
    /// Number of leaf merges (two leaves collapsed into one).
    pub leaf_merges: AtomicU64,
    /// Number of inner-node merges.
    pub inner_merges: AtomicU64,
    /// Number of leaf-to-leaf slot rebalances (transfer without merge).
    pub leaf_rebalances: AtomicU64,
    /// Number of inner-node slot rebalances.
    pub inner_rebalances: AtomicU64,
    /// Number of adjacent small-slot coalesce events within a leaf.
    pub slot_coalesces: AtomicU64,
    /// Number of root collapses (inner root dropped to its single child).
    pub root_collapses: AtomicU64,
    /// Number of root splits (new inner root allocated above two halves).
    pub root_splits: AtomicU64,
}

impl EditStats {
    /// Creates a fresh, zeroed counter set.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }
}
