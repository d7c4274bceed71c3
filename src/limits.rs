//! Tuning constants for the slice tree.
//!
//! These are compile-time constants rather than runtime configuration: the
//! tree's on-disk-free, in-memory representation has no persisted layout that
//! would need to agree with a previous run, so there is nothing to version.
//! They are collected here, in one place, so a reader auditing the size
//! discipline of the tree does not have to hunt through `leaf`, `inner` and
//! `block` for magic numbers.

/// Small/large slot boundary in bytes. A slot whose span is `<= HIGH_WATER`
/// owns a private, in-place-editable buffer; a slot whose span exceeds it
/// references a shared, immutable [`crate::block::Block`].
pub const HIGH_WATER: usize = 4096;

/// Inner node fan-out, chosen so an inner node's entry array stays in the
/// same ballpark as a cache line multiple.
pub const B: usize = 15;

/// Leaf node slot capacity.
pub const B_LEAF: usize = 15;

/// Minimum live fill for a non-root inner node.
pub const MIN_INNER_FILL: usize = (B + 1) / 2;

/// Minimum live fill for a non-root leaf.
pub const MIN_LEAF_FILL: usize = (B_LEAF + 1) / 2;

/// Upper bound a neighborhood merge may assume when inspecting adjacent
/// slots around an edit point. The leaf coalesce pass here covers the
/// whole leaf in one linear scan rather than a bounded window of this size
/// (see [`crate::leaf::LeafNode::coalesce_all`]), which stays within the
/// same bound since `B_LEAF` is itself small.
pub const MAX_MERGE_WINDOW: usize = 5;

/// Bound on the cursor's stored root-to-leaf ancestor path. Trees built from
/// in-memory edits stay far shallower than this for any realistic size, so
/// the bound is never actually hit; it exists only to give the cursor's
/// `ArrayVec` a fixed capacity.
pub const MAX_TREE_DEPTH: usize = 48;

const _: () = assert!(B >= 4, "inner fanout must allow a meaningful split");
const _: () = assert!(B_LEAF >= 4, "leaf capacity must allow a meaningful split");
const _: () = assert!(HIGH_WATER > 0, "HIGH_WATER must be positive");
const _: () = assert!(MIN_INNER_FILL >= 2, "root inner fill minimum requires B >= 4");
const _: () = assert!(MIN_LEAF_FILL >= 1, "leaf fill minimum must be at least 1");
