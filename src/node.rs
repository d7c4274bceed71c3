//! The tagged node reference and the recursive edit descent (tree engine).
//!
//! A node is self-describing: `NodeRef` tags each node as `Leaf` or `Inner`
//! up front, so nothing here branches on tree depth to decide whether a
//! node holds slots or children.
//!
//! Copy-on-write is `Arc::make_mut`: every mutating path reaches a node
//! through it, which clones the node (and, for a leaf, every small slot's
//! private buffer along with it) exactly when the refcount says another
//! handle is watching, and hands back a plain `&mut` otherwise. There is no
//! hand-rolled refcount inspection anywhere in this module.

use std::sync::Arc;

use log::{debug, trace};

use crate::inner::{InnerEdit, InnerNode};
use crate::leaf::{LeafEdit, LeafNode};
use crate::limits::B_LEAF;
use crate::stats::EditStats;

#[derive(Clone, Debug)]
pub(crate) enum NodeRef {
    Leaf(Arc<LeafNode>),
    Inner(Arc<InnerNode>),
}

impl NodeRef {
    pub(crate) fn empty_leaf() -> NodeRef {
        NodeRef::Leaf(Arc::new(LeafNode::empty()))
    }

    pub(crate) fn sum(&self) -> usize {
        match self {
            NodeRef::Leaf(l) => l.sum(),
            NodeRef::Inner(n) => n.sum(),
        }
    }

    pub(crate) fn is_leaf(&self) -> bool {
        matches!(self, NodeRef::Leaf(_))
    }

    pub(crate) fn dump_into(&self, out: &mut Vec<u8>) {
        match self {
            NodeRef::Leaf(l) => l.dump_into(out),
            NodeRef::Inner(n) => {
                for (_, child) in n.children() {
                    child.dump_into(out);
                }
            }
        }
    }

    pub(crate) fn node_count(&self) -> usize {
        match self {
            NodeRef::Leaf(_) => 1,
            NodeRef::Inner(n) => {
                1 + n
                    .children()
                    .iter()
                    .map(|(_, child)| child.node_count())
                    .sum::<usize>()
            }
        }
    }
}

/// Outcome of an edit, reported from a child level up to its parent.
pub(crate) enum Edit {
    Ok,
    Split(NodeRef, usize),
    Underflow,
    Empty,
}

fn bump(stats: Option<&EditStats>, pick: impl Fn(&EditStats) -> &std::sync::atomic::AtomicU64) {
    if let Some(s) = stats {
        EditStats::bump(pick(s));
    }
}

/// Inserts `data` at byte offset `pos` within the subtree rooted at `node`.
/// Returns the subtree's span delta and the structural outcome to resolve
/// at the parent (or at the table root, for the top-level call).
pub(crate) fn insert(node: &mut NodeRef, pos: usize, data: &[u8], stats: Option<&EditStats>) -> (isize, Edit) {
    trace!("insert: pos={} len={}", pos, data.len());
    match node {
        NodeRef::Leaf(arc) => {
            let leaf = Arc::make_mut(arc);
            let before = leaf.sum();
            let outcome = leaf.insert(pos, data, stats);
            let delta = leaf.sum() as isize - before as isize;
            let edit = match outcome {
                LeafEdit::Ok => Edit::Ok,
                LeafEdit::Split(right) => {
                    debug!("leaf split: left fill={} right fill={}", leaf.fill(), right.fill());
                    bump(stats, |s| &s.leaf_splits);
                    let span = right.sum();
                    Edit::Split(NodeRef::Leaf(Arc::new(right)), span)
                }
                LeafEdit::Underflow | LeafEdit::Empty => {
                    unreachable!("insert only grows a leaf")
                }
            };
            (delta, edit)
        }
        NodeRef::Inner(arc) => {
            let inner = Arc::make_mut(arc);
            let (idx, residual) = inner.offset_of(pos);
            let (delta, child_outcome) = insert(inner.child_mut(idx), residual, data, stats);
            inner.apply_delta(idx, delta);
            let edit = match child_outcome {
                Edit::Ok => Edit::Ok,
                Edit::Split(sibling, span) => match inner.insert_child(idx + 1, (span, sibling)) {
                    InnerEdit::Ok => Edit::Ok,
                    InnerEdit::Split(right) => {
                        debug!("inner split: left fill={} right fill={}", inner.fill(), right.fill());
                        bump(stats, |s| &s.inner_splits);
                        let right_span = right.sum();
                        Edit::Split(NodeRef::Inner(Arc::new(right)), right_span)
                    }
                    InnerEdit::Underflow | InnerEdit::Empty => {
                        unreachable!("inserting a child never underflows the parent")
                    }
                },
                Edit::Underflow | Edit::Empty => {
                    unreachable!("insert never underflows a child")
                }
            };
            (delta, edit)
        }
    }
}

/// Deletes up to `len` bytes starting at `pos` within the subtree rooted at
/// `node`, stopping early at this subtree's own end. Returns the span
/// delta (non-positive), the number of bytes actually removed, and the
/// structural outcome to resolve at the parent.
pub(crate) fn delete(
    node: &mut NodeRef,
    pos: usize,
    len: usize,
    stats: Option<&EditStats>,
) -> (isize, usize, Edit) {
    trace!("delete: pos={} len={}", pos, len);
    match node {
        NodeRef::Leaf(arc) => {
            let leaf = Arc::make_mut(arc);
            let before = leaf.sum();
            let removable = len.min(before - pos);
            let outcome = leaf.delete(pos, removable, stats);
            let after = leaf.sum();
            let delta = after as isize - before as isize;
            let edit = match outcome {
                LeafEdit::Ok => Edit::Ok,
                LeafEdit::Underflow => Edit::Underflow,
                LeafEdit::Empty => Edit::Empty,
                LeafEdit::Split(right) => {
                    // An interior delete on a large slot splits it into a
                    // prefix and a suffix; if the leaf was already full this
                    // overflows it just as an insert-driven split would.
                    debug!("leaf split (delete): left fill={} right fill={}", leaf.fill(), right.fill());
                    bump(stats, |s| &s.leaf_splits);
                    let span = right.sum();
                    Edit::Split(NodeRef::Leaf(Arc::new(right)), span)
                }
            };
            (delta, removable, edit)
        }
        NodeRef::Inner(arc) => {
            let inner = Arc::make_mut(arc);
            let (idx, residual) = inner.offset_of(pos);
            let child_span = inner.span(idx);
            let removable_here = len.min(child_span - residual);
            let (delta, removed, child_outcome) =
                delete(inner.child_mut(idx), residual, removable_here, stats);
            inner.apply_delta(idx, delta);
            let edit = resolve_child_outcome(inner, idx, child_outcome, stats);
            (delta, removed, edit)
        }
    }
}

fn resolve_child_outcome(
    inner: &mut InnerNode,
    idx: usize,
    outcome: Edit,
    stats: Option<&EditStats>,
) -> Edit {
    match outcome {
        Edit::Ok => Edit::Ok,
        Edit::Split(sibling, span) => match inner.insert_child(idx + 1, (span, sibling)) {
            InnerEdit::Ok => Edit::Ok,
            InnerEdit::Split(right) => {
                debug!("inner split (delete): left fill={} right fill={}", inner.fill(), right.fill());
                bump(stats, |s| &s.inner_splits);
                let right_span = right.sum();
                Edit::Split(NodeRef::Inner(Arc::new(right)), right_span)
            }
            InnerEdit::Underflow | InnerEdit::Empty => {
                unreachable!("inserting a child never underflows the parent")
            }
        },
        Edit::Underflow => rebalance_or_merge(inner, idx, stats),
        Edit::Empty => {
            inner.remove_child(idx);
            match inner.post_edit_outcome() {
                InnerEdit::Ok => Edit::Ok,
                InnerEdit::Underflow => Edit::Underflow,
                InnerEdit::Empty => Edit::Empty,
                InnerEdit::Split(_) => unreachable!(),
            }
        }
    }
}

/// Resolves an underflowing child at `idx` by either merging it with a
/// sibling or transferring slots/entries from a sibling to bring it back
/// to the minimum fill, preferring the left sibling when one exists.
fn rebalance_or_merge(inner: &mut InnerNode, idx: usize, stats: Option<&EditStats>) -> Edit {
    let sibling_idx = if idx > 0 { idx - 1 } else { idx + 1 };
    let left_idx = idx.min(sibling_idx);
    let child_is_left = idx == left_idx;
    let (left_entry, right_entry) = inner.pair_mut(left_idx);

    match (&mut left_entry.1, &mut right_entry.1) {
        (NodeRef::Leaf(left_arc), NodeRef::Leaf(right_arc)) => {
            let left = Arc::make_mut(left_arc);
            let right = Arc::make_mut(right_arc);
            if left.fill() + right.fill() <= B_LEAF {
                debug!("leaf merge: fill {} + {}", left.fill(), right.fill());
                let right_owned = std::mem::replace(right, LeafNode::empty());
                left.merge_from(right_owned);
                left_entry.0 = left.sum();
                bump(stats, |s| &s.leaf_merges);
                inner.remove_child(left_idx + 1);
            } else {
                debug!("leaf rebalance: fill {} / {}", left.fill(), right.fill());
                if child_is_left {
                    left.rebalance_from(right, false);
                } else {
                    right.rebalance_from(left, true);
                }
                left_entry.0 = left.sum();
                right_entry.0 = right.sum();
                bump(stats, |s| &s.leaf_rebalances);
            }
        }
        (NodeRef::Inner(left_arc), NodeRef::Inner(right_arc)) => {
            let left = Arc::make_mut(left_arc);
            let right = Arc::make_mut(right_arc);
            if left.fill() + right.fill() <= crate::limits::B {
                debug!("inner merge: fill {} + {}", left.fill(), right.fill());
                let right_owned = std::mem::replace(right, InnerNode::default());
                left.merge_from(right_owned);
                left_entry.0 = left.sum();
                bump(stats, |s| &s.inner_merges);
                inner.remove_child(left_idx + 1);
            } else {
                debug!("inner rebalance: fill {} / {}", left.fill(), right.fill());
                if child_is_left {
                    left.rebalance_from(right, false);
                } else {
                    right.rebalance_from(left, true);
                }
                left_entry.0 = left.sum();
                right_entry.0 = right.sum();
                bump(stats, |s| &s.inner_rebalances);
            }
        }
        _ => unreachable!("siblings at the same tree level always share a node shape"),
    }

    match inner.post_edit_outcome() {
        InnerEdit::Ok => Edit::Ok,
        InnerEdit::Underflow => Edit::Underflow,
        InnerEdit::Empty => Edit::Empty,
        InnerEdit::Split(_) => unreachable!(),
    }
}
