//! Inner node: a fixed-capacity array of `(subtree span, child)` entries.

use arrayvec::ArrayVec;

use crate::limits::{B, MIN_INNER_FILL};
use crate::node::NodeRef;

/// Outcome of a structural change at a child, reported upward through the
/// inner-node level that owns it.
#[derive(Debug)]
pub(crate) enum InnerEdit {
    Ok,
    Split(InnerNode),
    Underflow,
    Empty,
}

#[derive(Clone, Debug, Default)]
pub(crate) struct InnerNode {
    // (subtree span, child) pairs, contiguous from index 0.
    children: ArrayVec<(usize, NodeRef), B>,
}

impl InnerNode {
    pub(crate) fn new(children: ArrayVec<(usize, NodeRef), B>) -> InnerNode {
        InnerNode { children }
    }

    pub(crate) fn fill(&self) -> usize {
        self.children.len()
    }

    pub(crate) fn sum(&self) -> usize {
        self.children.iter().map(|(span, _)| *span).sum()
    }

    pub(crate) fn children(&self) -> &[(usize, NodeRef)] {
        &self.children
    }

    pub(crate) fn child(&self, i: usize) -> &NodeRef {
        &self.children[i].1
    }

    pub(crate) fn child_mut(&mut self, i: usize) -> &mut NodeRef {
        &mut self.children[i].1
    }

    /// Returns mutable access to the adjacent pair of entries at `left_idx`
    /// and `left_idx + 1`, for sibling rebalance/merge operations.
    pub(crate) fn pair_mut(
        &mut self,
        left_idx: usize,
    ) -> (&mut (usize, NodeRef), &mut (usize, NodeRef)) {
        let (a, b) = self.children.split_at_mut(left_idx + 1);
        (&mut a[left_idx], &mut b[0])
    }

    pub(crate) fn span(&self, i: usize) -> usize {
        self.children[i].0
    }

    pub(crate) fn set_span(&mut self, i: usize, span: usize) {
        self.children[i].0 = span;
    }

    pub(crate) fn apply_delta(&mut self, i: usize, delta: isize) {
        let cur = self.children[i].0 as isize;
        self.children[i].0 = (cur + delta) as usize;
    }

    /// Returns the first child index whose cumulative subtree span covers
    /// `pos`, and the residual offset inside that child's range. `pos ==
    /// sum()` is the sole allowed off-end position.
    pub(crate) fn offset_of(&self, pos: usize) -> (usize, usize) {
        let mut remaining = pos;
        for (i, (span, _)) in self.children.iter().enumerate() {
            if remaining < *span {
                return (i, remaining);
            }
            remaining -= span;
        }
        (self.children.len().saturating_sub(1), remaining)
    }

    /// Inserts a new `(span, child)` entry at `i`, splitting this node if it
    /// would overflow capacity.
    pub(crate) fn insert_child(&mut self, i: usize, entry: (usize, NodeRef)) -> InnerEdit {
        if self.children.len() == B {
            return self.split_with_pending(i, entry);
        }
        self.children.insert(i, entry);
        InnerEdit::Ok
    }

    fn split_with_pending(&mut self, at: usize, entry: (usize, NodeRef)) -> InnerEdit {
        let mut combined: Vec<(usize, NodeRef)> = self.children.drain(..).collect();
        combined.insert(at, entry);
        let mid = (combined.len() + 1) / 2;
        let right = combined.split_off(mid);
        self.children = combined.into_iter().collect();
        InnerEdit::Split(InnerNode {
            children: right.into_iter().collect(),
        })
    }

    /// Removes the entry at `i` entirely (used when a child leaf/inner
    /// becomes fully empty, or after absorbing a merged-away sibling).
    pub(crate) fn remove_child(&mut self, i: usize) {
        self.children.remove(i);
    }

    pub(crate) fn post_edit_outcome(&self) -> InnerEdit {
        if self.children.is_empty() {
            InnerEdit::Empty
        } else if self.children.len() < MIN_INNER_FILL {
            InnerEdit::Underflow
        } else {
            InnerEdit::Ok
        }
    }

    /// Appends all of `other`'s entries after this node's own (used for a
    /// genuine merge, where `fill + other.fill <= B` has already been
    /// checked by the caller).
    pub(crate) fn merge_from(&mut self, other: InnerNode) {
        debug_assert!(self.children.len() + other.children.len() <= B);
        self.children.extend(other.children);
    }

    /// Transfers entries from `donor` into `self` until `self` reaches
    /// [`MIN_INNER_FILL`] or `donor` would itself underflow.
    pub(crate) fn rebalance_from(&mut self, donor: &mut InnerNode, donor_is_left: bool) {
        while self.children.len() < MIN_INNER_FILL && donor.children.len() > MIN_INNER_FILL {
            if donor_is_left {
                let entry = donor.children.pop().unwrap();
                self.children.insert(0, entry);
            } else {
                let entry = donor.children.remove(0);
                self.children.push(entry);
            }
        }
    }
}
