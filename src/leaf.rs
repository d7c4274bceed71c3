//! Leaf node: a fixed-capacity array of slots holding the actual bytes of
//! the logical text.

use arrayvec::ArrayVec;

use crate::limits::{B_LEAF, HIGH_WATER, MIN_LEAF_FILL};
use crate::slot::Slot;
use crate::stats::EditStats;

/// Outcome of a structural change to a leaf, reported upward by the engine.
#[derive(Debug)]
pub(crate) enum LeafEdit {
    /// No structural follow-up needed at the parent beyond the span delta.
    Ok,
    /// The leaf overflowed and was split; `.0` is the freshly built right
    /// sibling to be inserted immediately after this leaf in the parent.
    Split(LeafNode),
    /// The leaf's live fill dropped below [`MIN_LEAF_FILL`] (but is still
    /// nonzero); the parent must rebalance or merge it with a sibling.
    Underflow,
    /// The leaf's live fill dropped to zero; the parent must drop it
    /// entirely rather than merge/rebalance.
    Empty,
}

/// A leaf's slots. Live slots are always contiguous from index 0; an
/// `ArrayVec` enforces that structurally, so there is no sentinel span to
/// scan past.
#[derive(Clone, Debug, Default)]
pub(crate) struct LeafNode {
    slots: ArrayVec<Slot, B_LEAF>,
}

impl LeafNode {
    pub(crate) fn empty() -> LeafNode {
        LeafNode {
            slots: ArrayVec::new(),
        }
    }

    /// Builds a leaf directly from an already-assembled slot list (used to
    /// seed a table from a freshly loaded file). Caller guarantees
    /// `slots.len() <= B_LEAF`, which holds trivially for a one-slot or
    /// zero-slot initial leaf.
    pub(crate) fn from_slots(slots: ArrayVec<Slot, B_LEAF>) -> LeafNode {
        LeafNode { slots }
    }

    pub(crate) fn fill(&self) -> usize {
        self.slots.len()
    }

    pub(crate) fn sum(&self) -> usize {
        self.slots.iter().map(Slot::span).sum()
    }

    pub(crate) fn slots(&self) -> &[Slot] {
        &self.slots
    }

    /// Returns the first slot index whose cumulative span covers `pos`, and
    /// the residual offset inside that slot. `pos == sum()` is the one
    /// allowed off-end position, returning `(fill(), 0)`.
    pub(crate) fn offset_of(&self, pos: usize) -> (usize, usize) {
        let mut remaining = pos;
        for (i, slot) in self.slots.iter().enumerate() {
            if remaining < slot.span() {
                return (i, remaining);
            }
            remaining -= slot.span();
        }
        (self.slots.len(), remaining)
    }

    /// Inserts `data` at absolute byte offset `pos` within this leaf.
    /// Returns the leaf's span delta (always `+data.len()`) and the
    /// structural outcome.
    pub(crate) fn insert(&mut self, pos: usize, data: &[u8], stats: Option<&EditStats>) -> LeafEdit {
        if data.is_empty() {
            return LeafEdit::Ok;
        }
        debug_assert!(pos <= self.sum());

        // 1. Empty leaf, inserting at 0: seed a single small slot.
        if self.slots.is_empty() {
            debug_assert_eq!(pos, 0);
            return self.push_data(data);
        }

        let (idx, off) = self.offset_of(pos);

        // 2. pos lands inside a slot that can absorb it in place (this also
        //    covers "pos is at the boundary into the next slot", since
        //    `offset_of` reports a boundary position as offset 0 of the
        //    following slot).
        if idx < self.slots.len() && self.slots[idx].can_grow_by(data.len()) {
            self.slots[idx].splice_insert(off, data);
            return LeafEdit::Ok;
        }

        // 3. pos is exactly at a boundary and the *previous* slot can
        //    absorb an append. This is the common "keep typing at the end
        //    of the document" path and is what gives append its amortized
        //    constant cost.
        if off == 0 && idx > 0 && self.slots[idx - 1].can_grow_by(data.len()) {
            let prev_span = self.slots[idx - 1].span();
            self.slots[idx - 1].splice_insert(prev_span, data);
            return LeafEdit::Ok;
        }

        // 4. Fall back to materializing a fresh slot for the inserted bytes.
        let new_slot = Slot::materialize(data);

        if off == 0 {
            // Exactly at a boundary: insert a whole new slot.
            if self.slots.len() == B_LEAF {
                return self.split_with_pending(idx, vec![new_slot]);
            }
            self.slots.insert(idx, new_slot);
            self.coalesce_around(idx, stats);
            return self.finish_after_growth(stats);
        }

        // Strictly inside an existing slot (small or large) that cannot
        // absorb the insert in place: split it around the insertion point.
        let (prefix, suffix) = self.slots[idx].split_out(off, 0);
        let mut pending = Vec::with_capacity(3);
        if let Some(p) = prefix {
            pending.push(p);
        }
        pending.push(new_slot);
        if let Some(s) = suffix {
            pending.push(s);
        }
        let needed = self.slots.len() - 1 + pending.len();
        if needed > B_LEAF {
            self.slots.remove(idx);
            return self.split_with_pending(idx, pending);
        }
        self.slots.remove(idx);
        for (offset, slot) in pending.into_iter().enumerate() {
            self.slots.insert(idx + offset, slot);
        }
        self.coalesce_around(idx, stats);
        self.finish_after_growth(stats)
    }

    fn push_data(&mut self, data: &[u8]) -> LeafEdit {
        self.slots.push(Slot::materialize(data));
        LeafEdit::Ok
    }

    /// Called after the leaf may have overflowed due to previous logic that
    /// already accounted for capacity; always returns `Ok` here because
    /// overflow is handled by the caller before growing past `B_LEAF`.
    fn finish_after_growth(&mut self, _stats: Option<&EditStats>) -> LeafEdit {
        debug_assert!(self.slots.len() <= B_LEAF);
        LeafEdit::Ok
    }

    /// Splits this leaf (whose live slots plus `pending` exceed capacity)
    /// into two halves at the midpoint, inserting `pending` at `at` first.
    fn split_with_pending(&mut self, at: usize, pending: Vec<Slot>) -> LeafEdit {
        let mut combined: Vec<Slot> = self.slots.drain(..).collect();
        for (i, slot) in pending.into_iter().enumerate() {
            combined.insert(at + i, slot);
        }
        let mid = ((combined.len() + 1) / 2).max(1).min(combined.len() - 1);
        let right: Vec<Slot> = combined.split_off(mid);
        self.slots = combined.into_iter().collect();
        let mut right_leaf = LeafNode {
            slots: right.into_iter().collect(),
        };
        self.coalesce_all();
        right_leaf.coalesce_all();
        LeafEdit::Split(right_leaf)
    }

    /// Runs the no-adjacent-small-slots coalesce pass over the whole leaf.
    /// `B_LEAF` is a small constant, so one linear pass over the whole leaf
    /// is simpler to keep correct than threading a bounded window through
    /// every call site, at the same asymptotic cost.
    pub(crate) fn coalesce_all(&mut self) {
        let mut i = 0;
        while i + 1 < self.slots.len() {
            if self.slots[i].is_small()
                && self.slots[i + 1].is_small()
                && self.slots[i].span() + self.slots[i + 1].span() <= HIGH_WATER
            {
                let next = self.slots.remove(i + 1);
                let span = self.slots[i].span();
                self.slots[i].splice_insert(span, next.as_slice());
            } else {
                i += 1;
            }
        }
    }

    fn coalesce_around(&mut self, _idx: usize, stats: Option<&EditStats>) {
        let before = self.slots.len();
        self.coalesce_all();
        if self.slots.len() < before {
            if let Some(s) = stats {
                EditStats::bump(&s.slot_coalesces);
            }
        }
    }

    /// Deletes `[pos, pos+len)` from this leaf, where the whole range is
    /// guaranteed by the caller to lie within this leaf's current span.
    /// Returns the leaf's span delta (always `-len`, negated) and the
    /// structural outcome.
    pub(crate) fn delete(&mut self, pos: usize, len: usize, stats: Option<&EditStats>) -> LeafEdit {
        if len == 0 {
            return LeafEdit::Ok;
        }
        let (start_idx, start_off) = self.offset_of(pos);
        let (end_idx, end_off) = self.offset_of(pos + len);

        if start_idx == end_idx {
            // Entirely inside one slot.
            let slot = &mut self.slots[start_idx];
            if slot.is_small() || start_off == 0 || end_off == slot.span() {
                slot.shrink(start_off, len);
                if slot.span() == 0 {
                    self.slots.remove(start_idx);
                }
                self.coalesce_around(start_idx, stats);
            } else {
                // Interior removal from a large slot: it splits into a
                // prefix and a suffix, a net +1 slot. If the leaf is
                // already full this overflows capacity, so it must be
                // routed through the same split path insertion uses.
                let (prefix, suffix) = slot.split_out(start_off, len);
                let mut pending = Vec::with_capacity(2);
                if let Some(p) = prefix {
                    pending.push(p);
                }
                if let Some(s) = suffix {
                    pending.push(s);
                }
                let needed = self.slots.len() - 1 + pending.len();
                if needed > B_LEAF {
                    self.slots.remove(start_idx);
                    return self.split_with_pending(start_idx, pending);
                }
                self.slots.remove(start_idx);
                for (offset, slot) in pending.into_iter().enumerate() {
                    self.slots.insert(start_idx + offset, slot);
                }
                self.coalesce_around(start_idx, stats);
            }
        } else {
            // Spans multiple slots: truncate the first and last partial
            // slots, drop everything fully consumed between them.
            if start_off > 0 {
                let first = &mut self.slots[start_idx];
                let first_span = first.span();
                first.shrink(start_off, first_span - start_off);
            }
            let first_drop = if start_off > 0 { start_idx + 1 } else { start_idx };
            let last_keep_from_tail = if end_off > 0 {
                let tail = &mut self.slots[end_idx];
                tail.shrink(0, end_off);
                end_idx
            } else {
                end_idx
            };
            self.slots.drain(first_drop..last_keep_from_tail);
            let junction = first_drop.min(self.slots.len().saturating_sub(1));
            self.coalesce_around(junction, stats);
        }

        self.post_edit_outcome()
    }

    fn post_edit_outcome(&self) -> LeafEdit {
        if self.slots.is_empty() {
            LeafEdit::Empty
        } else if self.slots.len() < MIN_LEAF_FILL {
            LeafEdit::Underflow
        } else {
            LeafEdit::Ok
        }
    }

    /// Appends all of `other`'s slots to this leaf, coalescing across the
    /// boundary. Caller guarantees the combined fill does not exceed
    /// `B_LEAF`, which holds whenever this is invoked as a genuine merge
    /// (the caller checks `fill_i + fill_j <= B_LEAF` first).
    pub(crate) fn merge_from(&mut self, other: LeafNode) {
        debug_assert!(self.slots.len() + other.slots.len() <= B_LEAF);
        let boundary = self.slots.len();
        self.slots.extend(other.slots);
        self.coalesce_around(boundary, None);
    }

    /// Transfers slots from `donor` into `self` (which is underflowing)
    /// until `self` reaches [`MIN_LEAF_FILL`] or `donor` would itself
    /// underflow. `donor_is_left` indicates whether `donor` precedes `self`
    /// in key order, which determines which end slots move from/to.
    ///
    /// Coalescing the transferred slot into an existing neighbor can drop
    /// `self` back below the minimum even after a transfer that looked
    /// sufficient, so fill is re-checked after every coalesce pass and more
    /// slots are pulled if needed.
    pub(crate) fn rebalance_from(&mut self, donor: &mut LeafNode, donor_is_left: bool) {
        loop {
            let mut transferred = false;
            while self.slots.len() < MIN_LEAF_FILL && donor.slots.len() > MIN_LEAF_FILL {
                if donor_is_left {
                    let slot = donor.slots.pop().unwrap();
                    self.slots.insert(0, slot);
                } else {
                    let slot = donor.slots.remove(0);
                    self.slots.push(slot);
                }
                transferred = true;
            }
            self.coalesce_all();
            donor.coalesce_all();
            if self.slots.len() >= MIN_LEAF_FILL || !transferred {
                break;
            }
        }
    }

    /// Concatenates all live slot bytes, left to right.
    pub(crate) fn dump_into(&self, out: &mut Vec<u8>) {
        for slot in &self.slots {
            out.extend_from_slice(slot.as_slice());
        }
    }
}
