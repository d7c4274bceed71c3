//! Slots: the `(span, data)` entries stored in a leaf.

use std::sync::Arc;

use crate::block::Block;
use crate::limits::HIGH_WATER;

/// A private, in-place-editable buffer owned exclusively by one leaf slot.
///
/// Capacity is reserved up to [`HIGH_WATER`] up front so that the common
/// case — repeated small inserts coalescing into the same slot, the way a
/// text editor's typing session does — never reallocates until the slot
/// actually needs to become a large slot.
#[derive(Clone, Debug, Default)]
pub(crate) struct SmallBuf(Vec<u8>);

impl SmallBuf {
    fn with_capacity_hint(initial: &[u8]) -> Self {
        let mut buf = Vec::with_capacity(HIGH_WATER.max(initial.len()));
        buf.extend_from_slice(initial);
        SmallBuf(buf)
    }

    pub(crate) fn span(&self) -> usize {
        self.0.len()
    }

    pub(crate) fn as_slice(&self) -> &[u8] {
        &self.0
    }

    pub(crate) fn splice_insert(&mut self, at: usize, data: &[u8]) {
        self.0.splice(at..at, data.iter().copied());
    }

    pub(crate) fn remove_range(&mut self, range: std::ops::Range<usize>) {
        self.0.drain(range);
    }
}

/// A reference into a shared, immutable [`Block`].
#[derive(Clone, Debug)]
pub(crate) struct LargeRef {
    block: Arc<Block>,
    offset: usize,
    span: usize,
}

impl LargeRef {
    pub(crate) fn as_slice(&self) -> &[u8] {
        &self.block.as_slice()[self.offset..self.offset + self.span]
    }

    pub(crate) fn span(&self) -> usize {
        self.span
    }

    /// Drops the first `n` bytes without reallocating.
    fn truncate_front(&mut self, n: usize) {
        self.offset += n;
        self.span -= n;
    }

    /// Drops the last `n` bytes without reallocating.
    fn truncate_back(&mut self, n: usize) {
        self.span -= n;
    }
}

/// A leaf entry: either a small, privately owned, in-place-editable buffer,
/// or a reference into a shared immutable block.
#[derive(Clone, Debug)]
pub(crate) enum Slot {
    Small(SmallBuf),
    Large(LargeRef),
}

impl Slot {
    pub(crate) fn new_small(data: &[u8]) -> Slot {
        debug_assert!(data.len() <= HIGH_WATER);
        Slot::Small(SmallBuf::with_capacity_hint(data))
    }

    pub(crate) fn new_large(block: Arc<Block>, offset: usize, span: usize) -> Slot {
        debug_assert!(span > 0);
        Slot::Large(LargeRef {
            block,
            offset,
            span,
        })
    }

    pub(crate) fn span(&self) -> usize {
        match self {
            Slot::Small(b) => b.span(),
            Slot::Large(r) => r.span(),
        }
    }

    pub(crate) fn is_small(&self) -> bool {
        matches!(self, Slot::Small(_))
    }

    pub(crate) fn as_slice(&self) -> &[u8] {
        match self {
            Slot::Small(b) => b.as_slice(),
            Slot::Large(r) => r.as_slice(),
        }
    }

    /// Whether this slot can absorb `extra` more bytes in place.
    pub(crate) fn can_grow_by(&self, extra: usize) -> bool {
        matches!(self, Slot::Small(b) if b.span() + extra <= HIGH_WATER)
    }

    /// Splices `data` into this slot at byte offset `at`. Only valid for a
    /// small slot that `can_grow_by(data.len())`.
    pub(crate) fn splice_insert(&mut self, at: usize, data: &[u8]) {
        match self {
            Slot::Small(b) => b.splice_insert(at, data),
            Slot::Large(_) => unreachable!("splice_insert called on a large slot"),
        }
    }

    /// Shrinks this slot by removing `[from, from+len)` of its byte range.
    /// For a large slot, `from` must be 0 or `from+len` must equal the span
    /// (interior removal from a large slot must go through `split_out`).
    pub(crate) fn shrink(&mut self, from: usize, len: usize) {
        match self {
            Slot::Small(b) => b.remove_range(from..from + len),
            Slot::Large(r) => {
                if from == 0 {
                    r.truncate_front(len);
                } else {
                    debug_assert_eq!(from + len, r.span());
                    r.truncate_back(len);
                }
            }
        }
    }

    /// Splits this slot at `[from, from+len)`, returning the prefix and
    /// suffix around the removed middle (each possibly absent, when the
    /// excluded range touches an edge). For a large slot, a prefix/suffix
    /// that is still bigger than [`HIGH_WATER`] remains a cheap reference
    /// into the same backing block; one that has shrunk to small is copied
    /// out into a private small buffer so a later adjacent insert can
    /// coalesce into it, per the size discipline. A small slot's prefix and
    /// suffix are always materialized as private small buffers directly.
    pub(crate) fn split_out(&self, from: usize, len: usize) -> (Option<Slot>, Option<Slot>) {
        match self {
            Slot::Large(r) => {
                let prefix = if from > 0 {
                    Some(Self::shrink_to_fit(r.block.clone(), r.offset, from))
                } else {
                    None
                };
                let suffix_start = from + len;
                let suffix = if suffix_start < r.span() {
                    Some(Self::shrink_to_fit(
                        r.block.clone(),
                        r.offset + suffix_start,
                        r.span() - suffix_start,
                    ))
                } else {
                    None
                };
                (prefix, suffix)
            }
            Slot::Small(b) => {
                let bytes = b.as_slice();
                let prefix = if from > 0 {
                    Some(Slot::new_small(&bytes[..from]))
                } else {
                    None
                };
                let suffix_start = from + len;
                let suffix = if suffix_start < bytes.len() {
                    Some(Slot::new_small(&bytes[suffix_start..]))
                } else {
                    None
                };
                (prefix, suffix)
            }
        }
    }

    fn shrink_to_fit(block: Arc<Block>, offset: usize, span: usize) -> Slot {
        if span <= HIGH_WATER {
            Slot::new_small(&block.as_slice()[offset..offset + span])
        } else {
            Slot::new_large(block, offset, span)
        }
    }

    /// Builds the most natural slot representation for a standalone byte
    /// range: small if it fits, otherwise a private heap block of its own.
    pub(crate) fn materialize(bytes: &[u8]) -> Slot {
        if bytes.len() <= HIGH_WATER {
            Slot::new_small(bytes)
        } else {
            Slot::new_large(Arc::new(Block::new_heap(bytes)), 0, bytes.len())
        }
    }
}
