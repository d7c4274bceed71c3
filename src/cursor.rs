//! Cursor: a position-tracking read handle over a slice table, with a fast
//! same-leaf path and a cached root-to-leaf ancestor stack.
//!
//! Because every node a cursor can reach is `Arc`-shared and immutable once
//! installed (mutation always installs a *new* node via `Arc::make_mut`, it
//! never mutates a node another handle can see), a cursor that holds its own
//! `Arc` clones of the path it descended through keeps working correctly
//! even if the table it was seeded from is mutated afterwards — it simply
//! continues to observe the snapshot it was seeded with. This cursor stores
//! the *entire* root-to-leaf path, up to `limits::MAX_TREE_DEPTH`, so there
//! is no shallow-stack fallback branch to re-descend from the root.

use arrayvec::ArrayVec;

use crate::inner::InnerNode;
use crate::leaf::LeafNode;
use crate::limits::MAX_TREE_DEPTH;
use crate::node::NodeRef;
use std::sync::Arc;

/// Sentinel returned by [`SliceIter::byte`] at either end of the table.
pub const END_OF_TEXT: i32 = -1;
/// Sentinel returned by [`SliceIter::codepoint`] on malformed UTF-8.
pub const INVALID_UTF8: i32 = -2;

const UTF8_LEN: [u8; 256] = {
    let mut table = [1u8; 256];
    let mut b = 0x80usize;
    while b < 0xC0 {
        table[b] = 0; // continuation byte, never a valid lead byte
        b += 1;
    }
    while b < 0xE0 {
        table[b] = 2;
        b += 1;
    }
    while b < 0xF0 {
        table[b] = 3;
        b += 1;
    }
    while b < 0xF8 {
        table[b] = 4;
        b += 1;
    }
    while b < 0x100 {
        table[b] = 0; // 0xF8.. is never valid in modern UTF-8
        b += 1;
    }
    table
};

#[derive(Clone)]
struct Ancestor {
    node: Arc<InnerNode>,
    child_index: usize,
}

/// A position-tracking handle into a [`crate::SliceTable`]'s content.
///
/// `pos == size` is the one allowed off-end position (an empty table, or a
/// seek to the very end, both land here with no current leaf slot).
#[derive(Clone)]
pub struct SliceIter {
    ancestors: ArrayVec<Ancestor, MAX_TREE_DEPTH>,
    leaf: Arc<LeafNode>,
    slot_index: usize,
    offset_in_slot: usize,
    pos: usize,
    size: usize,
}

impl SliceIter {
    pub(crate) fn seeded_at(root: &NodeRef, size: usize, pos: usize) -> SliceIter {
        let mut iter = SliceIter {
            ancestors: ArrayVec::new(),
            leaf: Arc::new(LeafNode::empty()),
            slot_index: 0,
            offset_in_slot: 0,
            pos: 0,
            size,
        };
        iter.descend_from(root, pos);
        iter
    }

    fn descend_from(&mut self, root: &NodeRef, pos: usize) {
        self.ancestors.clear();
        let mut node = root;
        let mut remaining = pos;
        loop {
            match node {
                NodeRef::Leaf(l) => {
                    self.leaf = l.clone();
                    break;
                }
                NodeRef::Inner(n) => {
                    let (idx, residual) = n.offset_of(remaining);
                    self.ancestors.push(Ancestor {
                        node: n.clone(),
                        child_index: idx,
                    });
                    node = n.child(idx);
                    remaining = residual;
                }
            }
        }
        self.locate_within_leaf(remaining);
        self.pos = pos;
    }

    fn locate_within_leaf(&mut self, offset_in_leaf: usize) {
        let (idx, off) = self.leaf.offset_of(offset_in_leaf);
        self.slot_index = idx;
        self.offset_in_slot = off;
    }

    /// Root-to-leaf descent to `pos`, resetting all cursor state.
    pub fn seek_to(&mut self, pos: usize) {
        debug_assert!(pos <= self.size);
        if self.ancestors.is_empty() {
            // Single-leaf table: nothing to re-descend through.
            self.locate_within_leaf(pos);
            self.pos = pos;
            return;
        }
        let root_ancestor = self.ancestors[0].clone();
        let root = NodeRef::Inner(root_ancestor.node);
        self.descend_from(&root, pos);
    }

    /// Returns the current slot's bytes and the offset within it the cursor
    /// sits at, or `None` at the off-end position.
    pub fn chunk(&self) -> Option<(&[u8], usize)> {
        let slots = self.leaf.slots();
        slots
            .get(self.slot_index)
            .map(|slot| (slot.as_slice(), self.offset_in_slot))
    }

    /// Absolute byte position of this cursor.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Advances to the next live slot, descending to a sibling leaf via the
    /// ancestor stack if this leaf is exhausted. Returns `false` at the end
    /// of the table (cursor left at the off-end position).
    pub fn next_chunk(&mut self) -> bool {
        if self.slot_index + 1 < self.leaf.fill() {
            self.slot_index += 1;
            self.offset_in_slot = 0;
            return true;
        }
        self.advance_to_sibling_leaf(1)
    }

    /// Advances to the previous live slot. Returns `false` at the start of
    /// the table.
    pub fn prev_chunk(&mut self) -> bool {
        if self.slot_index > 0 {
            self.slot_index -= 1;
            self.offset_in_slot = 0;
            return true;
        }
        self.advance_to_sibling_leaf(usize::MAX)
    }

    /// Moves to the next (`dir == 1`) or previous (`dir == usize::MAX`,
    /// i.e. `-1` as a wrapping step) sibling leaf by walking up the
    /// ancestor stack to the first level with a usable neighbor, then back
    /// down its leftmost/rightmost descendant.
    fn advance_to_sibling_leaf(&mut self, dir: usize) -> bool {
        let forward = dir == 1;
        let mut level = self.ancestors.len();
        while level > 0 {
            level -= 1;
            let ancestor = &mut self.ancestors[level];
            let next_index = if forward {
                ancestor.child_index + 1
            } else if ancestor.child_index == 0 {
                // no neighbor at this level; keep climbing
                continue;
            } else {
                ancestor.child_index - 1
            };
            if forward && next_index >= ancestor.node.fill() {
                continue;
            }
            let node = ancestor.node.clone();
            ancestor.child_index = next_index;
            self.ancestors.truncate(level + 1);
            let mut cur = node.child(next_index).clone();
            loop {
                match cur {
                    NodeRef::Leaf(l) => {
                        self.leaf = l;
                        break;
                    }
                    NodeRef::Inner(n) => {
                        let child_index = if forward { 0 } else { n.fill() - 1 };
                        self.ancestors.push(Ancestor {
                            node: n.clone(),
                            child_index,
                        });
                        cur = n.child(child_index).clone();
                    }
                }
            }
            self.slot_index = if forward { 0 } else { self.leaf.fill() - 1 };
            self.offset_in_slot = 0;
            return true;
        }
        false
    }

    /// Reads the byte at the current position without advancing, or
    /// [`END_OF_TEXT`] at the off-end position.
    pub fn byte(&self) -> i32 {
        match self.chunk() {
            Some((bytes, off)) if off < bytes.len() => bytes[off] as i32,
            _ => END_OF_TEXT,
        }
    }

    /// Advances `n` bytes forward, returning the number of bytes actually
    /// advanced (less than `n` only at the end of the table).
    pub fn next_byte(&mut self, n: usize) -> usize {
        let mut moved = 0;
        while moved < n && self.pos < self.size {
            let (span, off) = match self.chunk() {
                Some((bytes, off)) => (bytes.len(), off),
                None => break,
            };
            if off + 1 < span {
                self.offset_in_slot += 1;
            } else if !self.next_chunk() {
                self.pos += 1;
                moved += 1;
                break;
            }
            self.pos += 1;
            moved += 1;
        }
        moved
    }

    /// Retreats `n` bytes, returning the number of bytes actually retreated.
    pub fn prev_byte(&mut self, n: usize) -> usize {
        let mut moved = 0;
        while moved < n && self.pos > 0 {
            if self.offset_in_slot > 0 {
                self.offset_in_slot -= 1;
            } else {
                self.prev_chunk();
                let span = self.chunk().map(|(b, _)| b.len()).unwrap_or(0);
                self.offset_in_slot = span.saturating_sub(1);
            }
            self.pos -= 1;
            moved += 1;
        }
        moved
    }

    /// Decodes the UTF-8 codepoint starting at the current position.
    /// Invalid or overlong sequences, and any sequence that would straddle
    /// the leaf boundary, report [`INVALID_UTF8`].
    pub fn codepoint(&self) -> i32 {
        let (bytes, off) = match self.chunk() {
            Some(c) => c,
            None => return END_OF_TEXT,
        };
        if off >= bytes.len() {
            return END_OF_TEXT;
        }
        let lead = bytes[off];
        let len = UTF8_LEN[lead as usize] as usize;
        if len == 0 || off + len > bytes.len() {
            return INVALID_UTF8;
        }
        match std::str::from_utf8(&bytes[off..off + len]) {
            Ok(s) => s.chars().next().map(|c| c as i32).unwrap_or(INVALID_UTF8),
            Err(_) => INVALID_UTF8,
        }
    }

    /// Advances `n` codepoints forward, returning the number actually
    /// advanced.
    pub fn next_cp(&mut self, n: usize) -> usize {
        let mut moved = 0;
        while moved < n && self.pos < self.size {
            let (bytes, off) = match self.chunk() {
                Some(c) => c,
                None => break,
            };
            let len = if off < bytes.len() {
                (UTF8_LEN[bytes[off] as usize] as usize).max(1)
            } else {
                1
            };
            if self.next_byte(len) == 0 {
                break;
            }
            moved += 1;
        }
        moved
    }

    /// Retreats `n` codepoints, returning the number actually retreated.
    /// Scans backward for a lead byte, since UTF-8 cannot be decoded
    /// starting from a continuation byte.
    pub fn prev_cp(&mut self, n: usize) -> usize {
        let mut moved = 0;
        while moved < n && self.pos > 0 {
            self.prev_byte(1);
            while self.pos > 0 {
                let b = self.current_raw_byte();
                if (b & 0xC0) != 0x80 {
                    break;
                }
                self.prev_byte(1);
            }
            moved += 1;
        }
        moved
    }

    fn current_raw_byte(&self) -> u8 {
        match self.chunk() {
            Some((bytes, off)) if off < bytes.len() => bytes[off],
            _ => 0,
        }
    }

    /// Advances to just after the `n`th next newline, or to the end of the
    /// table if fewer than `n` remain. Returns the number of newlines
    /// actually crossed.
    pub fn next_line(&mut self, n: usize) -> usize {
        let mut moved = 0;
        while moved < n && self.pos < self.size {
            let (bytes, off) = match self.chunk() {
                Some(c) => c,
                None => break,
            };
            match memchr::memchr(b'\n', &bytes[off..]) {
                Some(rel) => {
                    self.next_byte(rel + 1);
                    moved += 1;
                }
                None => {
                    let remaining_in_chunk = bytes.len() - off;
                    if self.next_byte(remaining_in_chunk.max(1)) == 0 {
                        break;
                    }
                }
            }
        }
        moved
    }

    /// Retreats to just after the `n`th previous newline (i.e. the start of
    /// a line), scanning backward chunk by chunk. Returns the number of
    /// newlines actually crossed.
    pub fn prev_line(&mut self, n: usize) -> usize {
        let mut moved = 0;
        while moved < n && self.pos > 0 {
            let start = self.pos;
            // Step back one byte first so we don't immediately re-find a
            // newline exactly at the cursor's current position.
            self.prev_byte(1);
            loop {
                let (bytes, off) = match self.chunk() {
                    Some(c) => c,
                    None => break,
                };
                match memchr::memrchr(b'\n', &bytes[..=off]) {
                    Some(rel) => {
                        let back = off - rel;
                        self.prev_byte(back);
                        break;
                    }
                    None => {
                        if self.prev_byte(off + 1) == 0 {
                            break;
                        }
                    }
                }
            }
            if self.pos < start {
                moved += 1;
            } else {
                break;
            }
        }
        moved
    }
}
