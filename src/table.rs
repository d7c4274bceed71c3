//! The public slice table: a persistent, copy-on-write sequence of bytes
//! edited through the B+tree engine in [`crate::node`].

use std::io;
use std::path::Path;
use std::sync::Arc;

use arrayvec::ArrayVec;
use log::{debug, warn};

use crate::block::{load_file, LoadedContent};
use crate::cursor::SliceIter;
use crate::inner::InnerNode;
use crate::leaf::LeafNode;
use crate::node::{self, Edit, NodeRef};
use crate::slot::Slot;
use crate::stats::EditStats;

/// A persistent, copy-on-write sequence of bytes.
///
/// Cloning a table is O(1): every node it reaches is `Arc`-shared, and a
/// mutation on either the clone or the original only ever materializes the
/// nodes on the path it actually touches (`Arc::make_mut`), leaving
/// everything else shared.
#[derive(Clone, Debug)]
pub struct SliceTable {
    root: NodeRef,
    levels: usize,
    stats: Option<Arc<EditStats>>,
}

impl Default for SliceTable {
    fn default() -> Self {
        Self::new()
    }
}

impl SliceTable {
    /// Creates an empty table.
    pub fn new() -> SliceTable {
        SliceTable {
            root: NodeRef::empty_leaf(),
            levels: 0,
            stats: None,
        }
    }

    /// Attaches a counter set that the engine bumps at every structural
    /// change (splits, merges, rebalances, coalesces). Returns `self` for
    /// chaining at construction time.
    pub fn with_stats(mut self, stats: Arc<EditStats>) -> SliceTable {
        self.stats = Some(stats);
        self
    }

    /// Loads `path`'s contents as the initial content of a new table.
    ///
    /// Files at or below the small/large slot boundary are read into a
    /// private buffer; larger files are memory-mapped and referenced by a
    /// single large slot, deferring the cost of reading them until their
    /// bytes are actually touched. Returns `None` on any I/O failure, with
    /// the underlying cause logged at `warn` level.
    pub fn new_from_file(path: impl AsRef<Path>) -> Option<SliceTable> {
        let path = path.as_ref();
        let content = match load_file(path) {
            Ok(c) => c,
            Err(err) => {
                warn!("slicetree: failed to load {}: {}", path.display(), err);
                return None;
            }
        };
        let mut slots = ArrayVec::new();
        match content {
            LoadedContent::Small(bytes) => {
                debug!("loaded {} as a small slot ({} bytes)", path.display(), bytes.len());
                if !bytes.is_empty() {
                    slots.push(Slot::materialize(&bytes));
                }
            }
            LoadedContent::Large(block) => {
                let span = block.len();
                debug!("loaded {} as a mapped block ({} bytes)", path.display(), span);
                if span > 0 {
                    slots.push(Slot::new_large(Arc::new(block), 0, span));
                }
            }
        }
        Some(SliceTable {
            root: NodeRef::Leaf(Arc::new(LeafNode::from_slots(slots))),
            levels: 0,
            stats: None,
        })
    }

    /// The table's current size in bytes.
    pub fn size(&self) -> usize {
        self.root.sum()
    }

    /// Number of internal tree levels above the leaves (0 when the root
    /// itself is a leaf).
    pub fn depth(&self) -> usize {
        self.levels
    }

    /// Total number of nodes (leaves and inner nodes) reachable from the
    /// root. Intended for diagnostics, not a hot path.
    pub fn node_count(&self) -> usize {
        self.root.node_count()
    }

    /// Inserts `data` at byte offset `pos`. Returns `false` without
    /// modifying the table if `pos > size()`; inserting an empty slice
    /// always succeeds as a no-op.
    pub fn insert(&mut self, pos: usize, data: &[u8]) -> bool {
        if pos > self.size() {
            return false;
        }
        if data.is_empty() {
            return true;
        }
        let stats = self.stats.as_deref();
        let (_, edit) = node::insert(&mut self.root, pos, data, stats);
        self.resolve_root_insert(edit);
        debug_assert!(self.check_invariants());
        true
    }

    fn resolve_root_insert(&mut self, edit: Edit) {
        match edit {
            Edit::Ok => {}
            Edit::Split(sibling, sibling_span) => self.resolve_root_split(sibling, sibling_span),
            Edit::Underflow | Edit::Empty => {
                unreachable!("insert never underflows the root")
            }
        }
    }

    /// Installs a new inner root above the current root and `sibling`,
    /// reported by the engine when the root itself overflowed and split.
    /// Reachable from both insert (ordinary leaf/inner overflow) and delete
    /// (an interior delete on a large slot can split the leaf it lands in).
    fn resolve_root_split(&mut self, sibling: NodeRef, sibling_span: usize) {
        debug!("root split: levels {} -> {}", self.levels, self.levels + 1);
        let left_span = self.root.sum();
        let left = self.root.clone();
        let mut children = ArrayVec::new();
        children.push((left_span, left));
        children.push((sibling_span, sibling));
        self.root = NodeRef::Inner(Arc::new(InnerNode::new(children)));
        self.levels += 1;
        if let Some(s) = &self.stats {
            EditStats::bump(&s.root_splits);
        }
    }

    /// Deletes `len` bytes starting at `pos`. Returns `false` without
    /// modifying the table if `pos + len > size()`; `len == 0` always
    /// succeeds as a no-op.
    pub fn delete(&mut self, pos: usize, len: usize) -> bool {
        if pos.checked_add(len).map_or(true, |end| end > self.size()) {
            return false;
        }
        if len == 0 {
            return true;
        }
        let mut remaining = len;
        while remaining > 0 {
            let stats = self.stats.as_deref();
            let (_, removed, edit) = node::delete(&mut self.root, pos, remaining, stats);
            debug_assert!(removed > 0 && removed <= remaining);
            remaining -= removed;
            self.resolve_root_delete(edit);
        }
        debug_assert!(self.check_invariants());
        true
    }

    fn resolve_root_delete(&mut self, edit: Edit) {
        match edit {
            Edit::Ok => {}
            Edit::Underflow => {
                let collapse = matches!(&self.root, NodeRef::Inner(n) if n.fill() == 1);
                if collapse {
                    if let NodeRef::Inner(n) = &self.root {
                        debug!("root collapse: levels {} -> {}", self.levels, self.levels - 1);
                        self.root = n.child(0).clone();
                        self.levels -= 1;
                        if let Some(s) = &self.stats {
                            EditStats::bump(&s.root_collapses);
                        }
                    }
                }
                // A leaf root, or an inner root with fill >= 2, is exempt
                // from the minimum-fill invariant: there is no sibling left
                // to rebalance or merge with.
            }
            Edit::Empty => {
                let collapse_to_empty = matches!(&self.root, NodeRef::Inner(n) if n.fill() == 0);
                if collapse_to_empty {
                    self.root = NodeRef::empty_leaf();
                    self.levels = 0;
                }
                // An empty leaf root is itself the legitimate empty-table
                // representation; nothing further to do.
            }
            Edit::Split(sibling, sibling_span) => {
                // An interior delete on a large slot can split the leaf it
                // lands in (prefix + suffix), which can in turn overflow an
                // already-full root exactly as an insert-driven split does.
                self.resolve_root_split(sibling, sibling_span)
            }
        }
    }

    /// Writes the table's full content to `writer`, in logical order.
    pub fn dump(&self, writer: &mut impl io::Write) -> io::Result<()> {
        writer.write_all(&self.to_vec())
    }

    /// Materializes the table's full content as a fresh buffer.
    pub fn to_vec(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.size());
        self.root.dump_into(&mut out);
        out
    }

    /// Returns a cursor seeded at byte offset `pos`. `pos == size()` is the
    /// sole valid off-end position.
    pub fn iter_at(&self, pos: usize) -> Option<SliceIter> {
        if pos > self.size() {
            return None;
        }
        Some(SliceIter::seeded_at(&self.root, self.size(), pos))
    }

    /// Returns a cursor seeded at the start of the table.
    pub fn iter(&self) -> SliceIter {
        SliceIter::seeded_at(&self.root, self.size(), 0)
    }

    /// Walks the tree checking every structural invariant (balanced depth,
    /// subtree-span correctness, fill bounds, slot coalescing, zero-span
    /// slots). Used by `debug_assert!` after every mutation, and exposed
    /// publicly so property tests (and callers with their own paranoia) can
    /// call it directly.
    pub fn check_invariants(&self) -> bool {
        crate::validate::check(&self.root, self.levels)
    }
}
