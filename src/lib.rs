//! A persistent, copy-on-write B+tree sequence of bytes, built for editable
//! text buffers: O(log n) insert/delete at an arbitrary byte offset, O(1)
//! structural-sharing clone, and a cursor for sequential byte/codepoint/line
//! access without re-walking the tree on every step.
//!
//! The public surface is [`SliceTable`] and [`SliceIter`]. Everything else
//! is the engine underneath: fixed-capacity leaves of small/large slots,
//! fixed-capacity inner nodes of `(span, child)` entries, and a recursive
//! insert/delete descent that keeps both structures within their fill
//! bounds.

mod block;
mod cursor;
mod errors;
mod inner;
mod leaf;
mod limits;
mod node;
mod slot;
mod stats;
mod table;
mod validate;

pub use cursor::{SliceIter, END_OF_TEXT, INVALID_UTF8};
pub use stats::EditStats;
pub use table::SliceTable;

/// Installs `env_logger` as the global logger, honoring `RUST_LOG`. Call
/// once at process startup; a no-op on subsequent calls.
#[cfg(feature = "init_env_logger")]
pub fn init_logging() {
    let _ = env_logger::try_init();
}
