//! Block: a contiguous, immutable-once-shared byte buffer backing large
//! slots, either heap-owned or a read-only memory mapping of the file a
//! table was loaded from.
//!
//! A block is simply `Arc<Block>`, shared by every slot (and every clone of
//! a table) that references it, and unmapped/deallocated the moment the
//! last `Arc` drops. There is no separate refcount or freelist to manage by
//! hand.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use memmap2::Mmap;

use crate::errors::LoadError;
use crate::limits::HIGH_WATER;

#[derive(Debug)]
enum Bytes {
    Heap(Box<[u8]>),
    Mapped(Mmap),
}

/// An owned byte buffer referenced by one or more large slots.
#[derive(Debug)]
pub(crate) struct Block {
    bytes: Bytes,
}

impl Block {
    /// Creates a heap-owned block holding a private copy of `data`.
    pub(crate) fn new_heap(data: &[u8]) -> Block {
        Block {
            bytes: Bytes::Heap(data.to_vec().into_boxed_slice()),
        }
    }

    /// Opens `path` read-only and memory-maps it.
    ///
    /// Per the load-time size discipline, this is only called for files
    /// larger than [`HIGH_WATER`]; smaller files are read into a private
    /// small slot instead so they are editable in place without holding a
    /// file descriptor open.
    pub(crate) fn new_mapped(path: &Path) -> Result<Block, LoadError> {
        let file = File::open(path).map_err(|source| LoadError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        // Safety: the mapping is read-only and the file is not expected to be
        // truncated concurrently by this process; callers accept the usual
        // mmap caveats around externally-modified files.
        let mmap = unsafe { Mmap::map(&file) }.map_err(|source| LoadError::Map {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Block {
            bytes: Bytes::Mapped(mmap),
        })
    }

    pub(crate) fn as_slice(&self) -> &[u8] {
        match &self.bytes {
            Bytes::Heap(b) => b,
            Bytes::Mapped(m) => m,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.as_slice().len()
    }
}

/// Reads `path`'s metadata and contents, choosing a small private buffer for
/// files at or below [`HIGH_WATER`] and a memory mapping otherwise.
///
/// Returns `Ok(None)` only in the sense that this function never returns
/// "empty but valid"; an empty file is represented by a zero-length small
/// buffer, matching an empty table.
pub(crate) enum LoadedContent {
    Small(Vec<u8>),
    Large(Block),
}

pub(crate) fn load_file(path: &Path) -> Result<LoadedContent, LoadError> {
    let metadata = std::fs::metadata(path).map_err(|source| LoadError::Stat {
        path: path.to_path_buf(),
        source,
    })?;
    let len = metadata.len();
    if len as u128 <= HIGH_WATER as u128 {
        let mut file = File::open(path).map_err(|source| LoadError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        let mut buf = Vec::with_capacity(HIGH_WATER);
        file.read_to_end(&mut buf).map_err(|source| LoadError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(LoadedContent::Small(buf))
    } else {
        Block::new_mapped(path).map(LoadedContent::Large)
    }
}
