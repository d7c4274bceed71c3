//! Error types for the slice tree.
//!
//! Bounds violations are not exceptional: `insert`/`delete`/`iter_new` report
//! them as plain `bool`/`Option` per the public contract. The only place a
//! typed error is useful is loading a table from disk, where the caller may
//! want to know *why* the load failed even though the public API only
//! exposes success/failure as `Option<SliceTable>`.

use std::io;
use std::path::PathBuf;

/// Failure opening, mapping, or reading the file passed to
/// [`crate::SliceTable::new_from_file`].
///
/// This type is intentionally not part of the public API surface: the
/// external interface contract is "null on I/O failure", nothing more. It
/// exists so the failure can be logged with detail before being collapsed to
/// `None`.
#[derive(Debug, thiserror::Error)]
pub(crate) enum LoadError {
    #[error("failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to stat {path}: {source}")]
    Stat {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to map {path}: {source}")]
    Map {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
