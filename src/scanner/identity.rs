//! Visited-file tracking so the walker yields each underlying file once.
//!
//! # Overview
//!
//! Hardlinks and followed symlinks can expose the same file under several
//! paths. Hashing both would put a file in a duplicate group with itself,
//! and resolving that group would delete or move the only copy of the data.
//! [`VisitedFiles`] remembers the identity of every file already yielded and
//! reports later aliases.
//!
//! # Platform Support
//!
//! - **Unix**: `(device_id, inode)` pairs from file metadata
//! - **Other**: the canonicalized real path of the file

use std::collections::HashSet;
use std::fs::Metadata;
use std::path::{Path, PathBuf};

/// Identity of an underlying file, independent of the path used to reach it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FileIdentity {
    /// Unix device and inode numbers.
    Inode {
        /// Device id
        dev: u64,
        /// Inode number
        ino: u64,
    },
    /// Canonical path, used where inode numbers are unavailable.
    RealPath(PathBuf),
}

impl FileIdentity {
    /// Derive the identity of the file at `path`.
    ///
    /// Returns `None` when no identity can be established (for instance
    /// when canonicalization fails on a platform without inodes); such files
    /// are never treated as aliases.
    #[cfg(unix)]
    #[must_use]
    pub fn of(_path: &Path, metadata: &Metadata) -> Option<Self> {
        use std::os::unix::fs::MetadataExt;
        Some(Self::Inode {
            dev: metadata.dev(),
            ino: metadata.ino(),
        })
    }

    /// Derive the identity of the file at `path`.
    #[cfg(not(unix))]
    #[must_use]
    pub fn of(path: &Path, _metadata: &Metadata) -> Option<Self> {
        std::fs::canonicalize(path).ok().map(Self::RealPath)
    }
}

/// Set of file identities already yielded by a walk.
///
/// Not thread-safe; the walker owns one per traversal.
#[derive(Debug, Default)]
pub struct VisitedFiles {
    seen: HashSet<FileIdentity>,
}

impl VisitedFiles {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a file and report whether this is its first visit.
    ///
    /// Returns `true` the first time an identity is seen and `false` for
    /// every later alias. Files without an identity always return `true`.
    pub fn first_visit(&mut self, path: &Path, metadata: &Metadata) -> bool {
        match FileIdentity::of(path, metadata) {
            Some(identity) => self.seen.insert(identity),
            None => true,
        }
    }

    /// Number of distinct identities recorded.
    #[must_use]
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    /// Whether nothing has been recorded yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}
