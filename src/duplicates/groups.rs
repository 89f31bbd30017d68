//! File records, duplicate groups and the finalized scan result.
//!
//! # Overview
//!
//! A [`FileRecord`] is created once a walked file has been fingerprinted.
//! Records sharing a digest form a [`DuplicateGroup`], ordered by discovery
//! so the first record is the canonical copy that resolution keeps. The
//! [`ScanResult`] carries every group with two or more members plus the
//! per-run counters.
//!
//! # Example
//!
//! ```
//! use dupsweep::duplicates::{DuplicateGroup, FileRecord};
//! use std::path::PathBuf;
//!
//! let digest = *blake3::hash(b"hello").as_bytes();
//! let group = DuplicateGroup::new(
//!     digest,
//!     vec![
//!         FileRecord::new(PathBuf::from("/a.txt"), 5, digest, 0),
//!         FileRecord::new(PathBuf::from("/b.txt"), 5, digest, 1),
//!     ],
//! );
//!
//! assert_eq!(group.canonical().path, PathBuf::from("/a.txt"));
//! assert_eq!(group.duplicate_count(), 1);
//! assert_eq!(group.wasted_space(), 5);
//! ```

use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;

use crate::scanner::{hash_to_hex, Hash, ScanError};

/// A fingerprinted file. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileRecord {
    /// Absolute path to the file
    pub path: PathBuf,
    /// File size in bytes
    pub size: u64,
    /// BLAKE3 digest of the content
    #[serde(serialize_with = "serialize_hash")]
    pub digest: Hash,
    /// Sequence number issued when the walker yielded the file
    pub discovered_order: u64,
}

impl FileRecord {
    /// Create a new record.
    #[must_use]
    pub fn new(path: PathBuf, size: u64, digest: Hash, discovered_order: u64) -> Self {
        Self {
            path,
            size,
            digest,
            discovered_order,
        }
    }
}

fn serialize_hash<S: serde::Serializer>(hash: &Hash, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&hash_to_hex(hash))
}

/// Files sharing one digest, ordered by discovery.
#[derive(Debug, Clone, Serialize)]
pub struct DuplicateGroup {
    /// BLAKE3 digest shared by every record
    #[serde(serialize_with = "serialize_hash")]
    pub digest: Hash,
    /// Size of the content in bytes
    pub size: u64,
    /// Records, first-discovered first
    pub records: Vec<FileRecord>,
}

impl DuplicateGroup {
    /// Create a group. Records are sorted by discovery order.
    ///
    /// # Panics
    ///
    /// Debug assertion fails if a record carries a different digest.
    #[must_use]
    pub fn new(digest: Hash, mut records: Vec<FileRecord>) -> Self {
        debug_assert!(records.iter().all(|r| r.digest == digest));
        records.sort_by_key(|r| r.discovered_order);
        let size = records.first().map_or(0, |r| r.size);
        Self {
            digest,
            size,
            records,
        }
    }

    /// Number of files in this group.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if this group is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Whether the group holds actual duplicates (2+ files).
    #[must_use]
    pub fn is_duplicate(&self) -> bool {
        self.records.len() > 1
    }

    /// The record that resolution keeps.
    ///
    /// # Panics
    ///
    /// Panics if the group is empty; finalized groups never are.
    #[must_use]
    pub fn canonical(&self) -> &FileRecord {
        &self.records[0]
    }

    /// The records that resolution acts upon.
    #[must_use]
    pub fn duplicates(&self) -> &[FileRecord] {
        self.records.get(1..).unwrap_or(&[])
    }

    /// Number of duplicate copies (total - 1 canonical).
    #[must_use]
    pub fn duplicate_count(&self) -> usize {
        self.records.len().saturating_sub(1)
    }

    /// Bytes held by the non-canonical copies.
    #[must_use]
    pub fn wasted_space(&self) -> u64 {
        self.duplicates().iter().map(|r| r.size).sum()
    }

    /// Digest as hexadecimal string.
    #[must_use]
    pub fn digest_hex(&self) -> String {
        hash_to_hex(&self.digest)
    }
}

/// Counters gathered while walking and hashing.
#[derive(Debug, Clone, Default)]
pub struct ScanStats {
    /// Files successfully fingerprinted
    pub files_scanned: usize,
    /// Bytes fingerprinted
    pub bytes_scanned: u64,
    /// Entries skipped by the walker (symlinks, special files, aliases)
    pub files_skipped: usize,
    /// Walk and hash failures, one per logged error
    pub errors: Vec<ScanError>,
    /// Wall-clock time of the scan phase
    pub scan_duration: Duration,
}

/// The finalized outcome of a scan: every duplicate group plus counters.
#[derive(Debug, Clone, Default)]
pub struct ScanResult {
    /// Groups with two or more files, most members first then by digest
    pub groups: Vec<DuplicateGroup>,
    /// Files successfully fingerprinted
    pub files_scanned: usize,
    /// Bytes fingerprinted
    pub bytes_scanned: u64,
    /// Entries skipped by the walker
    pub files_skipped: usize,
    /// Walk and hash failures
    pub errors: Vec<ScanError>,
    /// Wall-clock time of the scan phase
    pub scan_duration: Duration,
}

impl ScanResult {
    /// Assemble a result from finalized groups and scan counters.
    #[must_use]
    pub fn new(groups: Vec<DuplicateGroup>, stats: ScanStats) -> Self {
        Self {
            groups,
            files_scanned: stats.files_scanned,
            bytes_scanned: stats.bytes_scanned,
            files_skipped: stats.files_skipped,
            errors: stats.errors,
            scan_duration: stats.scan_duration,
        }
    }

    /// Number of duplicate groups.
    #[must_use]
    pub fn duplicate_groups(&self) -> usize {
        self.groups.len()
    }

    /// Number of non-canonical files across all groups.
    #[must_use]
    pub fn duplicate_files(&self) -> usize {
        self.groups.iter().map(DuplicateGroup::duplicate_count).sum()
    }

    /// Bytes that resolving every group would reclaim.
    #[must_use]
    pub fn reclaimable_space(&self) -> u64 {
        self.groups.iter().map(DuplicateGroup::wasted_space).sum()
    }

    /// Number of files that failed during walking or hashing.
    #[must_use]
    pub fn files_errored(&self) -> usize {
        self.errors.len()
    }
}
