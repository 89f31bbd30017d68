//! Concurrent digest index.
//!
//! [`DuplicateIndex`] maps each digest to the records sharing it. It is
//! backed by a sharded [`DashMap`], so inserts for different digests rarely
//! contend and inserts for the same digest are serialized by that shard's
//! lock. Inside a bucket, records are kept sorted by `discovered_order`:
//! the canonical member is the first file the walker produced, whichever
//! worker happened to finish hashing it.

use std::sync::atomic::{AtomicUsize, Ordering};

use dashmap::DashMap;

use super::groups::{DuplicateGroup, FileRecord, ScanResult, ScanStats};
use crate::scanner::Hash;

/// Thread-safe mapping from digest to discovery-ordered records.
#[derive(Debug, Default)]
pub struct DuplicateIndex {
    buckets: DashMap<Hash, Vec<FileRecord>>,
    records: AtomicUsize,
}

impl DuplicateIndex {
    /// Create an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record. Safe to call from many threads at once.
    pub fn insert(&self, record: FileRecord) {
        let mut bucket = self.buckets.entry(record.digest).or_default();
        let pos = bucket.partition_point(|r| r.discovered_order < record.discovered_order);
        bucket.insert(pos, record);
        self.records.fetch_add(1, Ordering::Relaxed);
    }

    /// Number of distinct digests.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    /// Whether no record has been inserted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Total records inserted.
    #[must_use]
    pub fn record_count(&self) -> usize {
        self.records.load(Ordering::Relaxed)
    }

    /// Consume the index and produce the scan result.
    ///
    /// Must only be called once every insert for the run has completed;
    /// taking `self` by value enforces that no worker still holds it.
    /// Singleton buckets are dropped. Groups are sorted by descending member
    /// count, then ascending digest.
    #[must_use]
    pub fn finalize(self, stats: ScanStats) -> ScanResult {
        let digests = self.buckets.len();
        let mut groups: Vec<DuplicateGroup> = self
            .buckets
            .into_iter()
            .filter(|(_, records)| records.len() > 1)
            .map(|(digest, records)| DuplicateGroup::new(digest, records))
            .collect();

        groups.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.digest.cmp(&b.digest)));

        log::debug!(
            "Index finalized: {} digests, {} duplicate groups",
            digests,
            groups.len()
        );

        ScanResult::new(groups, stats)
    }
}
