//! Duplicate detection module.
//!
//! This module provides functionality for:
//! - The concurrent digest index ([`DuplicateIndex`])
//! - Scan orchestration over a worker pool ([`DuplicateFinder`])
//! - Duplicate group and scan result types
//!
//! Detection is exact: two files are duplicates only if their full-content
//! BLAKE3 digests are equal. Nothing is modified on disk here; acting on the
//! groups is the job of [`crate::actions`].

pub mod finder;
pub mod groups;
pub mod index;

pub use finder::{default_concurrency, DuplicateFinder, FinderConfig, FinderError};
pub use groups::{DuplicateGroup, FileRecord, ScanResult, ScanStats};
pub use index::DuplicateIndex;
