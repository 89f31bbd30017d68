//! Scanner module for directory traversal and file fingerprinting.
//!
//! This module provides functionality for:
//! - Sorted, single-threaded directory walking using walkdir
//! - Streaming content hashing with BLAKE3
//! - Visited-identity tracking so each underlying file is seen once
//!
//! # Architecture
//!
//! The scanner is divided into submodules:
//! - [`walker`]: Directory traversal and file discovery
//! - [`hasher`]: BLAKE3 file fingerprinting (streaming or mmap)
//! - [`identity`]: `(device, inode)` tracking for hardlinks and symlink aliases
//!
//! # Example
//!
//! ```no_run
//! use dupsweep::scanner::{Walker, WalkerConfig};
//! use std::path::Path;
//!
//! let walker = Walker::new(Path::new("."), WalkerConfig::default());
//! for entry in walker.walk().expect("root must be readable") {
//!     match entry {
//!         Ok(file) => println!("{}: {} bytes", file.path.display(), file.size),
//!         Err(e) => eprintln!("Warning: {}", e),
//!     }
//! }
//! ```

pub mod hasher;
pub mod identity;
pub mod walker;

use std::path::{Path, PathBuf};

// Re-export main types
pub use hasher::{hash_to_hex, hex_to_hash, Hash, Hasher, DEFAULT_BUFFER_SIZE, MAX_BUFFER_SIZE};
pub use walker::Walker;

/// A regular file discovered by the walker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkEntry {
    /// Absolute path to the file
    pub path: PathBuf,
    /// File size in bytes at discovery time
    pub size: u64,
}

impl WalkEntry {
    /// Create a new walk entry.
    #[must_use]
    pub fn new(path: PathBuf, size: u64) -> Self {
        Self { path, size }
    }
}

/// Configuration for directory walking.
#[derive(Debug, Clone, Default)]
pub struct WalkerConfig {
    /// Follow symbolic links during traversal.
    ///
    /// Directory cycles are detected and reported instead of followed, and
    /// a file reached through several links is yielded only once.
    pub follow_symlinks: bool,
}

impl WalkerConfig {
    /// Create a new configuration.
    #[must_use]
    pub fn new(follow_symlinks: bool) -> Self {
        Self { follow_symlinks }
    }
}

/// Errors that can occur during directory scanning.
#[derive(thiserror::Error, Debug, Clone)]
pub enum ScanError {
    /// Permission was denied when accessing a file or directory.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// The specified path was not found.
    #[error("Path not found: {0}")]
    NotFound(PathBuf),

    /// The specified path is not a directory.
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// A followed symlink points back at one of its ancestors.
    #[error("Symlink cycle at {path} (points to ancestor {ancestor})")]
    SymlinkLoop {
        /// The link that closes the cycle
        path: PathBuf,
        /// The ancestor directory it resolves to
        ancestor: PathBuf,
    },

    /// An I/O error occurred while accessing a file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::sync::Arc<std::io::Error>,
    },

    /// A file could not be fingerprinted.
    #[error(transparent)]
    Hash(#[from] HashError),
}

impl ScanError {
    /// Build a scan error from an I/O error, classifying common kinds.
    #[must_use]
    pub fn from_io(path: &Path, error: std::io::Error) -> Self {
        match error.kind() {
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            std::io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: std::sync::Arc::new(error),
            },
        }
    }

    /// The path this error refers to.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::PermissionDenied(p) | Self::NotFound(p) | Self::NotADirectory(p) => p,
            Self::SymlinkLoop { path, .. } | Self::Io { path, .. } => path,
            Self::Hash(e) => e.path(),
        }
    }

    /// Short name of the operation that failed, for log lines and reports.
    #[must_use]
    pub fn operation(&self) -> &'static str {
        match self {
            Self::Hash(_) => "hashing",
            _ => "walking",
        }
    }
}

/// Errors that can occur during file hashing.
#[derive(thiserror::Error, Debug, Clone)]
pub enum HashError {
    /// The specified file was not found.
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    /// Permission was denied when reading the file.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// An I/O error occurred while reading the file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::sync::Arc<std::io::Error>,
    },
}

impl HashError {
    /// Build a hash error from an I/O error, classifying common kinds.
    #[must_use]
    pub fn from_io(path: &Path, error: std::io::Error) -> Self {
        match error.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: std::sync::Arc::new(error),
            },
        }
    }

    /// The path of the file that failed to hash.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::NotFound(p) | Self::PermissionDenied(p) => p,
            Self::Io { path, .. } => path,
        }
    }
}
