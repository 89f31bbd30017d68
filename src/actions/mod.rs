//! File actions module.
//!
//! This module provides functionality for:
//! - Idempotent permanent deletion ([`delete`])
//! - Moving duplicates into a review directory ([`quarantine`])
//! - Bounded per-action retry ([`retry`])
//! - Applying an action to every duplicate group ([`resolve`])
//!
//! # Resolution
//!
//! ```no_run
//! use dupsweep::actions::{ResolveConfig, ResolveMode, Resolver};
//! use dupsweep::duplicates::DuplicateFinder;
//! use std::path::{Path, PathBuf};
//!
//! let scan = DuplicateFinder::with_defaults().find_duplicates(Path::new("/data"))?;
//! let resolver = Resolver::new(ResolveConfig::new(ResolveMode::Quarantine {
//!     destination: PathBuf::from("/review"),
//! }));
//! let outcome = resolver.resolve(&scan);
//! println!("moved {} files", outcome.files_moved);
//! # Ok::<(), dupsweep::duplicates::FinderError>(())
//! ```

pub mod delete;
pub mod quarantine;
pub mod resolve;
pub mod retry;

use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;

pub use delete::{delete_if_exists, DeleteOutcome};
pub use quarantine::{move_to_review, target_path, CollisionPolicy, MoveOutcome};
pub use resolve::{
    ActionFailure, FileStatus, ResolveConfig, ResolveMode, ResolveOutcome, Resolver,
};
pub use retry::{RetryConfig, RetryState, DEFAULT_MAX_RETRIES};

/// Errors from a single file action.
#[derive(thiserror::Error, Debug)]
pub enum ActionError {
    /// File was not found (may have been deleted or moved).
    #[error("file not found: {0}")]
    NotFound(PathBuf),

    /// Permission denied when touching the file.
    #[error("permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// The path has no file name to carry into the destination.
    #[error("path has no file name: {0}")]
    InvalidName(PathBuf),

    /// General I/O error.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },
}

impl ActionError {
    /// Build an action error from an I/O error, classifying common kinds.
    #[must_use]
    pub fn from_io(path: &Path, error: io::Error) -> Self {
        match error.kind() {
            io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: error,
            },
        }
    }

    /// Get the path associated with this error.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::NotFound(p) | Self::PermissionDenied(p) | Self::InvalidName(p) => p,
            Self::Io { path, .. } => path,
        }
    }

    /// Whether trying again could change the result.
    ///
    /// A missing source or an unusable name will not fix itself.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::NotFound(_) | Self::InvalidName(_))
    }
}

/// Which operation a failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    /// Permanent deletion of a duplicate
    Delete,
    /// Move of a duplicate into the review directory
    Move,
    /// Check that the kept copy of a group still exists
    Verify,
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Delete => write!(f, "delete"),
            Self::Move => write!(f, "move"),
            Self::Verify => write!(f, "verify"),
        }
    }
}
