//! Permanent deletion of duplicate files.
//!
//! Deletion is idempotent: a file that is already gone is reported as
//! [`DeleteOutcome::AlreadyAbsent`] instead of an error, so running the
//! same sweep twice never fails on the second pass.
//!
//! ```no_run
//! use dupsweep::actions::delete::{delete_if_exists, DeleteOutcome};
//! use std::path::Path;
//!
//! match delete_if_exists(Path::new("/tmp/copy.txt"))? {
//!     DeleteOutcome::Deleted { bytes } => println!("freed {} bytes", bytes),
//!     DeleteOutcome::AlreadyAbsent => println!("nothing to do"),
//! }
//! # Ok::<(), dupsweep::actions::ActionError>(())
//! ```

use std::fs;
use std::io;
use std::path::Path;

use super::ActionError;

/// Result of a successful delete call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// The file was removed.
    Deleted {
        /// Size of the removed file
        bytes: u64,
    },
    /// There was nothing at the path.
    AlreadyAbsent,
}

/// Remove the file at `path` if it exists.
///
/// Symlinks are removed themselves, never their targets.
///
/// # Errors
///
/// Returns [`ActionError`] when the file exists but cannot be removed.
pub fn delete_if_exists(path: &Path) -> Result<DeleteOutcome, ActionError> {
    let bytes = match fs::symlink_metadata(path) {
        Ok(metadata) => metadata.len(),
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(DeleteOutcome::AlreadyAbsent),
        Err(e) => return Err(ActionError::from_io(path, e)),
    };

    match fs::remove_file(path) {
        Ok(()) => Ok(DeleteOutcome::Deleted { bytes }),
        // Removed by someone else between the stat and the unlink.
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(DeleteOutcome::AlreadyAbsent),
        Err(e) => Err(ActionError::from_io(path, e)),
    }
}
