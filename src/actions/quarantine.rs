//! Moving duplicates into a review directory.
//!
//! Files keep their original file name inside the destination. When that
//! name is taken, [`CollisionPolicy`] decides between picking a free name
//! (`report-1.pdf`, `report-2.pdf`, ...) and replacing the existing file.
//!
//! Moves are a plain `rename` when source and destination share a
//! filesystem, and copy followed by remove otherwise.

use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::ActionError;

/// What to do when the destination name is already taken.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum CollisionPolicy {
    /// Append `-1`, `-2`, ... before the extension until the name is free.
    #[default]
    Rename,
    /// Replace the existing file.
    Overwrite,
}

impl std::fmt::Display for CollisionPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Rename => write!(f, "rename"),
            Self::Overwrite => write!(f, "overwrite"),
        }
    }
}

/// A completed move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveOutcome {
    /// Where the file now lives
    pub target: PathBuf,
    /// Size of the moved file
    pub bytes: u64,
}

/// Pick the path `source` will be moved to inside `destination`.
///
/// # Errors
///
/// Returns [`ActionError::InvalidName`] when `source` has no file name.
pub fn target_path(
    source: &Path,
    destination: &Path,
    policy: CollisionPolicy,
) -> Result<PathBuf, ActionError> {
    let name = source
        .file_name()
        .ok_or_else(|| ActionError::InvalidName(source.to_path_buf()))?;
    let candidate = destination.join(name);

    if policy == CollisionPolicy::Overwrite || !exists(&candidate) {
        return Ok(candidate);
    }

    let stem = Path::new(name)
        .file_stem()
        .map_or_else(|| name.to_os_string(), |s| s.to_os_string());
    let extension = Path::new(name).extension();

    let mut n: u64 = 1;
    loop {
        let mut numbered = OsString::from(&stem);
        numbered.push(format!("-{}", n));
        if let Some(ext) = extension {
            numbered.push(".");
            numbered.push(ext);
        }
        let candidate = destination.join(&numbered);
        if !exists(&candidate) {
            return Ok(candidate);
        }
        n += 1;
    }
}

/// Whether anything, including a dangling symlink, occupies `path`.
fn exists(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok()
}

/// Move `source` into `destination`, creating the directory if needed.
///
/// # Errors
///
/// Returns [`ActionError`] if the destination cannot be created, the source
/// is missing, or both `rename` and the copy fallback fail. A failed copy
/// fallback leaves the source in place.
pub fn move_to_review(
    source: &Path,
    destination: &Path,
    policy: CollisionPolicy,
) -> Result<MoveOutcome, ActionError> {
    let bytes = fs::symlink_metadata(source)
        .map_err(|e| ActionError::from_io(source, e))?
        .len();

    fs::create_dir_all(destination).map_err(|e| ActionError::from_io(destination, e))?;
    let target = target_path(source, destination, policy)?;

    rename_into(source, &target)?;

    Ok(MoveOutcome { target, bytes })
}

/// Rename `source` to `target`, copying across filesystems.
///
/// `NotFound` names the source only when the source is really gone; a
/// vanished destination directory is reported against `target` and stays
/// retryable.
fn rename_into(source: &Path, target: &Path) -> Result<(), ActionError> {
    match fs::rename(source, target) {
        Ok(()) => Ok(()),
        Err(e) if is_cross_device(&e) => {
            log::debug!(
                "rename across filesystems, copying {} to {}",
                source.display(),
                target.display()
            );
            copy_then_remove(source, target)
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound && exists(source) => {
            Err(ActionError::Io {
                path: target.to_path_buf(),
                source: e,
            })
        }
        Err(e) => Err(ActionError::from_io(source, e)),
    }
}

fn is_cross_device(error: &io::Error) -> bool {
    error.kind() == io::ErrorKind::CrossesDevices
}

fn copy_then_remove(source: &Path, target: &Path) -> Result<(), ActionError> {
    fs::copy(source, target).map_err(|e| {
        let _ = fs::remove_file(target);
        ActionError::from_io(source, e)
    })?;

    if let Err(e) = fs::remove_file(source) {
        // Leave exactly one copy behind.
        let _ = fs::remove_file(target);
        return Err(ActionError::from_io(source, e));
    }
    Ok(())
}
