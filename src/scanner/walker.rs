//! Directory walker implementation using walkdir.
//!
//! # Overview
//!
//! This module provides the [`Walker`] struct which enumerates every
//! regular file under a root directory. Traversal is single-threaded and
//! lazy: entries are produced on demand so the orchestrator can feed them
//! straight into its work queue. Children of each directory are visited in
//! file-name order, which makes discovery order deterministic for a given
//! tree.
//!
//! # Features
//!
//! - Root validation up front (missing or unreadable roots are fatal)
//! - Per-entry errors are yielded, never abort the walk
//! - Each underlying file is yielded at most once (hardlinks, symlink aliases)
//! - Symlink cycles are reported instead of followed
//! - Graceful shutdown via atomic flag
//!
//! # Example
//!
//! ```no_run
//! use dupsweep::scanner::{Walker, WalkerConfig};
//! use std::path::Path;
//!
//! let walker = Walker::new(Path::new("/home/user/Downloads"), WalkerConfig::default());
//! let files: Vec<_> = walker.walk().unwrap().filter_map(Result::ok).collect();
//! println!("Found {} files, skipped {}", files.len(), walker.skipped_count());
//! ```

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use walkdir::{DirEntry, WalkDir};

use super::identity::VisitedFiles;
use super::{ScanError, WalkEntry, WalkerConfig};

/// Directory walker for sequential file discovery.
#[derive(Debug)]
pub struct Walker {
    /// Root path to walk
    root: PathBuf,
    /// Walker configuration
    config: WalkerConfig,
    /// Optional shutdown flag for graceful termination
    shutdown_flag: Option<Arc<AtomicBool>>,
    /// Entries that were neither yielded nor errors
    skipped: AtomicUsize,
}

impl Walker {
    /// Create a new walker for the given path.
    ///
    /// # Arguments
    ///
    /// * `path` - Root directory to scan
    /// * `config` - Walker configuration options
    #[must_use]
    pub fn new(path: &Path, config: WalkerConfig) -> Self {
        Self {
            root: path.to_path_buf(),
            config,
            shutdown_flag: None,
            skipped: AtomicUsize::new(0),
        }
    }

    /// Set the shutdown flag for graceful termination.
    ///
    /// When the flag is set to `true`, the walker stops producing entries.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Check if shutdown has been requested.
    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    /// Number of entries skipped so far: symlinks (when not followed),
    /// non-regular files, and aliases of files already yielded.
    #[must_use]
    pub fn skipped_count(&self) -> usize {
        self.skipped.load(Ordering::Relaxed)
    }

    /// Validate the root and return its canonical absolute form.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`, `NotADirectory` or `PermissionDenied` when the
    /// root cannot be walked at all.
    pub fn validate_root(&self) -> Result<PathBuf, ScanError> {
        let metadata =
            std::fs::metadata(&self.root).map_err(|e| ScanError::from_io(&self.root, e))?;
        if !metadata.is_dir() {
            return Err(ScanError::NotADirectory(self.root.clone()));
        }

        // Opening the directory is the only reliable readability check.
        std::fs::read_dir(&self.root).map_err(|e| ScanError::from_io(&self.root, e))?;

        std::fs::canonicalize(&self.root).map_err(|e| ScanError::from_io(&self.root, e))
    }

    /// Walk the directory tree, yielding regular files.
    ///
    /// Every call performs a fresh traversal. Per-entry failures are
    /// yielded as `Err` items and the walk continues past them.
    ///
    /// # Errors
    ///
    /// Returns an error before yielding anything if the root is missing,
    /// not a directory, or unreadable.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use dupsweep::scanner::{Walker, WalkerConfig};
    /// use std::path::Path;
    ///
    /// let walker = Walker::new(Path::new("."), WalkerConfig::default());
    /// for entry in walker.walk()? {
    ///     if let Ok(file) = entry {
    ///         println!("{}", file.path.display());
    ///     }
    /// }
    /// # Ok::<(), dupsweep::scanner::ScanError>(())
    /// ```
    pub fn walk(
        &self,
    ) -> Result<impl Iterator<Item = Result<WalkEntry, ScanError>> + '_, ScanError> {
        let root = self.validate_root()?;
        self.skipped.store(0, Ordering::Relaxed);
        let mut visited = VisitedFiles::new();

        log::debug!(
            "Walking {} (follow_symlinks={})",
            root.display(),
            self.config.follow_symlinks
        );

        let iter = WalkDir::new(&root)
            .follow_links(self.config.follow_symlinks)
            .sort_by_file_name()
            .into_iter()
            .take_while(move |_| {
                if self.is_shutdown_requested() {
                    log::debug!("Walker: Shutdown requested, stopping iteration");
                    false
                } else {
                    true
                }
            })
            .filter_map(move |result| match result {
                Ok(entry) => self.process_entry(entry, &mut visited),
                Err(e) => Some(Err(self.handle_walkdir_error(&root, e))),
            });

        Ok(iter)
    }

    /// Turn a directory entry into a yielded file, a skip, or an error.
    fn process_entry(
        &self,
        entry: DirEntry,
        visited: &mut VisitedFiles,
    ) -> Option<Result<WalkEntry, ScanError>> {
        if entry.depth() == 0 {
            return None;
        }

        let file_type = entry.file_type();
        if file_type.is_dir() {
            return None;
        }

        if file_type.is_symlink() {
            // Only reachable when links are not followed.
            log::trace!("Skipping symlink: {}", entry.path().display());
            self.skip();
            return None;
        }

        if !file_type.is_file() {
            log::debug!("Skipping non-regular file: {}", entry.path().display());
            self.skip();
            return None;
        }

        let metadata = match entry.metadata() {
            Ok(m) => m,
            Err(e) => return Some(Err(self.handle_walkdir_error(entry.path(), e))),
        };

        if !visited.first_visit(entry.path(), &metadata) {
            log::debug!(
                "Skipping alias of an already visited file: {}",
                entry.path().display()
            );
            self.skip();
            return None;
        }

        Some(Ok(WalkEntry::new(entry.into_path(), metadata.len())))
    }

    fn skip(&self) {
        self.skipped.fetch_add(1, Ordering::Relaxed);
    }

    /// Convert a walkdir error to a [`ScanError`] and log it once.
    fn handle_walkdir_error(&self, fallback: &Path, error: walkdir::Error) -> ScanError {
        let path = error
            .path()
            .map_or_else(|| fallback.to_path_buf(), Path::to_path_buf);

        let ancestor = error.loop_ancestor().map(Path::to_path_buf);
        let scan_error = if let Some(ancestor) = ancestor {
            ScanError::SymlinkLoop {
                path: path.clone(),
                ancestor,
            }
        } else {
            match error.into_io_error() {
                Some(io) => ScanError::from_io(&path, io),
                None => ScanError::Io {
                    path: path.clone(),
                    source: Arc::new(std::io::Error::other("walk error")),
                },
            }
        };

        log::warn!("Error walking {}: {}", path.display(), scan_error);
        scan_error
    }
}
