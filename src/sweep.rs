//! One complete run: scan a tree, then resolve its duplicates.
//!
//! [`run`] is the single entry point used by the command-line front end.
//! Resolution only starts after the scan has finished and the whole index
//! is known.

use std::path::{Component, Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::actions::{
    CollisionPolicy, ResolveConfig, ResolveMode, ResolveOutcome, Resolver, DEFAULT_MAX_RETRIES,
};
use crate::duplicates::{default_concurrency, DuplicateFinder, FinderConfig, FinderError, ScanResult};
use crate::progress::ProgressCallback;
use crate::scanner::{ScanError, DEFAULT_BUFFER_SIZE};

/// Everything needed for one run.
#[derive(Clone)]
pub struct SweepOptions {
    /// Directory to scan
    pub source: PathBuf,
    /// What to do with duplicates
    pub mode: ResolveMode,
    /// Name collision handling in quarantine mode
    pub collision: CollisionPolicy,
    /// Hashing workers
    pub concurrency: usize,
    /// Attempts per file action
    pub max_retries: u32,
    /// Follow symbolic links while walking
    pub follow_symlinks: bool,
    /// Read buffer size for hashing
    pub buffer_size: usize,
    /// Memory-map large files while hashing
    pub use_mmap: bool,
    /// Shared shutdown flag
    pub shutdown_flag: Option<Arc<AtomicBool>>,
    /// Progress callback for both phases
    pub progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for SweepOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SweepOptions")
            .field("source", &self.source)
            .field("mode", &self.mode)
            .field("collision", &self.collision)
            .field("concurrency", &self.concurrency)
            .field("max_retries", &self.max_retries)
            .field("follow_symlinks", &self.follow_symlinks)
            .field("buffer_size", &self.buffer_size)
            .field("use_mmap", &self.use_mmap)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish_non_exhaustive()
    }
}

impl SweepOptions {
    /// Options for `source` with every other setting at its default.
    #[must_use]
    pub fn new(source: impl Into<PathBuf>, mode: ResolveMode) -> Self {
        Self {
            source: source.into(),
            mode,
            collision: CollisionPolicy::default(),
            concurrency: default_concurrency(),
            max_retries: DEFAULT_MAX_RETRIES,
            follow_symlinks: false,
            buffer_size: DEFAULT_BUFFER_SIZE,
            use_mmap: false,
            shutdown_flag: None,
            progress_callback: None,
        }
    }

    fn finder_config(&self) -> FinderConfig {
        let mut config = FinderConfig::default()
            .with_concurrency(self.concurrency)
            .with_buffer_size(self.buffer_size)
            .with_mmap(self.use_mmap)
            .with_follow_symlinks(self.follow_symlinks);
        if let Some(flag) = &self.shutdown_flag {
            config = config.with_shutdown_flag(Arc::clone(flag));
        }
        if let Some(cb) = &self.progress_callback {
            config = config.with_progress_callback(Arc::clone(cb));
        }
        config
    }

    fn resolve_config(&self) -> ResolveConfig {
        let mut config = ResolveConfig::new(self.mode.clone())
            .with_collision(self.collision)
            .with_max_retries(self.max_retries);
        if let Some(flag) = &self.shutdown_flag {
            config = config.with_shutdown_flag(Arc::clone(flag));
        }
        if let Some(cb) = &self.progress_callback {
            config = config.with_progress_callback(Arc::clone(cb));
        }
        config
    }
}

/// Counts reported at the end of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SweepSummary {
    /// Files successfully fingerprinted
    pub files_scanned: usize,
    /// Groups with two or more identical files
    pub duplicate_groups: usize,
    /// Non-canonical files across all groups
    pub duplicate_files: usize,
    /// Duplicates removed
    pub files_deleted: usize,
    /// Duplicates moved to the review directory
    pub files_moved: usize,
    /// Duplicates already gone at resolution time
    pub already_absent: usize,
    /// Logged walk, hash and action errors
    pub errors: usize,
    /// Walker entries skipped (symlinks, special files, aliases)
    pub skipped: usize,
    /// Bytes freed by deletion
    pub bytes_reclaimed: u64,
    /// Bytes a full resolution would free
    pub bytes_reclaimable: u64,
}

/// Result of a complete run.
#[derive(Debug, Clone)]
pub struct SweepReport {
    /// Source root that was scanned, canonicalized
    pub source: PathBuf,
    /// Mode that was applied
    pub mode: ResolveMode,
    /// Scan phase result
    pub scan: ScanResult,
    /// Resolution phase result
    pub resolution: ResolveOutcome,
    /// Wall-clock time of the whole run
    pub duration: Duration,
}

impl SweepReport {
    /// Every recovered error logged during the run.
    #[must_use]
    pub fn error_count(&self) -> usize {
        self.scan.errors.len() + self.resolution.failures.len()
    }

    /// Whether resolution stopped early on shutdown.
    #[must_use]
    pub fn interrupted(&self) -> bool {
        self.resolution.interrupted
    }

    /// Aggregate counts for reporting.
    #[must_use]
    pub fn summary(&self) -> SweepSummary {
        SweepSummary {
            files_scanned: self.scan.files_scanned,
            duplicate_groups: self.scan.duplicate_groups(),
            duplicate_files: self.scan.duplicate_files(),
            files_deleted: self.resolution.files_deleted,
            files_moved: self.resolution.files_moved,
            already_absent: self.resolution.already_absent,
            errors: self.error_count(),
            skipped: self.scan.files_skipped,
            bytes_reclaimed: self.resolution.bytes_reclaimed,
            bytes_reclaimable: self.scan.reclaimable_space(),
        }
    }
}

/// Scan `options.source` and resolve every duplicate group.
///
/// # Errors
///
/// - [`FinderError::Root`] if the source cannot be read
/// - [`FinderError::DestinationInsideSource`] if the review directory lies
///   inside the scanned tree
/// - [`FinderError::Interrupted`] if shutdown was requested during the scan
pub fn run(options: &SweepOptions) -> Result<SweepReport, FinderError> {
    let start = Instant::now();

    let source = std::fs::canonicalize(&options.source)
        .map_err(|e| FinderError::Root(ScanError::from_io(&options.source, e)))?;

    if let ResolveMode::Quarantine { destination } = &options.mode {
        let destination = absolute_destination(destination);
        if destination.starts_with(&source) {
            return Err(FinderError::DestinationInsideSource {
                destination,
                root: source,
            });
        }
    }

    let scan = DuplicateFinder::new(options.finder_config()).find_duplicates(&source)?;
    let resolution = Resolver::new(options.resolve_config()).resolve(&scan);

    let report = SweepReport {
        source,
        mode: options.mode.clone(),
        scan,
        resolution,
        duration: start.elapsed(),
    };

    log::info!(
        "Sweep finished in {:.2}s with {} error(s)",
        report.duration.as_secs_f64(),
        report.error_count()
    );

    Ok(report)
}

/// Absolute, symlink-resolved form of a path that may not exist yet.
///
/// `.` and `..` are folded lexically, then the deepest existing ancestor is
/// canonicalized and the missing tail appended.
fn absolute_destination(path: &Path) -> PathBuf {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir().map_or_else(|_| path.to_path_buf(), |cwd| cwd.join(path))
    };

    let mut normalized = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::ParentDir => {
                normalized.pop();
            }
            Component::CurDir => {}
            other => normalized.push(other),
        }
    }

    let mut existing = normalized.as_path();
    let mut tail = Vec::new();
    loop {
        if let Ok(canonical) = std::fs::canonicalize(existing) {
            return tail.iter().rev().fold(canonical, |acc, name| acc.join(name));
        }
        match (existing.parent(), existing.file_name()) {
            (Some(parent), Some(name)) => {
                tail.push(name);
                existing = parent;
            }
            _ => return normalized.clone(),
        }
    }
}
