//! Resolution of duplicate groups.
//!
//! # Overview
//!
//! [`Resolver`] walks the groups of a finished scan. The first-discovered
//! record of every group is kept; every later record is deleted, moved to
//! a review directory, or only reported, depending on [`ResolveMode`].
//!
//! Each file action runs under the configured [`RetryConfig`]. When the
//! attempts run out the failure is logged once, recorded as an
//! [`ActionFailure`], and resolution moves on to the next file.
//!
//! Before touching a group the resolver checks that its kept copy still
//! exists, so the last copy of some content is never removed.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::Serialize;

use super::delete::{delete_if_exists, DeleteOutcome};
use super::quarantine::{move_to_review, CollisionPolicy};
use super::retry::{RetryConfig, RetryState};
use super::{ActionError, ActionKind};
use crate::duplicates::{DuplicateGroup, FileRecord, ScanResult};
use crate::progress::{ProgressCallback, PHASE_RESOLVE};

/// What happens to non-canonical copies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveMode {
    /// Remove them permanently.
    Delete,
    /// Move them into `destination` for manual review.
    Quarantine {
        /// Review directory, created if absent
        destination: PathBuf,
    },
    /// Log what would happen and touch nothing.
    DryRun,
}

impl ResolveMode {
    /// Short name for logs and reports.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Delete => "delete",
            Self::Quarantine { .. } => "quarantine",
            Self::DryRun => "dry-run",
        }
    }
}

/// Configuration for a [`Resolver`].
#[derive(Clone)]
pub struct ResolveConfig {
    /// Action to apply to duplicates
    pub mode: ResolveMode,
    /// Name collision handling in quarantine mode
    pub collision: CollisionPolicy,
    /// Attempts per file action
    pub retry: RetryConfig,
    /// Shutdown flag, checked between file actions
    pub shutdown_flag: Option<Arc<AtomicBool>>,
    /// Progress callback
    pub progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for ResolveConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolveConfig")
            .field("mode", &self.mode)
            .field("collision", &self.collision)
            .field("retry", &self.retry)
            .field("shutdown_flag", &self.shutdown_flag)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl ResolveConfig {
    /// Create a configuration with default collision and retry policies.
    #[must_use]
    pub fn new(mode: ResolveMode) -> Self {
        Self {
            mode,
            collision: CollisionPolicy::default(),
            retry: RetryConfig::default(),
            shutdown_flag: None,
            progress_callback: None,
        }
    }

    /// Set the collision policy.
    #[must_use]
    pub fn with_collision(mut self, collision: CollisionPolicy) -> Self {
        self.collision = collision;
        self
    }

    /// Set the number of attempts per file action.
    #[must_use]
    pub fn with_max_retries(mut self, attempts: u32) -> Self {
        self.retry = RetryConfig::new(attempts);
        self
    }

    /// Set the shutdown flag.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Set the progress callback.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress_callback = Some(callback);
        self
    }
}

/// A file action that was given up on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionFailure {
    /// File the action targeted
    pub path: PathBuf,
    /// Which action failed
    pub action: ActionKind,
    /// Display form of the last error
    pub error: String,
    /// Attempts made before giving up
    pub attempts: u32,
}

impl ActionFailure {
    fn new(path: &Path, action: ActionKind, error: &ActionError, state: &RetryState) -> Self {
        Self {
            path: path.to_path_buf(),
            action,
            error: error.to_string(),
            attempts: state.attempt,
        }
    }
}

/// Totals from one resolution pass.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ResolveOutcome {
    /// Duplicates removed
    pub files_deleted: usize,
    /// Duplicates moved to the review directory
    pub files_moved: usize,
    /// Duplicates that were already gone
    pub already_absent: usize,
    /// Bytes freed by deletion
    pub bytes_reclaimed: u64,
    /// Bytes moved into the review directory
    pub bytes_moved: u64,
    /// Groups left alone because their kept copy was missing
    pub groups_skipped: usize,
    /// Duplicates that were deleted or moved
    pub acted_on: Vec<PathBuf>,
    /// Duplicates that were already gone
    pub absent: Vec<PathBuf>,
    /// Actions abandoned after retries, plus skipped groups
    pub failures: Vec<ActionFailure>,
    /// Files a dry run would have acted on
    pub planned: Vec<PathBuf>,
    /// Whether the shutdown flag stopped resolution early
    pub interrupted: bool,
}

impl ResolveOutcome {
    /// Number of duplicates that were actually deleted or moved.
    #[must_use]
    pub fn files_acted(&self) -> usize {
        self.files_deleted + self.files_moved
    }

    /// Number of logged resolution errors.
    #[must_use]
    pub fn error_count(&self) -> usize {
        self.failures.len()
    }

    /// What happened to each path resolution reached.
    ///
    /// Paths missing from the map were never touched, either because their
    /// group was skipped or because resolution was interrupted first.
    #[must_use]
    pub fn statuses(&self) -> HashMap<&Path, FileStatus> {
        let mut map = HashMap::new();
        for path in &self.acted_on {
            map.insert(path.as_path(), FileStatus::Acted);
        }
        for path in &self.planned {
            map.insert(path.as_path(), FileStatus::Planned);
        }
        for path in &self.absent {
            map.insert(path.as_path(), FileStatus::AlreadyAbsent);
        }
        for failure in &self.failures {
            map.insert(failure.path.as_path(), FileStatus::Failed);
        }
        map
    }
}

/// Result of resolution for a single path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileStatus {
    /// Deleted or moved
    Acted,
    /// Listed by a dry run
    Planned,
    /// Gone before it could be acted on
    AlreadyAbsent,
    /// Given up on, or a kept copy that could not be verified
    Failed,
}

/// Applies a [`ResolveMode`] to every duplicate group.
#[derive(Debug)]
pub struct Resolver {
    config: ResolveConfig,
}

impl Resolver {
    /// Create a resolver.
    #[must_use]
    pub fn new(config: ResolveConfig) -> Self {
        Self { config }
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &ResolveConfig {
        &self.config
    }

    fn is_shutdown_requested(&self) -> bool {
        self.config
            .shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    /// Keep the first record of every group and act on the rest.
    ///
    /// Per-file failures are recorded in the outcome; this never aborts.
    pub fn resolve(&self, scan: &ScanResult) -> ResolveOutcome {
        let mut outcome = ResolveOutcome::default();
        let progress = self.config.progress_callback.as_deref();
        let total = scan.duplicate_files();

        log::info!(
            "Resolving {} duplicate(s) in {} group(s) [mode: {}]",
            total,
            scan.duplicate_groups(),
            self.config.mode.name()
        );

        if let Some(cb) = progress {
            cb.on_phase_start(PHASE_RESOLVE, total);
        }

        let mut done = 0usize;
        'groups: for group in &scan.groups {
            if !self.kept_copy_present(group, &mut outcome) {
                done += group.duplicate_count();
                continue;
            }

            for record in group.duplicates() {
                if self.is_shutdown_requested() {
                    log::warn!("Resolution interrupted after {} of {} file(s)", done, total);
                    outcome.interrupted = true;
                    break 'groups;
                }

                done += 1;
                if let Some(cb) = progress {
                    cb.on_progress(done, &record.path.to_string_lossy());
                }
                self.act(record, &mut outcome);
            }
        }

        if let Some(cb) = progress {
            cb.on_phase_end(PHASE_RESOLVE);
        }

        log::info!(
            "Resolution complete: {} deleted, {} moved, {} already absent, {} failed",
            outcome.files_deleted,
            outcome.files_moved,
            outcome.already_absent,
            outcome.failures.len()
        );

        outcome
    }

    fn kept_copy_present(&self, group: &DuplicateGroup, outcome: &mut ResolveOutcome) -> bool {
        let Some(kept) = group.records.first() else {
            return false;
        };

        match fs::metadata(&kept.path) {
            Ok(_) => true,
            Err(e) => {
                let error = ActionError::from_io(&kept.path, e);
                log::error!(
                    "Skipping group {}: kept file is unavailable: {}",
                    group.digest_hex(),
                    error
                );
                outcome.groups_skipped += 1;
                outcome.failures.push(ActionFailure {
                    path: kept.path.clone(),
                    action: ActionKind::Verify,
                    error: error.to_string(),
                    attempts: 1,
                });
                false
            }
        }
    }

    fn act(&self, record: &FileRecord, outcome: &mut ResolveOutcome) {
        let path = &record.path;

        match &self.config.mode {
            ResolveMode::DryRun => {
                log::info!("Would act on duplicate: {}", path.display());
                outcome.planned.push(path.clone());
            }
            ResolveMode::Delete => {
                let (result, state) = self
                    .config
                    .retry
                    .retry(|| delete_if_exists(path), ActionError::is_retryable);
                match result {
                    Ok(DeleteOutcome::Deleted { bytes }) => {
                        log::info!("File deleted: {}", path.display());
                        outcome.files_deleted += 1;
                        outcome.bytes_reclaimed += bytes;
                        outcome.acted_on.push(path.clone());
                    }
                    Ok(DeleteOutcome::AlreadyAbsent) => {
                        log::info!("File already absent: {}", path.display());
                        outcome.already_absent += 1;
                        outcome.absent.push(path.clone());
                    }
                    Err(e) => {
                        log::error!(
                            "Error deleting file: {}: {} (after {} attempt(s))",
                            path.display(),
                            e,
                            state.attempt
                        );
                        outcome
                            .failures
                            .push(ActionFailure::new(path, ActionKind::Delete, &e, &state));
                    }
                }
            }
            ResolveMode::Quarantine { destination } => {
                let (result, state) = self.config.retry.retry(
                    || move_to_review(path, destination, self.config.collision),
                    ActionError::is_retryable,
                );
                match result {
                    Ok(moved) => {
                        log::info!("File moved to review directory: {}", path.display());
                        log::debug!("{} -> {}", path.display(), moved.target.display());
                        outcome.files_moved += 1;
                        outcome.bytes_moved += moved.bytes;
                        outcome.acted_on.push(path.clone());
                    }
                    Err(ActionError::NotFound(missing)) if missing == *path => {
                        log::info!("File already absent: {}", path.display());
                        outcome.already_absent += 1;
                        outcome.absent.push(path.clone());
                    }
                    Err(e) => {
                        log::error!(
                            "Error moving file: {}: {} (after {} attempt(s))",
                            path.display(),
                            e,
                            state.attempt
                        );
                        outcome
                            .failures
                            .push(ActionFailure::new(path, ActionKind::Move, &e, &state));
                    }
                }
            }
        }
    }
}
