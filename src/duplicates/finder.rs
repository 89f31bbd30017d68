//! Scan orchestration: walk, fingerprint, index, finalize.
//!
//! # Overview
//!
//! [`DuplicateFinder`] drives one scan of a directory tree:
//!
//! 1. **Walk** - the walker runs on the calling thread and pushes each file,
//!    tagged with its discovery sequence number, onto a bounded channel
//! 2. **Hash** - a fixed rayon pool of workers pops files, fingerprints them
//!    and inserts the records into the shared [`DuplicateIndex`]
//! 3. **Finalize** - once the walk is exhausted and every worker has drained
//!    the channel, the index is turned into a [`ScanResult`]
//!
//! Per-file failures never stop the scan. Each is logged once where it
//! occurs and collected into [`ScanResult::errors`].
//!
//! # Example
//!
//! ```no_run
//! use dupsweep::duplicates::{DuplicateFinder, FinderConfig};
//! use std::path::Path;
//!
//! let finder = DuplicateFinder::new(FinderConfig::default().with_concurrency(4));
//! let result = finder.find_duplicates(Path::new("/home/user/Downloads"))?;
//! for group in &result.groups {
//!     println!("{} copies of {}", group.len(), group.canonical().path.display());
//! }
//! # Ok::<(), dupsweep::duplicates::FinderError>(())
//! ```

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crossbeam_channel::{Receiver, Sender};

use super::groups::{FileRecord, ScanResult, ScanStats};
use super::index::DuplicateIndex;
use crate::progress::{ProgressCallback, PHASE_SCAN};
use crate::scanner::{Hasher, ScanError, WalkEntry, Walker, WalkerConfig, DEFAULT_BUFFER_SIZE};

/// Files queued per worker before the walker blocks.
const QUEUE_DEPTH_PER_WORKER: usize = 64;

/// Number of workers used when none is configured.
#[must_use]
pub fn default_concurrency() -> usize {
    std::thread::available_parallelism().map_or(4, std::num::NonZeroUsize::get)
}

/// Configuration for a scan.
#[derive(Clone)]
pub struct FinderConfig {
    /// Number of hashing workers (at least 1)
    pub concurrency: usize,
    /// Read buffer size for fingerprinting
    pub buffer_size: usize,
    /// Memory-map large files instead of streaming them
    pub use_mmap: bool,
    /// Walker options
    pub walker: WalkerConfig,
    /// Shutdown flag for graceful termination
    pub shutdown_flag: Option<Arc<AtomicBool>>,
    /// Progress callback
    pub progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl Default for FinderConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            buffer_size: DEFAULT_BUFFER_SIZE,
            use_mmap: false,
            walker: WalkerConfig::default(),
            shutdown_flag: None,
            progress_callback: None,
        }
    }
}

impl std::fmt::Debug for FinderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FinderConfig")
            .field("concurrency", &self.concurrency)
            .field("buffer_size", &self.buffer_size)
            .field("use_mmap", &self.use_mmap)
            .field("walker", &self.walker)
            .field("shutdown_flag", &self.shutdown_flag)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl FinderConfig {
    /// Set the number of hashing workers. Values below 1 are clamped to 1.
    #[must_use]
    pub fn with_concurrency(mut self, workers: usize) -> Self {
        self.concurrency = workers.max(1);
        self
    }

    /// Set the read buffer size.
    #[must_use]
    pub fn with_buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size.max(1);
        self
    }

    /// Enable memory-mapped hashing for large files.
    #[must_use]
    pub fn with_mmap(mut self, enabled: bool) -> Self {
        self.use_mmap = enabled;
        self
    }

    /// Follow symbolic links while walking.
    #[must_use]
    pub fn with_follow_symlinks(mut self, follow: bool) -> Self {
        self.walker.follow_symlinks = follow;
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

    fn queue_capacity(&self) -> usize {
        self.concurrency.max(1) * QUEUE_DEPTH_PER_WORKER
    }
}

/// Errors that end a scan without a result.
#[derive(thiserror::Error, Debug)]
pub enum FinderError {
    /// The scan was interrupted by user (Ctrl+C or shutdown signal).
    #[error("Scan interrupted by user")]
    Interrupted,

    /// The source root is missing, not a directory, or unreadable.
    #[error("Cannot scan source root: {0}")]
    Root(#[source] ScanError),

    /// The review directory lies inside the tree being scanned.
    #[error("Destination {} is inside the source root {}", .destination.display(), .root.display())]
    DestinationInsideSource {
        /// Review directory, resolved to an absolute path
        destination: PathBuf,
        /// Canonical source root
        root: PathBuf,
    },

    /// The hashing pool could not be started.
    #[error("Failed to start worker pool: {0}")]
    WorkerPool(String),
}

/// A walked file waiting to be fingerprinted.
struct Job {
    order: u64,
    entry: WalkEntry,
}

/// What one worker did, merged after the pool joins.
#[derive(Default)]
struct WorkerTally {
    hashed: usize,
    bytes: u64,
    errors: Vec<ScanError>,
}

/// Scan orchestrator.
#[derive(Debug)]
pub struct DuplicateFinder {
    config: FinderConfig,
}

impl DuplicateFinder {
    /// Create a finder with the given configuration.
    #[must_use]
    pub fn new(config: FinderConfig) -> Self {
        Self { config }
    }

    /// Create a finder with default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(FinderConfig::default())
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &FinderConfig {
        &self.config
    }

    fn is_shutdown_requested(&self) -> bool {
        self.config
            .shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    fn build_walker(&self, root: &Path) -> Walker {
        let walker = Walker::new(root, self.config.walker.clone());
        match &self.config.shutdown_flag {
            Some(flag) => walker.with_shutdown_flag(Arc::clone(flag)),
            None => walker,
        }
    }

    fn build_hasher(&self) -> Hasher {
        let hasher = Hasher::new()
            .with_buffer_size(self.config.buffer_size)
            .with_mmap(self.config.use_mmap);
        match &self.config.shutdown_flag {
            Some(flag) => hasher.with_shutdown_flag(Arc::clone(flag)),
            None => hasher,
        }
    }

    /// Scan `root` and group its files by content.
    ///
    /// Blocks until the walk is exhausted and every worker has drained the
    /// queue. Nothing is modified on disk.
    ///
    /// # Errors
    ///
    /// - [`FinderError::Root`] if the root cannot be walked at all
    /// - [`FinderError::Interrupted`] if the shutdown flag was raised
    /// - [`FinderError::WorkerPool`] if the thread pool cannot be built
    pub fn find_duplicates(&self, root: &Path) -> Result<ScanResult, FinderError> {
        let start = Instant::now();
        let concurrency = self.config.concurrency.max(1);

        let walker = self.build_walker(root);
        let entries = walker.walk().map_err(FinderError::Root)?;

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(concurrency)
            .thread_name(|i| format!("dupsweep-hash-{}", i))
            .build()
            .map_err(|e| FinderError::WorkerPool(e.to_string()))?;

        log::info!(
            "Scanning {} with {} worker(s)",
            root.display(),
            concurrency
        );

        let progress = self.config.progress_callback.as_deref();
        if let Some(cb) = progress {
            cb.on_phase_start(PHASE_SCAN, 0);
        }

        let index = DuplicateIndex::new();
        let hasher = self.build_hasher();
        let (job_tx, job_rx) = crossbeam_channel::bounded::<Job>(self.config.queue_capacity());
        let (tally_tx, tally_rx) = crossbeam_channel::unbounded::<WorkerTally>();
        let mut walk_errors = Vec::new();
        let mut dispatched = 0usize;

        // Walker stays on the calling thread; all pool threads hash.
        pool.in_place_scope(|scope| {
            for _ in 0..concurrency {
                let jobs = job_rx.clone();
                let tally = tally_tx.clone();
                let index = &index;
                let hasher = &hasher;
                scope.spawn(move |_| hash_worker(&jobs, &tally, index, hasher, progress));
            }
            drop(job_rx);
            drop(tally_tx);

            dispatch(entries, &job_tx, &mut walk_errors, &mut dispatched, progress);
            drop(job_tx);
        });

        if let Some(cb) = progress {
            cb.on_phase_end(PHASE_SCAN);
        }

        if self.is_shutdown_requested() {
            log::warn!("Scan interrupted after {} file(s)", dispatched);
            return Err(FinderError::Interrupted);
        }

        let mut stats = ScanStats {
            files_skipped: walker.skipped_count(),
            errors: walk_errors,
            ..ScanStats::default()
        };
        let mut hash_errors = Vec::new();
        for tally in tally_rx.try_iter() {
            stats.files_scanned += tally.hashed;
            stats.bytes_scanned += tally.bytes;
            hash_errors.extend(tally.errors);
        }
        hash_errors.sort_by(|a, b| a.path().cmp(b.path()));
        stats.errors.extend(hash_errors);
        stats.scan_duration = start.elapsed();

        let result = index.finalize(stats);

        for group in &result.groups {
            for record in group.duplicates() {
                log::info!("Duplicate found: {}", record.path.display());
            }
        }

        log::info!(
            "Scan complete: {} files, {} duplicate groups, {} errors in {:.2}s",
            result.files_scanned,
            result.duplicate_groups(),
            result.files_errored(),
            result.scan_duration.as_secs_f64()
        );

        Ok(result)
    }
}

/// Feed walked files to the workers, tagging each with its discovery order.
fn dispatch(
    entries: impl Iterator<Item = Result<WalkEntry, ScanError>>,
    jobs: &Sender<Job>,
    walk_errors: &mut Vec<ScanError>,
    dispatched: &mut usize,
    progress: Option<&dyn ProgressCallback>,
) {
    for item in entries {
        match item {
            Ok(entry) => {
                let order = *dispatched as u64;
                *dispatched += 1;
                if let Some(cb) = progress {
                    cb.on_progress(*dispatched, &entry.path.to_string_lossy());
                }
                if jobs.send(Job { order, entry }).is_err() {
                    break;
                }
            }
            // Already logged by the walker.
            Err(e) => walk_errors.push(e),
        }
    }
}

/// Worker loop: fingerprint queued files until the channel closes.
fn hash_worker(
    jobs: &Receiver<Job>,
    tally_tx: &Sender<WorkerTally>,
    index: &DuplicateIndex,
    hasher: &Hasher,
    progress: Option<&dyn ProgressCallback>,
) {
    let mut tally = WorkerTally::default();

    for Job { order, entry } in jobs.iter() {
        // Keep draining so the walker never blocks, but start no new reads.
        if hasher.is_shutdown_requested() {
            continue;
        }

        match hasher.digest(&entry.path) {
            Ok(digest) => {
                log::trace!("Hashed {}", entry.path.display());
                tally.hashed += 1;
                tally.bytes += entry.size;
                if let Some(cb) = progress {
                    cb.on_item_completed(entry.size);
                }
                index.insert(FileRecord::new(entry.path, entry.size, digest, order));
            }
            Err(e) => {
                log::warn!("Error hashing file: {}", e);
                tally.errors.push(ScanError::Hash(e));
            }
        }
    }

    // The receiver outlives the pool scope.
    let _ = tally_tx.send(tally);
}
