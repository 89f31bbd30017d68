//! Progress reporting using indicatif.
//!
//! The [`ProgressCallback`] trait is the seam the finder and resolver report
//! through; [`Progress`] renders it as terminal bars on stderr. Callbacks are
//! invoked from worker threads, so implementations must be `Send + Sync`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use bytesize::ByteSize;
use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};

/// Phase name used while walking and hashing.
pub const PHASE_SCAN: &str = "scanning";
/// Phase name used while acting on duplicate groups.
pub const PHASE_RESOLVE: &str = "resolving";

/// Progress callback for the scan and resolve phases.
pub trait ProgressCallback: Send + Sync {
    /// Called when a phase starts.
    ///
    /// # Arguments
    ///
    /// * `phase` - Name of the phase ([`PHASE_SCAN`] or [`PHASE_RESOLVE`])
    /// * `total` - Total number of items, or 0 when unknown up front
    fn on_phase_start(&self, phase: &str, total: usize);

    /// Called when an item has been dispatched or acted upon.
    ///
    /// # Arguments
    ///
    /// * `current` - Items seen so far in this phase (1-based)
    /// * `path` - Path being processed
    fn on_progress(&self, current: usize, path: &str);

    /// Called when a file has been fingerprinted, with its size.
    fn on_item_completed(&self, _bytes: u64) {}

    /// Called when a phase completes.
    fn on_phase_end(&self, phase: &str);
}

/// Terminal progress reporter.
pub struct Progress {
    multi: MultiProgress,
    scanning: Mutex<Option<ProgressBar>>,
    resolving: Mutex<Option<ProgressBar>>,
    bytes_hashed: AtomicU64,
    quiet: bool,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Progress {
    /// Create a new progress reporter.
    ///
    /// # Arguments
    ///
    /// * `quiet` - If true, nothing is drawn.
    ///
    /// # Examples
    ///
    /// ```
    /// use dupsweep::progress::Progress;
    ///
    /// let progress = Progress::new(true);
    /// assert!(progress.is_quiet());
    /// ```
    #[must_use]
    pub fn new(quiet: bool) -> Self {
        let multi = if quiet {
            MultiProgress::with_draw_target(ProgressDrawTarget::hidden())
        } else {
            MultiProgress::new()
        };
        Self {
            multi,
            scanning: Mutex::new(None),
            resolving: Mutex::new(None),
            bytes_hashed: AtomicU64::new(0),
            quiet,
        }
    }

    /// Whether drawing is suppressed.
    #[must_use]
    pub fn is_quiet(&self) -> bool {
        self.quiet
    }

    fn scanning_style() -> ProgressStyle {
        ProgressStyle::with_template(
            "{spinner:.green} {msg} [{elapsed_precise}] {pos} files, {prefix} hashed",
        )
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
    }

    fn resolving_style() -> ProgressStyle {
        ProgressStyle::with_template(
            "[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█>-")
    }
}

impl ProgressCallback for Progress {
    fn on_phase_start(&self, phase: &str, total: usize) {
        if self.quiet {
            return;
        }

        match phase {
            PHASE_SCAN => {
                let pb = self.multi.add(ProgressBar::new_spinner());
                pb.set_style(Self::scanning_style());
                pb.set_message("Scanning");
                pb.set_prefix(ByteSize(0).to_string());
                self.bytes_hashed.store(0, Ordering::Relaxed);
                pb.enable_steady_tick(Duration::from_millis(100));
                *lock(&self.scanning) = Some(pb);
            }
            PHASE_RESOLVE => {
                let pb = self.multi.add(ProgressBar::new(total as u64));
                pb.set_style(Self::resolving_style());
                pb.set_message("Resolving");
                *lock(&self.resolving) = Some(pb);
            }
            other => log::trace!("Ignoring unknown progress phase: {}", other),
        }
    }

    fn on_progress(&self, current: usize, path: &str) {
        if self.quiet {
            return;
        }

        let message = truncate_path(path, 40);
        if let Some(ref pb) = *lock(&self.resolving) {
            pb.set_position(current as u64);
            pb.set_message(message);
        } else if let Some(ref pb) = *lock(&self.scanning) {
            pb.set_position(current as u64);
            pb.set_message(message);
        }
    }

    fn on_item_completed(&self, bytes: u64) {
        if self.quiet {
            return;
        }
        let total = self.bytes_hashed.fetch_add(bytes, Ordering::Relaxed) + bytes;
        if let Some(ref pb) = *lock(&self.scanning) {
            pb.set_prefix(ByteSize(total).to_string());
        }
    }

    fn on_phase_end(&self, phase: &str) {
        if self.quiet {
            return;
        }

        let (slot, message) = match phase {
            PHASE_SCAN => (&self.scanning, "Scan complete"),
            PHASE_RESOLVE => (&self.resolving, "Resolution complete"),
            _ => return,
        };
        if let Some(pb) = lock(slot).take() {
            pb.finish_and_clear();
            log::debug!("{}", message);
        }
    }
}

/// Truncate a path for display in the progress bar.
fn truncate_path(path: &str, max_len: usize) -> String {
    if path.chars().count() <= max_len {
        return path.to_string();
    }

    let file_name = std::path::Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    let name_len = file_name.chars().count();
    if name_len + 4 > max_len {
        let tail: String = file_name.chars().skip(name_len + 3 - max_len).collect();
        return format!("...{}", tail);
    }

    format!(".../{}", file_name)
}
