//! BLAKE3 file hasher with streaming support.
//!
//! # Overview
//!
//! This module provides the [`Hasher`] struct for computing the content
//! fingerprint of a single file. Content is read in fixed-size chunks and
//! fed to BLAKE3 incrementally, so memory use is bounded by the buffer size
//! regardless of file size. The digest depends only on the bytes, never on
//! where the read boundaries fall.
//!
//! Zero-byte files hash to BLAKE3's empty-input digest and are a valid
//! group key.
//!
//! # Example
//!
//! ```no_run
//! use dupsweep::scanner::{hash_to_hex, Hasher};
//! use std::path::Path;
//!
//! let hasher = Hasher::new();
//! let digest = hasher.digest(Path::new("photo.jpg")).unwrap();
//! println!("{}", hash_to_hex(&digest));
//! ```

use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use memmap2::Mmap;

use super::HashError;

/// A 32-byte BLAKE3 digest.
pub type Hash = [u8; 32];

/// Default read buffer size (64 KiB).
pub const DEFAULT_BUFFER_SIZE: usize = 64 * 1024;

/// Largest accepted read buffer (64 MiB).
pub const MAX_BUFFER_SIZE: usize = 64 * 1024 * 1024;

/// Default size at which memory-mapped hashing kicks in (64 MiB).
pub const DEFAULT_MMAP_THRESHOLD: u64 = 64 * 1024 * 1024;

/// Streaming BLAKE3 file hasher.
#[derive(Debug, Clone)]
pub struct Hasher {
    buffer_size: usize,
    use_mmap: bool,
    mmap_threshold: u64,
    shutdown_flag: Option<Arc<AtomicBool>>,
}

impl Default for Hasher {
    fn default() -> Self {
        Self::new()
    }
}

impl Hasher {
    /// Create a hasher with the default buffer size and mmap disabled.
    #[must_use]
    pub fn new() -> Self {
        Self {
            buffer_size: DEFAULT_BUFFER_SIZE,
            use_mmap: false,
            mmap_threshold: DEFAULT_MMAP_THRESHOLD,
            shutdown_flag: None,
        }
    }

    /// Set the read buffer size, clamped to `1..=MAX_BUFFER_SIZE`.
    #[must_use]
    pub fn with_buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size.clamp(1, MAX_BUFFER_SIZE);
        self
    }

    /// Enable or disable memory-mapped hashing for large files.
    #[must_use]
    pub fn with_mmap(mut self, enabled: bool) -> Self {
        self.use_mmap = enabled;
        self
    }

    /// Minimum file size for memory-mapped hashing.
    #[must_use]
    pub fn with_mmap_threshold(mut self, threshold: u64) -> Self {
        self.mmap_threshold = threshold;
        self
    }

    /// Set the shutdown flag. Hashing of a file already in progress is not
    /// interrupted; the flag is only consulted by callers via
    /// [`is_shutdown_requested`](Self::is_shutdown_requested).
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Check if shutdown has been requested.
    #[must_use]
    pub fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    /// The configured read buffer size.
    #[must_use]
    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    /// Compute the BLAKE3 digest of a file's full content.
    ///
    /// # Errors
    ///
    /// Returns [`HashError`] if the file cannot be opened or a read fails
    /// part way through. Callers treat this as skip-and-log.
    pub fn digest(&self, path: &Path) -> Result<Hash, HashError> {
        let file = File::open(path).map_err(|e| HashError::from_io(path, e))?;

        if self.use_mmap {
            let size = file
                .metadata()
                .map_err(|e| HashError::from_io(path, e))?
                .len();
            if size > 0 && size >= self.mmap_threshold {
                // SAFETY: read-only map, dropped before returning. The file
                // must not be truncated while mapped.
                match unsafe { Mmap::map(&file) } {
                    Ok(mmap) => {
                        log::trace!("Hashing via mmap: {}", path.display());
                        return Ok(*blake3::hash(&mmap).as_bytes());
                    }
                    Err(e) => {
                        log::debug!(
                            "mmap failed for {}, falling back to streaming: {}",
                            path.display(),
                            e
                        );
                    }
                }
            }
        }

        self.digest_reader(path, file)
    }

    /// Stream any reader through BLAKE3 using the configured buffer size.
    fn digest_reader<R: Read>(&self, path: &Path, mut reader: R) -> Result<Hash, HashError> {
        let mut hasher = blake3::Hasher::new();
        let mut buffer = vec![0u8; self.buffer_size];

        loop {
            let n = match reader.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(HashError::from_io(path, e)),
            };
            hasher.update(&buffer[..n]);
        }

        Ok(*hasher.finalize().as_bytes())
    }
}

/// Convert a digest to a lowercase hexadecimal string.
#[must_use]
pub fn hash_to_hex(hash: &Hash) -> String {
    blake3::Hash::from(*hash).to_hex().to_string()
}

/// Parse a 64-character hexadecimal string into a digest.
#[must_use]
pub fn hex_to_hash(hex: &str) -> Option<Hash> {
    blake3::Hash::from_hex(hex).ok().map(|h| *h.as_bytes())
}
