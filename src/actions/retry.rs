//! Bounded immediate retry for single file actions.

use std::fmt::Display;

/// Default number of attempts per file action.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Retry configuration for file actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryConfig {
    /// Maximum number of attempts, at least 1
    pub max_attempts: u32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_RETRIES)
    }
}

/// Progress of one retried action.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetryState {
    /// Attempts made so far (1-based once started)
    pub attempt: u32,
    /// Attempt limit
    pub max_attempts: u32,
    /// Display form of the most recent failure
    pub last_error: Option<String>,
}

impl RetryState {
    fn new(max_attempts: u32) -> Self {
        Self {
            attempt: 0,
            max_attempts,
            last_error: None,
        }
    }

    /// Whether no attempts remain.
    #[must_use]
    pub fn exhausted(&self) -> bool {
        self.attempt >= self.max_attempts
    }
}

impl RetryConfig {
    /// Create a configuration. Values below 1 are clamped to 1.
    #[must_use]
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
        }
    }

    /// Run `op`, re-attempting immediately while `is_retryable` accepts the
    /// error and attempts remain.
    ///
    /// Returns the final result together with the retry state, so callers
    /// can report how many attempts were made.
    pub fn retry<T, E, F, P>(&self, mut op: F, is_retryable: P) -> (Result<T, E>, RetryState)
    where
        E: Display,
        F: FnMut() -> Result<T, E>,
        P: Fn(&E) -> bool,
    {
        let mut state = RetryState::new(self.max_attempts);

        loop {
            state.attempt += 1;
            log::trace!("Retry attempt {} of {}", state.attempt, state.max_attempts);
            match op() {
                Ok(value) => return (Ok(value), state),
                Err(e) => {
                    state.last_error = Some(e.to_string());
                    if !is_retryable(&e) {
                        log::debug!("Error is not retryable, giving up: {}", e);
                        return (Err(e), state);
                    }
                    if state.exhausted() {
                        return (Err(e), state);
                    }
                    log::debug!(
                        "Attempt {}/{} failed: {}; retrying",
                        state.attempt,
                        state.max_attempts,
                        e
                    );
                }
            }
        }
    }
}
