//! Layered application configuration.
//!
//! Settings are merged with figment, later layers winning:
//!
//! 1. Built-in defaults
//! 2. TOML file (`--config FILE`, or `config.toml` in the platform config
//!    directory when present)
//! 3. Environment variables prefixed `DUPSWEEP_` (e.g. `DUPSWEEP_CONCURRENCY=8`)
//! 4. Command-line flags
//!
//! ```toml
//! mode = "quarantine"
//! destination = "/home/me/dupes-review"
//! concurrency = 4
//! max_retries = 3
//! collision = "rename"
//! follow_symlinks = false
//! buffer_size = 65536
//! ```

use std::path::{Path, PathBuf};

use bytesize::ByteSize;
use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::{Figment, Provider};
use serde::{Deserialize, Serialize};

use crate::actions::{CollisionPolicy, ResolveMode, DEFAULT_MAX_RETRIES};
use crate::cli::{Cli, ModeArg};
use crate::duplicates::default_concurrency;
use crate::scanner::{DEFAULT_BUFFER_SIZE, MAX_BUFFER_SIZE};

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "DUPSWEEP_";

/// Every key a config file may contain.
pub const CONFIG_KEYS: [&str; 7] = [
    "mode",
    "destination",
    "concurrency",
    "max_retries",
    "collision",
    "follow_symlinks",
    "buffer_size",
];

/// Errors from loading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// An explicitly requested config file does not exist.
    #[error("Config file not found: {0}")]
    FileNotFound(PathBuf),

    /// The config file contains a key dupsweep does not know.
    #[error("Unknown config key '{key}' in {}{}", .file.display(), did_you_mean(.suggestion))]
    UnknownKey {
        /// The offending key
        key: String,
        /// File it was found in
        file: PathBuf,
        /// Closest known key, if any is close
        suggestion: Option<String>,
    },

    /// A value is out of range.
    #[error("Invalid value for '{key}': {reason}")]
    InvalidValue {
        /// Setting name
        key: &'static str,
        /// Why it was rejected
        reason: String,
    },

    /// Quarantine mode without a review directory.
    #[error("Quarantine mode requires a destination (--dest or `destination` in the config file)")]
    MissingDestination,

    /// The layers could not be parsed or merged.
    #[error("Failed to load configuration: {0}")]
    Load(#[from] Box<figment::Error>),
}

fn did_you_mean(suggestion: &Option<String>) -> String {
    suggestion
        .as_ref()
        .map(|s| format!(" (did you mean '{}'?)", s))
        .unwrap_or_default()
}

/// Resolved settings for a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// What to do with duplicates
    pub mode: ModeArg,
    /// Review directory for quarantine mode
    pub destination: Option<PathBuf>,
    /// Hashing workers
    pub concurrency: usize,
    /// Attempts per file action
    pub max_retries: u32,
    /// Name collision handling in quarantine mode
    pub collision: CollisionPolicy,
    /// Follow symbolic links while walking
    pub follow_symlinks: bool,
    /// Read buffer size for hashing, in bytes
    pub buffer_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mode: ModeArg::default(),
            destination: None,
            concurrency: default_concurrency(),
            max_retries: DEFAULT_MAX_RETRIES,
            collision: CollisionPolicy::default(),
            follow_symlinks: false,
            buffer_size: DEFAULT_BUFFER_SIZE,
        }
    }
}

/// Command-line values that override the lower layers. Unset flags are
/// skipped so they do not mask file or environment values.
#[derive(Debug, Default, Serialize)]
pub struct CliOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    mode: Option<ModeArg>,
    #[serde(skip_serializing_if = "Option::is_none")]
    destination: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    concurrency: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_retries: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    collision: Option<CollisionPolicy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    follow_symlinks: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    buffer_size: Option<u64>,
}

impl From<&Cli> for CliOverrides {
    fn from(cli: &Cli) -> Self {
        Self {
            mode: cli.mode,
            destination: cli.destination.clone(),
            concurrency: cli.concurrency,
            max_retries: cli.max_retries,
            collision: cli.collision,
            follow_symlinks: cli.follow_symlinks.then_some(true),
            buffer_size: cli.buffer_size,
        }
    }
}

impl Config {
    /// Platform default location of the config file.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "dupsweep").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Load configuration for a CLI invocation.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if an explicit file is missing, a file has an
    /// unknown key, a value fails to parse, or validation fails.
    pub fn load(cli: &Cli) -> Result<Self, ConfigError> {
        let file = match &cli.config {
            Some(path) if !path.exists() => return Err(ConfigError::FileNotFound(path.clone())),
            Some(path) => Some(path.clone()),
            None => Self::default_path().filter(|p| p.exists()),
        };

        Self::load_layers(file.as_deref(), ENV_PREFIX, &CliOverrides::from(cli))
    }

    /// Merge all layers with an explicit file and environment prefix.
    ///
    /// # Errors
    ///
    /// See [`Config::load`].
    pub fn load_layers(
        file: Option<&Path>,
        env_prefix: &str,
        overrides: &CliOverrides,
    ) -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));

        if let Some(file) = file {
            check_known_keys(file)?;
            log::debug!("Loading config file: {}", file.display());
            figment = figment.merge(Toml::file(file));
        }

        let config: Config = figment
            .merge(Env::prefixed(env_prefix).only(&CONFIG_KEYS))
            .merge(Serialized::defaults(overrides))
            .extract()
            .map_err(Box::new)?;

        config.validate()?;
        Ok(config)
    }

    /// Reject values no run can use.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for zero counts or a zero or
    /// oversized buffer, and [`ConfigError::MissingDestination`] for
    /// quarantine mode without a destination.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let zero = |key| ConfigError::InvalidValue {
            key,
            reason: "must be at least 1".to_string(),
        };
        if self.concurrency == 0 {
            return Err(zero("concurrency"));
        }
        if self.max_retries == 0 {
            return Err(zero("max_retries"));
        }
        if self.buffer_size == 0 {
            return Err(zero("buffer_size"));
        }
        if self.buffer_size > MAX_BUFFER_SIZE {
            return Err(ConfigError::InvalidValue {
                key: "buffer_size",
                reason: format!("must be at most {}", ByteSize(MAX_BUFFER_SIZE as u64)),
            });
        }
        if self.mode == ModeArg::Quarantine && self.destination.is_none() {
            return Err(ConfigError::MissingDestination);
        }
        Ok(())
    }

    /// The resolution mode with its destination attached.
    #[must_use]
    pub fn resolve_mode(&self) -> ResolveMode {
        match (self.mode, &self.destination) {
            (ModeArg::Delete, _) => ResolveMode::Delete,
            (ModeArg::Quarantine, Some(destination)) => ResolveMode::Quarantine {
                destination: destination.clone(),
            },
            // Unreachable after `validate`.
            (ModeArg::Quarantine, None) | (ModeArg::DryRun, _) => ResolveMode::DryRun,
        }
    }
}

/// Fail on keys that would otherwise be silently ignored.
fn check_known_keys(file: &Path) -> Result<(), ConfigError> {
    let data = Toml::file(file).data().map_err(Box::new)?;

    for dict in data.values() {
        for key in dict.keys() {
            if CONFIG_KEYS.contains(&key.as_str()) {
                continue;
            }
            return Err(ConfigError::UnknownKey {
                key: key.clone(),
                file: file.to_path_buf(),
                suggestion: closest_key(key),
            });
        }
    }
    Ok(())
}

/// The known key most similar to `key`, when similar enough to suggest.
fn closest_key(key: &str) -> Option<String> {
    CONFIG_KEYS
        .iter()
        .map(|known| (known, strsim::jaro_winkler(key, known)))
        .filter(|(_, score)| *score > 0.8)
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(known, _)| (*known).to_string())
}
