//! Command-line interface definitions for dupsweep.
//!
//! The CLI only collects a source path and options. Every option except
//! the global verbosity/color flags is optional here so that unset flags
//! fall through to the config file and environment layers.
//!
//! # Example
//!
//! ```bash
//! # Show what would be removed (default mode)
//! dupsweep ~/Downloads
//!
//! # Move duplicates into a review directory
//! dupsweep ~/Downloads --mode quarantine --dest ~/dupes-review
//!
//! # Delete with 8 hashing workers, JSON report
//! dupsweep ~/Downloads --mode delete -j 8 --output json
//! ```

use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::actions::CollisionPolicy;

/// Find files with identical content and keep one copy of each.
///
/// dupsweep hashes every regular file under SOURCE with BLAKE3, keeps the
/// first-discovered file of every duplicate group, and deletes or moves the
/// rest.
#[derive(Debug, Parser)]
#[command(name = "dupsweep")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, env = "NO_COLOR")]
    pub no_color: bool,

    /// Configuration file (default: platform config dir / config.toml)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Directory to scan for duplicates
    #[arg(value_name = "SOURCE")]
    pub source: PathBuf,

    /// What to do with duplicates [default: dry-run]
    #[arg(short, long, value_enum)]
    pub mode: Option<ModeArg>,

    /// Review directory for quarantine mode (must be outside SOURCE)
    #[arg(short, long = "dest", value_name = "DIR")]
    pub destination: Option<PathBuf>,

    /// Number of hashing workers [default: available CPUs]
    #[arg(short = 'j', long, value_name = "N")]
    pub concurrency: Option<usize>,

    /// Attempts per file action before giving up [default: 3]
    #[arg(long, value_name = "N")]
    pub max_retries: Option<u32>,

    /// Name collision handling in the review directory [default: rename]
    #[arg(long, value_enum)]
    pub collision: Option<CollisionPolicy>,

    /// Follow symbolic links (cycles are detected and skipped)
    #[arg(long)]
    pub follow_symlinks: bool,

    /// Read buffer size for hashing (e.g., 64KiB, 1MiB)
    ///
    /// Supports suffixes: B, KB, KiB, MB, MiB, GB, GiB, TB, TiB
    #[arg(long, value_name = "SIZE", value_parser = parse_size)]
    pub buffer_size: Option<u64>,

    /// Memory-map large files instead of streaming them
    #[arg(long)]
    pub mmap: bool,

    /// Report format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,

    /// Print fatal errors as a JSON object on stderr
    #[arg(long)]
    pub json_errors: bool,
}

/// Resolution mode as accepted on the command line and in config files.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum ModeArg {
    /// Permanently delete duplicates
    Delete,
    /// Move duplicates into the review directory
    Quarantine,
    /// Only report what would be done
    #[default]
    DryRun,
}

impl std::fmt::Display for ModeArg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModeArg::Delete => write!(f, "delete"),
            ModeArg::Quarantine => write!(f, "quarantine"),
            ModeArg::DryRun => write!(f, "dry-run"),
        }
    }
}

/// Output format for the final report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable summary
    Text,
    /// JSON document for scripting
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// Parse a human-readable size string into bytes.
///
/// Supports suffixes: B, K/KB, KiB, M/MB, MiB, G/GB, GiB, T/TB, TiB.
/// Case-insensitive. Numbers without suffix are treated as bytes.
///
/// # Examples
///
/// ```
/// use dupsweep::cli::parse_size;
///
/// assert_eq!(parse_size("4096").unwrap(), 4096);
/// assert_eq!(parse_size("64KiB").unwrap(), 65_536);
/// assert_eq!(parse_size("1MB").unwrap(), 1_000_000);
/// ```
///
/// # Errors
///
/// Returns an error if the string is empty, contains an invalid number,
/// a negative number, or an unknown size suffix.
pub fn parse_size(s: &str) -> Result<u64, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("Size cannot be empty".to_string());
    }
    if s.starts_with('-') {
        return Err("Size cannot be negative".to_string());
    }

    let (number, suffix) = match s.find(|c: char| !c.is_ascii_digit() && c != '.') {
        Some(idx) => (&s[..idx], s[idx..].trim().to_ascii_uppercase()),
        None => (s, String::new()),
    };

    let value: f64 = number
        .parse()
        .map_err(|_| format!("Invalid number: '{number}'"))?;

    let multiplier: u64 = match suffix.as_str() {
        "" | "B" => 1,
        "K" | "KB" => 1_000,
        "KIB" => 1 << 10,
        "M" | "MB" => 1_000_000,
        "MIB" => 1 << 20,
        "G" | "GB" => 1_000_000_000,
        "GIB" => 1 << 30,
        "T" | "TB" => 1_000_000_000_000,
        "TIB" => 1 << 40,
        _ => return Err(format!("Unknown size suffix: '{suffix}'")),
    };

    Ok((value * multiplier as f64) as u64)
}
