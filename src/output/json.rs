//! JSON report for scripting.
//!
//! # Output Schema
//!
//! ```json
//! {
//!   "source": "/home/me/Downloads",
//!   "mode": "delete",
//!   "generated_at": "2026-10-19T12:00:00Z",
//!   "groups": [
//!     {
//!       "digest": "ea8f16...",
//!       "size": 5,
//!       "kept": "/home/me/Downloads/a.txt",
//!       "acted": ["/home/me/Downloads/b.txt"]
//!     }
//!   ],
//!   "summary": { "files_scanned": 3, "duplicate_groups": 1, "...": 0 },
//!   "failures": [],
//!   "scan_errors": [],
//!   "planned": [],
//!   "duration_ms": 12,
//!   "interrupted": false,
//!   "exit_code": 0,
//!   "exit_code_name": "DS000"
//! }
//! ```

use std::collections::HashMap;
use std::io::Write;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::actions::{ActionFailure, FileStatus};
use crate::duplicates::DuplicateGroup;
use crate::error::ExitCode;
use crate::sweep::{SweepReport, SweepSummary};

use super::OutputError;

/// One duplicate group.
#[derive(Debug, Clone, Serialize)]
pub struct JsonGroup {
    /// BLAKE3 digest as 64 hex characters
    pub digest: String,
    /// Content size in bytes
    pub size: u64,
    /// The copy that was kept
    pub kept: String,
    /// The copies deleted or moved (or planned, in a dry run)
    pub acted: Vec<String>,
}

impl JsonGroup {
    fn from_group(group: &DuplicateGroup, statuses: &HashMap<&Path, FileStatus>) -> Self {
        Self {
            digest: group.digest_hex(),
            size: group.size,
            kept: group.canonical().path.display().to_string(),
            acted: group
                .duplicates()
                .iter()
                .filter(|r| {
                    matches!(
                        statuses.get(r.path.as_path()),
                        Some(FileStatus::Acted | FileStatus::Planned)
                    )
                })
                .map(|r| r.path.display().to_string())
                .collect(),
        }
    }
}

/// A recovered walk or hash error.
#[derive(Debug, Clone, Serialize)]
pub struct JsonScanError {
    /// Path the error concerns
    pub path: String,
    /// "walking" or "hashing"
    pub operation: &'static str,
    /// Error message
    pub message: String,
}

/// Complete JSON report.
#[derive(Debug, Clone, Serialize)]
pub struct JsonOutput {
    /// Canonical source root
    pub source: String,
    /// Resolution mode name
    pub mode: &'static str,
    /// When the report was produced
    pub generated_at: DateTime<Utc>,
    /// Duplicate groups, most members first then by digest
    pub groups: Vec<JsonGroup>,
    /// Aggregate counts
    pub summary: SweepSummary,
    /// File actions that were given up on
    pub failures: Vec<ActionFailure>,
    /// Files that could not be walked or hashed
    pub scan_errors: Vec<JsonScanError>,
    /// Files a dry run would have acted on
    pub planned: Vec<String>,
    /// Wall-clock duration of the run
    pub duration_ms: u64,
    /// Whether resolution stopped on Ctrl+C
    pub interrupted: bool,
    /// Numeric process exit code
    pub exit_code: i32,
    /// Machine-readable exit code name (e.g., "DS000")
    pub exit_code_name: &'static str,
}

impl JsonOutput {
    /// Build the report for a finished run.
    #[must_use]
    pub fn new(report: &SweepReport) -> Self {
        let exit_code = ExitCode::from_report(report);
        let statuses = report.resolution.statuses();
        Self {
            source: report.source.display().to_string(),
            mode: report.mode.name(),
            generated_at: Utc::now(),
            groups: report
                .scan
                .groups
                .iter()
                .map(|g| JsonGroup::from_group(g, &statuses))
                .collect(),
            summary: report.summary(),
            failures: report.resolution.failures.clone(),
            scan_errors: report
                .scan
                .errors
                .iter()
                .map(|e| JsonScanError {
                    path: e.path().display().to_string(),
                    operation: e.operation(),
                    message: e.to_string(),
                })
                .collect(),
            planned: report
                .resolution
                .planned
                .iter()
                .map(|p| p.display().to_string())
                .collect(),
            duration_ms: u64::try_from(report.duration.as_millis()).unwrap_or(u64::MAX),
            interrupted: report.interrupted(),
            exit_code: exit_code.as_i32(),
            exit_code_name: exit_code.code_prefix(),
        }
    }

    /// Write the report followed by a newline.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<(), OutputError> {
        serde_json::to_writer_pretty(&mut *writer, self)?;
        writer.write_all(b"\n")?;
        Ok(())
    }
}
