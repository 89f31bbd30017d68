//! Exit codes and structured errors.

use serde::Serialize;

use crate::duplicates::FinderError;
use crate::sweep::SweepReport;

/// Process exit codes.
///
/// - 0: duplicates were found and resolved
/// - 1: fatal error (unreadable source, bad configuration)
/// - 2: the scan completed and found nothing to do
/// - 3: completed, but some files could not be read or acted upon
/// - 130: interrupted (Ctrl+C)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitCode {
    /// Duplicates were found and resolved without errors.
    Success = 0,
    /// A fatal error stopped the run.
    GeneralError = 1,
    /// No duplicates were found.
    NoDuplicates = 2,
    /// The run completed with recovered per-file errors.
    PartialSuccess = 3,
    /// The run was interrupted by the user.
    Interrupted = 130,
}

impl ExitCode {
    /// Get the numeric exit code.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Get the machine-readable code prefix.
    #[must_use]
    pub fn code_prefix(self) -> &'static str {
        match self {
            Self::Success => "DS000",
            Self::GeneralError => "DS001",
            Self::NoDuplicates => "DS002",
            Self::PartialSuccess => "DS003",
            Self::Interrupted => "DS130",
        }
    }

    /// Exit code for a run that produced a report.
    ///
    /// Interruption wins over errors, errors win over "nothing found".
    #[must_use]
    pub fn from_report(report: &SweepReport) -> Self {
        if report.interrupted() {
            Self::Interrupted
        } else if report.error_count() > 0 {
            Self::PartialSuccess
        } else if report.scan.groups.is_empty() {
            Self::NoDuplicates
        } else {
            Self::Success
        }
    }

    /// Exit code for a run that ended in an error.
    #[must_use]
    pub fn from_error(err: &anyhow::Error) -> Self {
        match err.downcast_ref::<FinderError>() {
            Some(FinderError::Interrupted) => Self::Interrupted,
            _ => Self::GeneralError,
        }
    }
}

impl std::fmt::Display for ExitCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Success => "success",
            Self::GeneralError => "error",
            Self::NoDuplicates => "no-duplicates",
            Self::PartialSuccess => "partial-success",
            Self::Interrupted => "interrupted",
        };
        write!(f, "{}", name)
    }
}

/// Structured error information for JSON output.
#[derive(Debug, Serialize)]
pub struct StructuredError {
    /// The error code (e.g., "DS001")
    pub code: String,
    /// The exit code number
    pub exit_code: i32,
    /// Human-readable error message, including its causes
    pub message: String,
    /// Whether the operation was interrupted
    pub interrupted: bool,
}

impl StructuredError {
    /// Create a new structured error from an anyhow error and an exit code.
    #[must_use]
    pub fn new(err: &anyhow::Error, exit_code: ExitCode) -> Self {
        Self {
            code: exit_code.code_prefix().to_string(),
            exit_code: exit_code.as_i32(),
            message: format!("{:#}", err),
            interrupted: exit_code == ExitCode::Interrupted,
        }
    }
}
