//! Final report rendering.
//!
//! - [`TextOutput`] for terminals
//! - [`JsonOutput`] for automation and scripting
//!
//! # Example
//!
//! ```no_run
//! use dupsweep::actions::ResolveMode;
//! use dupsweep::output::JsonOutput;
//! use dupsweep::sweep::{run, SweepOptions};
//!
//! let report = run(&SweepOptions::new(".", ResolveMode::DryRun)).unwrap();
//! JsonOutput::new(&report).write_to(&mut std::io::stdout()).unwrap();
//! ```

pub mod json;
pub mod text;

use std::io::Write;

pub use json::JsonOutput;
pub use text::TextOutput;

use crate::cli::OutputFormat;
use crate::sweep::SweepReport;

/// Errors that can occur while writing a report.
#[derive(thiserror::Error, Debug)]
pub enum OutputError {
    /// JSON serialization error
    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error during writing
    #[error("I/O error while writing report: {0}")]
    Io(#[from] std::io::Error),
}

/// Render `report` in `format`.
///
/// # Errors
///
/// Returns an error if serialization or writing fails.
pub fn write_report<W: Write>(
    report: &SweepReport,
    format: OutputFormat,
    color: bool,
    writer: &mut W,
) -> Result<(), OutputError> {
    match format {
        OutputFormat::Text => TextOutput::new(report, color).write_to(writer),
        OutputFormat::Json => JsonOutput::new(report).write_to(writer),
    }
}
