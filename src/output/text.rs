//! Human-readable report.

use std::collections::HashMap;
use std::io::Write;
use std::path::Path;

use bytesize::ByteSize;
use yansi::{Paint, Style};

use crate::actions::{FileStatus, ResolveMode};
use crate::duplicates::DuplicateGroup;
use crate::sweep::SweepReport;

use super::OutputError;

const DIGEST: Style = Style::new().cyan();
const KEEP: Style = Style::new().green().bold();
const ACTED: Style = Style::new().yellow();
const IDLE: Style = Style::new().dim();
const FAILED: Style = Style::new().red().bold();
const HEADING: Style = Style::new().bold();

/// Text renderer for a [`SweepReport`].
pub struct TextOutput<'a> {
    report: &'a SweepReport,
    color: bool,
}

impl<'a> TextOutput<'a> {
    /// Create a renderer. `color` turns ANSI styling on.
    #[must_use]
    pub fn new(report: &'a SweepReport, color: bool) -> Self {
        Self { report, color }
    }

    fn paint(&self, text: impl std::fmt::Display, style: Style) -> String {
        if self.color {
            text.paint(style).to_string()
        } else {
            text.to_string()
        }
    }

    fn action_label(&self) -> &'static str {
        match self.report.mode {
            ResolveMode::Delete => "deleted",
            ResolveMode::Quarantine { .. } => "moved",
            ResolveMode::DryRun => "would act",
        }
    }

    fn label(&self, text: &str, style: Style) -> String {
        self.paint(format!("{:<10}", text), style)
    }

    /// Write the group listing and summary.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<(), OutputError> {
        let groups = &self.report.scan.groups;
        if groups.is_empty() {
            writeln!(writer, "No duplicates found.")?;
        } else {
            writeln!(
                writer,
                "{}",
                self.paint(format!("Duplicate groups ({}):", groups.len()), HEADING)
            )?;
            let statuses = self.report.resolution.statuses();
            for group in groups {
                self.write_group(writer, group, &statuses)?;
            }
        }
        writeln!(writer)?;
        self.write_summary(writer)
    }

    fn write_group<W: Write>(
        &self,
        writer: &mut W,
        group: &DuplicateGroup,
        statuses: &HashMap<&Path, FileStatus>,
    ) -> Result<(), OutputError> {
        let digest = group.digest_hex();
        writeln!(writer)?;
        writeln!(
            writer,
            "  {} {} x {}",
            self.paint(&digest[..12], DIGEST),
            group.len(),
            ByteSize(group.size)
        )?;

        let canonical = group.canonical();
        let keep = match statuses.get(canonical.path.as_path()) {
            Some(FileStatus::Failed) => self.label("missing", FAILED),
            _ => self.label("keep", KEEP),
        };
        writeln!(writer, "    {} {}", keep, canonical.path.display())?;

        for record in group.duplicates() {
            let label = match statuses.get(record.path.as_path()) {
                Some(FileStatus::Acted | FileStatus::Planned) => {
                    self.label(self.action_label(), ACTED)
                }
                Some(FileStatus::AlreadyAbsent) => self.label("absent", IDLE),
                Some(FileStatus::Failed) => self.label("failed", FAILED),
                None => self.label("untouched", IDLE),
            };
            writeln!(writer, "    {} {}", label, record.path.display())?;
        }
        Ok(())
    }

    fn write_summary<W: Write>(&self, writer: &mut W) -> Result<(), OutputError> {
        let summary = self.report.summary();
        writeln!(writer, "{}", self.paint("Summary", HEADING))?;
        writeln!(writer, "  Mode:              {}", self.report.mode.name())?;
        writeln!(writer, "  Files scanned:     {}", summary.files_scanned)?;
        writeln!(writer, "  Duplicate groups:  {}", summary.duplicate_groups)?;
        writeln!(writer, "  Duplicate files:   {}", summary.duplicate_files)?;

        match self.report.mode {
            ResolveMode::Delete => {
                writeln!(writer, "  Deleted:           {}", summary.files_deleted)?;
                writeln!(
                    writer,
                    "  Space reclaimed:   {}",
                    ByteSize(summary.bytes_reclaimed)
                )?;
            }
            ResolveMode::Quarantine { ref destination } => {
                writeln!(
                    writer,
                    "  Moved:             {} -> {}",
                    summary.files_moved,
                    destination.display()
                )?;
                writeln!(
                    writer,
                    "  Space moved:       {}",
                    ByteSize(self.report.resolution.bytes_moved)
                )?;
            }
            ResolveMode::DryRun => {
                writeln!(
                    writer,
                    "  Reclaimable:       {}",
                    ByteSize(summary.bytes_reclaimable)
                )?;
            }
        }

        if summary.already_absent > 0 {
            writeln!(writer, "  Already absent:    {}", summary.already_absent)?;
        }
        if summary.skipped > 0 {
            writeln!(writer, "  Skipped entries:   {}", summary.skipped)?;
        }
        let errors = if summary.errors > 0 {
            self.paint(summary.errors, FAILED)
        } else {
            summary.errors.to_string()
        };
        writeln!(writer, "  Errors:            {}", errors)?;
        writeln!(
            writer,
            "  Duration:          {:.2}s",
            self.report.duration.as_secs_f64()
        )?;
        if self.report.interrupted() {
            writeln!(writer, "  {}", self.paint("Interrupted before completion", FAILED))?;
        }
        Ok(())
    }
}
