//! dupsweep - content-identical file deduplication
//!
//! Walks a directory tree, fingerprints every regular file with BLAKE3 on a
//! fixed pool of workers, groups files with identical content, keeps the
//! first-discovered copy of each group and deletes the others or moves them
//! into a review directory.

pub mod actions;
pub mod cli;
pub mod config;
pub mod duplicates;
pub mod error;
pub mod logging;
pub mod output;
pub mod progress;
pub mod scanner;
pub mod signal;
pub mod sweep;

use std::io::IsTerminal;
use std::sync::Arc;

use anyhow::Context;

use crate::cli::{Cli, OutputFormat};
use crate::config::Config;
use crate::error::ExitCode;
use crate::progress::Progress;
use crate::sweep::SweepOptions;

/// Run one invocation of the command-line tool.
///
/// The report goes to stdout; logs, progress bars and errors go to stderr.
///
/// # Errors
///
/// Returns an error for fatal conditions: invalid configuration, an
/// unreadable source root, a review directory inside the source, or an
/// interrupted scan.
pub fn run_app(cli: Cli) -> anyhow::Result<ExitCode> {
    logging::init_logging(cli.verbose, cli.quiet);

    let color = !cli.no_color && std::io::stdout().is_terminal();
    if !color {
        yansi::disable();
    }

    let handler = signal::install_handler().context("Failed to set up Ctrl+C handling")?;

    let config = Config::load(&cli)?;
    log::debug!("Effective configuration: {:?}", config);

    let show_progress = !cli.quiet && cli.output == OutputFormat::Text;
    let progress = Arc::new(Progress::new(!show_progress));

    let options = SweepOptions {
        collision: config.collision,
        concurrency: config.concurrency,
        max_retries: config.max_retries,
        follow_symlinks: config.follow_symlinks,
        buffer_size: config.buffer_size,
        use_mmap: cli.mmap,
        shutdown_flag: Some(handler.get_flag()),
        progress_callback: Some(progress),
        ..SweepOptions::new(&cli.source, config.resolve_mode())
    };

    let report = sweep::run(&options)?;
    if handler.is_shutdown_requested() {
        log::warn!("Interrupted; the report covers only the work finished so far");
    }

    if !(cli.quiet && cli.output == OutputFormat::Text) {
        let mut stdout = std::io::stdout().lock();
        output::write_report(&report, cli.output, color, &mut stdout)
            .context("Failed to write report")?;
    }

    Ok(ExitCode::from_report(&report))
}
