//! Implementation of `nfkit check <file>`.
//!
//! Runs the full pipeline on a catalog and prints the violations that remain
//! after correction (or, with `--before`, those found in the original rows),
//! followed by the summary line.
//!
//! Exit codes:
//! - 0 = every row is valid after correction
//! - 1 = at least one invalid row remains
//! - 2 = the document could not be read or has no usable catalog
use std::time::Instant;

use nfkit_core::Session;

use crate::cli::CatalogArgs;
use crate::cmd::{load_catalog, stdout_error};
use crate::error::CliError;
use crate::format::{FormatterConfig, write_correction, write_summary, write_timing, write_violation};

/// Runs the `check` command.
///
/// # Errors
///
/// - Input failures from [`load_catalog`] (exit code 2).
/// - [`CliError::InvalidRows`] when invalid rows remain (exit code 1).
pub fn run(
    catalog: &CatalogArgs,
    before: bool,
    max_file_size: u64,
    config: &FormatterConfig,
) -> Result<(), CliError> {
    let start = Instant::now();
    let mut session = Session::new();
    let processed = load_catalog(&mut session, catalog, max_file_size)?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    for correction in &processed.corrections {
        write_correction(&mut out, correction, config).map_err(stdout_error)?;
    }

    let reported = if before {
        &processed.before
    } else {
        &processed.after
    };
    for violation in reported.violations() {
        write_violation(&mut out, violation, config).map_err(stdout_error)?;
    }

    let summary = processed.summary();
    write_summary(&mut out, &summary, config).map_err(stdout_error)?;
    write_timing(&mut out, "checked", start.elapsed(), config).map_err(stdout_error)?;

    if summary.invalid == 0 {
        Ok(())
    } else {
        Err(CliError::InvalidRows {
            count: summary.invalid,
        })
    }
}
