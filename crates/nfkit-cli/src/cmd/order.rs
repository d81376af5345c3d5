//! Implementation of `nfkit order <files...>`.
//!
//! Every XML document found in the inputs (plain files or nested ZIP
//! archives) is converted into a hub order and printed. Documents that do not
//! convert are logged and skipped; the command then exits with code 1.
use std::path::PathBuf;

use nfkit_xml::{HubDefaults, Order};

use crate::cmd::stdout_error;
use crate::cmd::xml::collect;
use crate::error::CliError;
use crate::format::{FormatterConfig, write_order};

/// Runs the `order` command.
///
/// # Errors
///
/// Read and archive errors for the inputs (exit 2), write errors on stdout,
/// and [`CliError::UnconvertedDocuments`] when some documents were skipped.
pub fn run(
    files: &[PathBuf],
    defaults: &HubDefaults,
    max_file_size: u64,
    config: &FormatterConfig,
) -> Result<(), CliError> {
    let entries = collect(files, max_file_size)?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    let mut converted = 0_usize;
    let mut failed = 0_usize;
    for entry in entries.iter().filter(|e| e.is_xml()) {
        let order = std::str::from_utf8(&entry.data)
            .map_err(|e| e.to_string())
            .and_then(|xml| Order::from_xml(xml, defaults).map_err(|e| e.to_string()));
        match order {
            Ok(order) => {
                write_order(&mut out, &entry.name, &order, config).map_err(stdout_error)?;
                converted += 1;
            }
            Err(error) => {
                tracing::warn!(file = %entry.name, %error, "document not converted");
                failed += 1;
            }
        }
    }

    tracing::info!(converted, failed, "orders converted");
    if converted + failed == 0 {
        tracing::warn!("no XML documents found");
    }
    if failed > 0 {
        return Err(CliError::UnconvertedDocuments { count: failed });
    }
    Ok(())
}
