//! Implementation of `nfkit xml <files...>`.
//!
//! Collects XML documents from plain files and (nested) ZIP archives, keeps
//! those matching `--keys`, and then either lists them, summarizes them, or
//! packs them into an organized ZIP. `--minify` rewrites XML entries before
//! packing.
use std::io::Cursor;
use std::path::{Path, PathBuf};

use nfkit_xml::{
    ArchiveLimits, Entry, collect_input, filter_by_keys, minify_entries, parse_keys, summarize,
};

use crate::cmd::stdout_error;
use crate::error::CliError;
use crate::format::{FormatterConfig, write_archive_summary, write_entry, write_output_file};
use crate::io::{read_bytes, write_bytes};

/// Options of the `xml` command.
#[derive(Debug, Clone)]
pub struct XmlOptions<'a> {
    /// Key filter, unparsed.
    pub keys: Option<&'a str>,
    /// Minify before packing.
    pub minify: bool,
    /// Target of the organized archive.
    pub organize: Option<&'a Path>,
    /// Print the summary instead of the listing.
    pub summary: bool,
}

/// Runs the `xml` command.
///
/// # Errors
///
/// Read errors for the inputs, [`CliError::ArchiveFailed`] for corrupt or
/// oversized archives, and write errors for the organized ZIP.
pub fn run(
    files: &[PathBuf],
    options: &XmlOptions<'_>,
    max_file_size: u64,
    config: &FormatterConfig,
) -> Result<(), CliError> {
    let mut entries = collect(files, max_file_size)?;

    if let Some(keys) = options.keys {
        let keys = parse_keys(keys);
        let before = entries.len();
        entries = filter_by_keys(entries, &keys);
        tracing::info!(keys = keys.len(), before, kept = entries.len(), "key filter applied");
    }
    if options.minify {
        entries = minify_entries(entries);
    }

    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    if let Some(target) = options.organize {
        let mut cursor = Cursor::new(Vec::new());
        let packed = nfkit_xml::organize(&entries, &mut cursor).map_err(|e| {
            CliError::ArchiveFailed {
                source: target.display().to_string(),
                detail: e.to_string(),
            }
        })?;
        write_bytes(target, cursor.get_ref())?;
        tracing::info!(file = %target.display(), packed, "organized archive written");
        write_output_file(&mut out, target, config).map_err(stdout_error)?;
    }

    if options.summary {
        write_archive_summary(&mut out, &summarize(&entries), config).map_err(stdout_error)?;
    } else if options.organize.is_none() {
        for entry in &entries {
            write_entry(&mut out, entry, config).map_err(stdout_error)?;
        }
    }
    Ok(())
}

/// Reads every input and flattens them into entries, in argument order.
///
/// # Errors
///
/// Read errors for the inputs and [`CliError::ArchiveFailed`] for archives
/// that cannot be walked.
pub fn collect(files: &[PathBuf], max_file_size: u64) -> Result<Vec<Entry>, CliError> {
    let limits = ArchiveLimits::default();
    let mut entries = Vec::new();
    for path in files {
        let bytes = read_bytes(path, max_file_size)?;
        let name = path.to_string_lossy();
        let found = collect_input(&name, bytes, &limits).map_err(|e| CliError::ArchiveFailed {
            source: path.display().to_string(),
            detail: e.to_string(),
        })?;
        if found.is_empty() {
            tracing::warn!(file = %path.display(), "no files collected");
        }
        entries.extend(found);
    }
    tracing::info!(inputs = files.len(), entries = entries.len(), "inputs collected");
    Ok(entries)
}
