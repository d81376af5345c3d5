//! Implementation of `nfkit export <file> --out-dir <dir>`.
//!
//! Runs the pipeline and writes the selected workbooks into the output
//! directory under their fixed names. Invalid rows do not make the command
//! fail; they are what `produtos_invalidos.xlsx` is for.
use std::path::Path;

use nfkit_core::{
    ExportKind, ProcessedCatalog, RowSubset, Session, catalog_export, correction_records,
    violation_records,
};
use nfkit_excel::{ExportError, write_catalog, write_corrections, write_violations};

use crate::cli::{CatalogArgs, ExportSelection};
use crate::cmd::{load_catalog, stdout_error};
use crate::error::CliError;
use crate::format::{FormatterConfig, write_output_file, write_summary};
use crate::io::{io_error_to_cli, write_bytes};

/// Runs the `export` command.
///
/// # Errors
///
/// Input failures from [`load_catalog`], and [`CliError::IoError`] when the
/// directory or a workbook cannot be written.
pub fn run(
    catalog: &CatalogArgs,
    out_dir: &Path,
    selection: ExportSelection,
    max_file_size: u64,
    config: &FormatterConfig,
) -> Result<(), CliError> {
    let mut session = Session::new();
    let processed = load_catalog(&mut session, catalog, max_file_size)?;

    std::fs::create_dir_all(out_dir).map_err(|e| io_error_to_cli(&e, out_dir))?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    for kind in selection.kinds() {
        let path = out_dir.join(kind.file_name());
        let bytes = render(processed, kind).map_err(|e| CliError::IoError {
            source: path.display().to_string(),
            detail: e.to_string(),
        })?;
        write_bytes(&path, &bytes)?;
        tracing::info!(file = %path.display(), bytes = bytes.len(), "workbook written");
        write_output_file(&mut out, &path, config).map_err(stdout_error)?;
    }

    write_summary(&mut out, &processed.summary(), config).map_err(stdout_error)
}

/// Serializes one export kind to `.xlsx` bytes.
fn render(processed: &ProcessedCatalog, kind: ExportKind) -> Result<Vec<u8>, ExportError> {
    let mut buf = Vec::new();
    match kind {
        ExportKind::Valid => {
            write_catalog(&catalog_export(processed, RowSubset::Valid), &mut buf)?;
        }
        ExportKind::Invalid => {
            write_catalog(&catalog_export(processed, RowSubset::Invalid), &mut buf)?;
        }
        ExportKind::Corrections => {
            write_corrections(&correction_records(&processed.corrections), &mut buf)?;
        }
        ExportKind::Violations => {
            write_violations(&violation_records(&processed.after), &mut buf)?;
        }
    }
    Ok(buf)
}
