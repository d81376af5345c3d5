/// File reading with size enforcement, and catalog loading by extension.
///
/// This module is the single entry point for input I/O in the `nfkit`
/// binary. The library crates never touch the filesystem.
///
/// Key behaviours:
/// - Size checked via `std::fs::metadata` before any read.
/// - UTF-8 validation for text inputs with byte-offset reporting.
/// - `.xlsx` catalogs go through `nfkit-excel`, `.xml` through `nfkit-xml`.
/// - All I/O errors are converted to [`CliError`] variants with exit code 2.
use std::io::ErrorKind;
use std::path::Path;

use nfkit_core::{Section, SheetLayout};
use nfkit_excel::ImportError;
use nfkit_xml::XmlError;

use crate::error::CliError;

// ---------------------------------------------------------------------------
// Raw reads
// ---------------------------------------------------------------------------

/// Reads a whole file after checking its size against `max_size`.
///
/// # Errors
///
/// [`CliError`] (exit code 2) for a missing or unreadable file, or one larger
/// than `max_size`.
pub fn read_bytes(path: &Path, max_size: u64) -> Result<Vec<u8>, CliError> {
    let file_size = std::fs::metadata(path)
        .map_err(|e| io_error_to_cli(&e, path))?
        .len();

    if file_size > max_size {
        return Err(CliError::FileTooLarge {
            source: path.display().to_string(),
            limit: max_size,
            actual: file_size,
        });
    }

    std::fs::read(path).map_err(|e| io_error_to_cli(&e, path))
}

/// Reads a UTF-8 text file.
///
/// # Errors
///
/// As [`read_bytes`], plus [`CliError::InvalidUtf8`].
pub fn read_text(path: &Path, max_size: u64) -> Result<String, CliError> {
    let bytes = read_bytes(path, max_size)?;
    String::from_utf8(bytes).map_err(|e| CliError::InvalidUtf8 {
        source: path.display().to_string(),
        byte_offset: e.utf8_error().valid_up_to(),
    })
}

/// Writes `bytes` to `path`, replacing any existing file.
///
/// # Errors
///
/// [`CliError`] mapped from the underlying I/O error.
pub fn write_bytes(path: &Path, bytes: &[u8]) -> Result<(), CliError> {
    std::fs::write(path, bytes).map_err(|e| io_error_to_cli(&e, path))
}

/// Maps a `std::io::Error` from a filesystem operation to a [`CliError`].
pub fn io_error_to_cli(e: &std::io::Error, path: &Path) -> CliError {
    let kind = e.kind();
    if kind == ErrorKind::NotFound {
        CliError::FileNotFound {
            path: path.to_path_buf(),
        }
    } else if kind == ErrorKind::PermissionDenied {
        CliError::PermissionDenied {
            path: path.to_path_buf(),
        }
    } else {
        CliError::IoError {
            source: path.display().to_string(),
            detail: e.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Catalog loading
// ---------------------------------------------------------------------------

/// Reads the catalog section of an `.xlsx` or `.xml` file.
///
/// # Errors
///
/// - [`CliError::UnsupportedInput`] for any other extension.
/// - [`CliError::CorruptDocument`] when the file cannot be parsed.
/// - [`CliError::DocumentShape`] when the section is missing.
/// - Read errors from [`read_bytes`] / [`read_text`].
pub fn read_catalog(path: &Path, layout: &SheetLayout, max_size: u64) -> Result<Section, CliError> {
    let source = path.display().to_string();
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    match extension.as_str() {
        "xlsx" => {
            let bytes = read_bytes(path, max_size)?;
            nfkit_excel::read_section_from_bytes(&bytes, layout).map_err(|e| match e {
                ImportError::ExcelRead { detail } => CliError::CorruptDocument { source, detail },
                ImportError::Shape(shape) => CliError::DocumentShape {
                    source,
                    detail: shape.to_string(),
                },
            })
        }
        "xml" => {
            let xml = read_text(path, max_size)?;
            nfkit_xml::read_xml_grid(&xml, layout).map_err(|e| xml_error_to_cli(e, source))
        }
        _ => Err(CliError::UnsupportedInput {
            path: path.to_path_buf(),
        }),
    }
}

fn xml_error_to_cli(e: XmlError, source: String) -> CliError {
    match e {
        XmlError::Shape(shape) => CliError::DocumentShape {
            source,
            detail: shape.to_string(),
        },
        XmlError::Parse { .. }
        | XmlError::UnsupportedLayout { .. }
        | XmlError::Zip { .. }
        | XmlError::TooDeep { .. }
        | XmlError::TooManyEntries { .. }
        | XmlError::TooLarge { .. }
        | XmlError::Io { .. } => CliError::CorruptDocument {
            source,
            detail: e.to_string(),
        },
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
