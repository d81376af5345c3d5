/// Workbook writers for catalog, correction and violation exports.
///
/// Each writer builds a single-sheet workbook in memory and writes the bytes
/// to the caller's writer.
use std::io::Write;

use rust_xlsxwriter::Workbook;

use crate::error::ExportError;

mod catalog;
pub(crate) mod style;
mod tables;

pub use catalog::write_catalog;
pub use tables::{write_corrections, write_violations};

/// Serializes `wb` and writes it to `writer`.
fn finish<W: Write>(wb: &mut Workbook, mut writer: W) -> Result<(), ExportError> {
    let xlsx_bytes = wb.save_to_buffer().map_err(style::xlsx_err)?;

    writer.write_all(&xlsx_bytes).map_err(|e| ExportError::Io {
        detail: e.to_string(),
    })?;
    writer.flush().map_err(|e| ExportError::Io {
        detail: e.to_string(),
    })?;

    Ok(())
}
