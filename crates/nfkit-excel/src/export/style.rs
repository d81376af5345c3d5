/// Shared cell formats and low-level write helpers.
use rust_xlsxwriter::{Format, Worksheet, XlsxError};

use crate::error::ExportError;

/// Number format that makes Excel keep a cell as literal text.
pub const TEXT_NUM_FORMAT: &str = "@";

/// Bold header format.
pub fn header_format() -> Format {
    Format::new().set_bold()
}

/// Text (`@`) format for identifier and amount columns.
pub fn text_format() -> Format {
    Format::new().set_num_format(TEXT_NUM_FORMAT)
}

pub fn xlsx_err(e: XlsxError) -> ExportError {
    ExportError::ExcelWrite {
        detail: e.to_string(),
    }
}

/// Converts a zero-based column position into an Excel column index.
pub fn col_index(position: usize) -> Result<u16, ExportError> {
    u16::try_from(position).map_err(|_| ExportError::ExcelWrite {
        detail: format!("column {position} is out of range"),
    })
}

/// Converts a zero-based row position into an Excel row index.
pub fn row_index(position: usize) -> Result<u32, ExportError> {
    u32::try_from(position).map_err(|_| ExportError::ExcelWrite {
        detail: format!("row {position} is out of range"),
    })
}

/// Writes `val` as a string; empty strings leave the cell blank.
pub fn ws_write(ws: &mut Worksheet, row: u32, col: u16, val: &str) -> Result<(), ExportError> {
    if val.is_empty() {
        return Ok(());
    }
    ws.write_string(row, col, val).map(|_| ()).map_err(xlsx_err)
}

/// Writes `val` as a string with `format`, even when empty.
pub fn ws_write_fmt(
    ws: &mut Worksheet,
    row: u32,
    col: u16,
    val: &str,
    format: &Format,
) -> Result<(), ExportError> {
    ws.write_string_with_format(row, col, val, format)
        .map(|_| ())
        .map_err(xlsx_err)
}

pub fn ws_write_f64(ws: &mut Worksheet, row: u32, col: u16, val: f64) -> Result<(), ExportError> {
    ws.write_number(row, col, val).map(|_| ()).map_err(xlsx_err)
}

/// Writes a bold header row at row 0 and freezes it.
pub fn write_header_row(ws: &mut Worksheet, headers: &[&str]) -> Result<(), ExportError> {
    let bold = header_format();
    for (i, header) in headers.iter().enumerate() {
        ws_write_fmt(ws, 0, col_index(i)?, header, &bold)?;
    }
    ws.set_freeze_panes(1, 0).map(|_| ()).map_err(xlsx_err)
}

/// Sets column widths from `(column, width)` pairs.
pub fn set_column_widths(ws: &mut Worksheet, widths: &[(u16, f64)]) -> Result<(), ExportError> {
    for &(col, width) in widths {
        ws.set_column_width(col, width)
            .map(|_| ())
            .map_err(xlsx_err)?;
    }
    Ok(())
}
