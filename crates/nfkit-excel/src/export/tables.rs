/// Flat correction and violation tables.
use std::io::Write;

use rust_xlsxwriter::{Workbook, Worksheet};

use nfkit_core::{CORRECTIONS_SHEET, CorrectionRecord, VIOLATIONS_SHEET, ViolationRecord};

use crate::error::ExportError;
use crate::export::finish;
use crate::export::style::{
    row_index, set_column_widths, write_header_row, ws_write, ws_write_f64, xlsx_err,
};

/// Writes the correction table (`Correcoes`) to `writer`.
///
/// # Errors
///
/// Returns [`ExportError`] if the workbook cannot be built or written.
pub fn write_corrections<W: Write>(
    records: &[CorrectionRecord],
    writer: W,
) -> Result<(), ExportError> {
    let mut wb = Workbook::new();
    let ws = wb.add_worksheet();
    ws.set_name(CORRECTIONS_SHEET).map_err(xlsx_err)?;

    write_header_row(ws, &CorrectionRecord::HEADERS)?;
    set_column_widths(ws, &[(0, 8.0), (1, 18.0), (2, 40.0), (3, 40.0)])?;
    for (i, record) in records.iter().enumerate() {
        write_record(ws, i, record.line, &record.fields())?;
    }

    finish(&mut wb, writer)
}

/// Writes the violation table (`Erros`) to `writer`.
///
/// # Errors
///
/// Returns [`ExportError`] if the workbook cannot be built or written.
pub fn write_violations<W: Write>(
    records: &[ViolationRecord],
    writer: W,
) -> Result<(), ExportError> {
    let mut wb = Workbook::new();
    let ws = wb.add_worksheet();
    ws.set_name(VIOLATIONS_SHEET).map_err(xlsx_err)?;

    write_header_row(ws, &ViolationRecord::HEADERS)?;
    set_column_widths(
        ws,
        &[
            (0, 8.0),
            (1, 16.0),
            (2, 40.0),
            (3, 16.0),
            (4, 30.0),
            (5, 40.0),
        ],
    )?;
    for (i, record) in records.iter().enumerate() {
        write_record(ws, i, record.line, &record.fields())?;
    }

    finish(&mut wb, writer)
}

/// Writes one record below the header; the leading line number is numeric.
fn write_record(
    ws: &mut Worksheet,
    index: usize,
    line: u32,
    fields: &[String],
) -> Result<(), ExportError> {
    let row = row_index(index + 1)?;
    ws_write_f64(ws, row, 0, f64::from(line))?;
    for (col, value) in (1u16..).zip(fields.iter().skip(1)) {
        ws_write(ws, row, col, value)?;
    }
    Ok(())
}
