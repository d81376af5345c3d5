/// Writes a catalog subset in the layout it was read from.
///
/// Preamble rows (everything up to and including the header) are copied
/// verbatim; item rows follow immediately. Columns flagged as text in the
/// export get the `@` format so Excel keeps barcodes and amounts as typed.
use std::io::Write;

use rust_xlsxwriter::{Workbook, Worksheet};

use nfkit_core::{Cell, CatalogExport};

use crate::error::ExportError;
use crate::export::finish;
use crate::export::style::{
    col_index, row_index, set_column_widths, text_format, ws_write, ws_write_f64, ws_write_fmt,
    xlsx_err,
};

const MIN_WIDTH: f64 = 10.0;
const MAX_WIDTH: f64 = 50.0;

/// Writes `export` as a single-sheet workbook to `writer`.
///
/// # Errors
///
/// Returns [`ExportError`] if the workbook cannot be built or written.
pub fn write_catalog<W: Write>(export: &CatalogExport, writer: W) -> Result<(), ExportError> {
    let mut wb = Workbook::new();
    let ws = wb.add_worksheet();
    ws.set_name(&export.sheet_name).map_err(xlsx_err)?;

    write_sheet(ws, export)?;
    tracing::debug!(
        sheet = %export.sheet_name,
        rows = export.rows.len(),
        "catalog workbook built"
    );

    finish(&mut wb, writer)
}

fn write_sheet(ws: &mut Worksheet, export: &CatalogExport) -> Result<(), ExportError> {
    for (r, cells) in export.preamble.iter().enumerate() {
        let row = row_index(r)?;
        for (c, cell) in cells.iter().enumerate() {
            let col = col_index(c)?;
            match cell {
                Cell::Empty => {}
                Cell::Text(s) => ws_write(ws, row, col, s)?,
                Cell::Number { value, .. } => ws_write_f64(ws, row, col, *value)?,
            }
        }
    }

    let text = text_format();
    let first = export.preamble.len();
    for (i, values) in export.rows.iter().enumerate() {
        let row = row_index(first + i)?;
        for (c, value) in values.iter().enumerate() {
            let col = col_index(c)?;
            if export.is_text_column(c) {
                ws_write_fmt(ws, row, col, value, &text)?;
            } else {
                ws_write(ws, row, col, value)?;
            }
        }
    }

    let mut widths = Vec::with_capacity(export.columns.len());
    for (c, name) in export.columns.iter().enumerate() {
        let longest = export
            .rows
            .iter()
            .filter_map(|r| r.get(c))
            .map(|v| v.chars().count())
            .chain(std::iter::once(name.chars().count()))
            .max()
            .unwrap_or(0);
        #[allow(clippy::cast_precision_loss)]
        let width = (longest as f64 + 2.0).clamp(MIN_WIDTH, MAX_WIDTH);
        widths.push((col_index(c)?, width));
    }
    set_column_widths(ws, &widths)
}
