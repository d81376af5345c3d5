/// Excel adapter for nfkit product catalogs.
///
/// Reading locates the catalog section (the `PRODUTOS` sheet by default) in a
/// `.xlsx` workbook and decodes it into a core [`Section`]. Writing turns the
/// core export records back into workbooks. The `calamine` and
/// `rust_xlsxwriter` dependencies are confined to this crate and do not bleed
/// into `nfkit-core` or `nfkit-cli`.
///
/// # Output workbooks
///
/// | File | Sheet | Content |
/// |---|---|---|
/// | `produtos_validos.xlsx` | source name | preamble + valid rows |
/// | `produtos_invalidos.xlsx` | source name | preamble + invalid rows |
/// | `detalhes_correcoes.xlsx` | `Correcoes` | `Linha, Coluna, Antes, Depois` |
/// | `inconsistencias_pos_correcao.xlsx` | `Erros` | one row per violation |
use std::io::{Cursor, Read};

use calamine::{Reader, Xlsx, open_workbook_from_rs};

use nfkit_core::{Section, SheetLayout, find_section};

pub mod error;
pub mod export;
mod sheet;
pub mod styles;

pub use error::{ExportError, ImportError};
pub use export::{write_catalog, write_corrections, write_violations};
pub use styles::CellFormats;

/// Reads the catalog section of the `.xlsx` workbook in `reader`.
///
/// # Errors
///
/// Same as [`read_section_from_bytes`], plus [`ImportError::ExcelRead`] when
/// `reader` fails.
pub fn read_section<R: Read>(mut reader: R, layout: &SheetLayout) -> Result<Section, ImportError> {
    let mut bytes = Vec::new();
    reader
        .read_to_end(&mut bytes)
        .map_err(|e| ImportError::ExcelRead {
            detail: e.to_string(),
        })?;
    read_section_from_bytes(&bytes, layout)
}

/// Reads the catalog section from an in-memory workbook.
///
/// The sheet is matched against `layout.section` case-insensitively. Grid
/// rows are anchored at `A1`, so leading blank rows keep their line numbers.
/// Numeric cells with a zero-padded number format keep the text Excel shows
/// for them (`00000000` turns `1012100` into `01012100`).
///
/// # Errors
///
/// - [`ImportError::ExcelRead`] if the bytes are not a readable workbook.
/// - [`ImportError::Shape`] if no sheet matches the section name.
pub fn read_section_from_bytes(bytes: &[u8], layout: &SheetLayout) -> Result<Section, ImportError> {
    let mut workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(bytes)).map_err(
        |e: calamine::XlsxError| ImportError::ExcelRead {
            detail: e.to_string(),
        },
    )?;

    let sheet_names: Vec<String> = workbook.sheet_names();
    let index = find_section(&sheet_names, layout)?;
    let name = sheet_names[index].clone();

    let range = workbook
        .worksheet_range(&name)
        .map_err(|e| ImportError::ExcelRead {
            detail: format!("failed to read sheet {name:?}: {e}"),
        })?;

    let formats = styles::read_cell_formats(bytes, &name).unwrap_or_else(|e| {
        tracing::warn!(sheet = %name, error = %e, "number formats unavailable");
        CellFormats::default()
    });
    let grid = sheet::range_to_grid(&range, &formats);
    tracing::debug!(sheet = %name, rows = grid.len(), formatted = formats.len(), "decoded worksheet");

    Ok(Section::new(name, grid))
}
