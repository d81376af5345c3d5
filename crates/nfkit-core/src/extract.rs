/// Cell grid extractor: fixed-layout grid → catalog rows keyed by header.
///
/// The layout is a preamble of free-form rows, a header row at a known
/// offset (index 5, the 6th line) and data rows after it. Extraction keeps the
/// preamble verbatim so that exports can reproduce the original document's
/// non-data rows.
use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::columns;
use crate::grid::{Cell, Grid};
use crate::row::Row;
use crate::text::nfc;

/// Default label of the catalog section.
pub const DEFAULT_SECTION: &str = "PRODUTOS";

/// Default zero-based index of the header row.
pub const DEFAULT_HEADER_ROW: usize = 5;

/// Default minimum number of grid rows (preamble, header and one data row).
pub const DEFAULT_MIN_ROWS: usize = 7;

// ---------------------------------------------------------------------------
// DocumentShapeError
// ---------------------------------------------------------------------------

/// The document does not have the expected catalog shape.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DocumentShapeError {
    /// No section carries the expected label.
    #[error("document has no sheet named {expected:?} (found: {})", .found.join(", "))]
    MissingSection {
        /// The label that was looked for.
        expected: String,
        /// Section names present in the document.
        found: Vec<String>,
    },
    /// The section has fewer rows than the layout requires.
    #[error("sheet must have at least {required} rows, found {found}")]
    TooFewRows {
        /// Rows present.
        found: usize,
        /// Minimum rows required.
        required: usize,
    },
}

// ---------------------------------------------------------------------------
// SheetLayout
// ---------------------------------------------------------------------------

/// Position of the catalog inside a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetLayout {
    /// Section label, matched case-insensitively after trimming.
    pub section: String,
    /// Zero-based index of the header row.
    pub header_row: usize,
    /// Minimum number of grid rows.
    pub min_rows: usize,
}

impl Default for SheetLayout {
    fn default() -> Self {
        Self {
            section: DEFAULT_SECTION.to_owned(),
            header_row: DEFAULT_HEADER_ROW,
            min_rows: DEFAULT_MIN_ROWS,
        }
    }
}

impl SheetLayout {
    /// Zero-based grid index of the first data row.
    pub fn data_start(&self) -> usize {
        self.header_row + 1
    }

    /// Rows the grid must have: never fewer than the header plus one data row.
    pub fn required_rows(&self) -> usize {
        self.min_rows.max(self.header_row + 2)
    }

    /// Returns `true` if `name` matches the section label.
    pub fn matches_section(&self, name: &str) -> bool {
        name.trim().to_uppercase() == self.section.trim().to_uppercase()
    }
}

/// Returns the position of the section named like `layout.section`.
///
/// # Errors
///
/// [`DocumentShapeError::MissingSection`] when no name matches.
pub fn find_section<S: AsRef<str>>(
    names: &[S],
    layout: &SheetLayout,
) -> Result<usize, DocumentShapeError> {
    names
        .iter()
        .position(|n| layout.matches_section(n.as_ref()))
        .ok_or_else(|| DocumentShapeError::MissingSection {
            expected: layout.section.clone(),
            found: names.iter().map(|n| n.as_ref().to_owned()).collect(),
        })
}

// ---------------------------------------------------------------------------
// Extraction
// ---------------------------------------------------------------------------

/// Output of [`extract`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Extraction {
    /// Non-blank trimmed header names in column order.
    pub columns: Vec<String>,
    /// Non-blank data rows.
    pub rows: Vec<Row>,
    /// Grid rows up to and including the header, verbatim.
    pub preamble: Vec<Vec<Cell>>,
}

/// Extracts catalog rows from `grid`.
///
/// Headers are trimmed and NFC-normalized; blank header cells drop their
/// column. A header that appears twice keeps its first column. Numeric cells
/// under identifier columns become digit text, keeping displayed leading
/// zeros. Each row's source line is its real grid position plus one, so
/// blank rows in the data region do not shift the lines reported for later
/// rows.
///
/// # Errors
///
/// [`DocumentShapeError::TooFewRows`] when the grid is shorter than the
/// layout requires.
pub fn extract(grid: &Grid, layout: &SheetLayout) -> Result<Extraction, DocumentShapeError> {
    let required = layout.required_rows();
    if grid.len() < required {
        return Err(DocumentShapeError::TooFewRows {
            found: grid.len(),
            required,
        });
    }

    let all = grid.rows();
    let header = all.get(layout.header_row).map_or(&[][..], Vec::as_slice);

    let mut seen = HashSet::new();
    let mut mapped: Vec<(usize, String)> = Vec::new();
    for (col, cell) in header.iter().enumerate() {
        let name = nfc(cell.display().trim());
        if name.is_empty() {
            continue;
        }
        if !seen.insert(name.clone()) {
            tracing::warn!(column = %name, position = col, "duplicate header ignored");
            continue;
        }
        mapped.push((col, name));
    }

    let preamble = all.iter().take(layout.data_start()).cloned().collect();

    let mut rows = Vec::new();
    for (offset, grid_row) in all.iter().enumerate().skip(layout.data_start()) {
        let line = u32::try_from(offset + 1).unwrap_or(u32::MAX);
        let mut row = Row::new(rows.len(), line);
        for (col, name) in &mapped {
            let cell = match grid_row.get(*col) {
                Some(Cell::Number { value, text })
                    if columns::IDENTIFIER_COLUMNS.contains(&name.as_str()) =>
                {
                    identifier_text(*value, text)
                }
                Some(other) => other.clone(),
                None => Cell::Empty,
            };
            row.insert(name.clone(), cell);
        }
        if row.is_blank() {
            continue;
        }
        rows.push(row);
    }

    tracing::info!(
        columns = mapped.len(),
        rows = rows.len(),
        "extracted catalog rows"
    );

    Ok(Extraction {
        columns: mapped.into_iter().map(|(_, name)| name).collect(),
        rows,
        preamble,
    })
}

/// Digits as displayed (leading zeros of a padded format included), or the
/// exact integer when the display text is anything else.
fn identifier_text(value: f64, text: &str) -> Cell {
    let shown = text.trim();
    if !shown.is_empty() && shown.bytes().all(|b| b.is_ascii_digit()) {
        Cell::Text(shown.to_owned())
    } else {
        Cell::Text(format!("{value:.0}"))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used)]

    use super::*;

    // ── helpers ──────────────────────────────────────────────────────────────

    fn preamble() -> Vec<Vec<Cell>> {
        vec![
            vec![Cell::text("Cadastro de produtos")],
            vec![],
            vec![Cell::text("Loja"), Cell::text("Centro")],
            vec![],
            vec![],
        ]
    }

    fn grid_with(header: &[&str], data: Vec<Vec<Cell>>) -> Grid {
        let mut rows = preamble();
        rows.push(header.iter().map(|h| Cell::from(*h)).collect());
        rows.extend(data);
        Grid::new(rows)
    }

    // ── shape ────────────────────────────────────────────────────────────────

    #[test]
    fn five_row_grid_is_rejected() {
        let grid = Grid::new(preamble());
        let err = extract(&grid, &SheetLayout::default()).expect_err("too short");
        assert_eq!(
            err,
            DocumentShapeError::TooFewRows {
                found: 5,
                required: 7
            }
        );
    }

    #[test]
    fn section_lookup_is_case_insensitive_and_trimmed() {
        let names = ["Resumo", " produtos "];
        assert_eq!(find_section(&names, &SheetLayout::default()), Ok(1));
    }

    #[test]
    fn missing_section_lists_found_names() {
        let names = ["Resumo", "Clientes"];
        let err = find_section(&names, &SheetLayout::default()).expect_err("missing");
        assert_eq!(
            err.to_string(),
            "document has no sheet named \"PRODUTOS\" (found: Resumo, Clientes)"
        );
    }

    // ── rows ─────────────────────────────────────────────────────────────────

    #[test]
    fn rows_are_keyed_by_header_and_numbered_from_line_seven() {
        let grid = grid_with(
            &["Código Interno", "Nome Produto"],
            vec![
                vec![Cell::text("1"), Cell::text("Arroz")],
                vec![Cell::text("2"), Cell::text("Feijão")],
            ],
        );
        let ex = extract(&grid, &SheetLayout::default()).expect("extract");
        assert_eq!(ex.columns, vec!["Código Interno", "Nome Produto"]);
        assert_eq!(ex.rows.len(), 2);
        assert_eq!(ex.rows[0].line, 7);
        assert_eq!(ex.rows[1].line, 8);
        assert_eq!(ex.rows[1].text("Nome Produto"), "Feijão");
        assert_eq!(ex.preamble.len(), 6);
    }

    #[test]
    fn blank_rows_are_skipped_without_shifting_lines() {
        let grid = grid_with(
            &["A"],
            vec![
                vec![Cell::text("x")],
                vec![Cell::text("   ")],
                vec![Cell::text("y")],
            ],
        );
        let ex = extract(&grid, &SheetLayout::default()).expect("extract");
        let lines: Vec<u32> = ex.rows.iter().map(|r| r.line).collect();
        assert_eq!(lines, vec![7, 9]);
        assert_eq!(ex.rows[1].index, 1);
    }

    #[test]
    fn blank_header_drops_its_column() {
        let grid = grid_with(
            &["A", "", "C"],
            vec![vec![Cell::text("a"), Cell::text("b"), Cell::text("c")]],
        );
        let ex = extract(&grid, &SheetLayout::default()).expect("extract");
        assert_eq!(ex.columns, vec!["A", "C"]);
        assert_eq!(ex.rows[0].text("C"), "c");
        assert_eq!(ex.rows[0].cells.len(), 2);
    }

    #[test]
    fn duplicate_header_keeps_first_column() {
        let grid = grid_with(
            &["A", "A"],
            vec![vec![Cell::text("first"), Cell::text("second")]],
        );
        let ex = extract(&grid, &SheetLayout::default()).expect("extract");
        assert_eq!(ex.columns, vec!["A"]);
        assert_eq!(ex.rows[0].text("A"), "first");
    }

    #[test]
    fn numeric_barcode_becomes_integer_text() {
        let grid = grid_with(
            &["Código Barra", "Preço"],
            vec![vec![Cell::number(7_891_234_567_890.0), Cell::number(10.5)]],
        );
        let ex = extract(&grid, &SheetLayout::default()).expect("extract");
        assert_eq!(
            ex.rows[0].get("Código Barra"),
            Some(&Cell::Text("7891234567890".to_owned()))
        );
        assert!(matches!(ex.rows[0].get("Preço"), Some(Cell::Number { .. })));
    }

    #[test]
    fn padded_barcode_keeps_leading_zero() {
        let padded = Cell::Number {
            value: 789_123_456_789.0,
            text: "0789123456789".to_owned(),
        };
        let scientific = Cell::Number {
            value: 7_891_234_567_890.0,
            text: "7.89123E+12".to_owned(),
        };
        let grid = grid_with(&["Código Barra"], vec![vec![padded], vec![scientific]]);
        let ex = extract(&grid, &SheetLayout::default()).expect("extract");
        assert_eq!(
            ex.rows[0].get("Código Barra"),
            Some(&Cell::Text("0789123456789".to_owned()))
        );
        assert_eq!(
            ex.rows[1].get("Código Barra"),
            Some(&Cell::Text("7891234567890".to_owned()))
        );
    }

    #[test]
    fn decomposed_headers_match_column_constants() {
        let grid = grid_with(&["Co\u{0301}digo Barra "], vec![vec![Cell::text("1")]]);
        let ex = extract(&grid, &SheetLayout::default()).expect("extract");
        assert_eq!(ex.columns, vec![columns::BARCODE]);
    }

    #[test]
    fn short_rows_fill_missing_cells_with_empty() {
        let grid = grid_with(&["A", "B"], vec![vec![Cell::text("a")]]);
        let ex = extract(&grid, &SheetLayout::default()).expect("extract");
        assert_eq!(ex.rows[0].get("B"), Some(&Cell::Empty));
    }
}
