/// Format-neutral cell grid shared by every document reader.
///
/// Readers in `nfkit-excel` and `nfkit-xml` decode their input into a
/// [`Section`]: a named 2-D grid of [`Cell`] values. Everything downstream of
/// the readers (extraction, validation, correction, export) works only on
/// these types.
use std::fmt;

use serde::{Deserialize, Serialize};

/// Whole numbers below this magnitude render without a fractional part.
const INTEGER_RENDER_LIMIT: f64 = 1e15;

/// A single decoded spreadsheet cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Cell {
    /// No value.
    #[default]
    Empty,
    /// A text value, kept exactly as decoded (untrimmed).
    Text(String),
    /// A numeric value together with its display rendering.
    Number {
        /// The decoded number.
        value: f64,
        /// Display text; whole numbers carry no fractional part.
        text: String,
    },
}

impl Cell {
    /// Builds a [`Cell::Number`] whose display text is derived from `value`.
    pub fn number(value: f64) -> Self {
        Self::Number {
            value,
            text: render_number(value),
        }
    }

    /// Builds a [`Cell::Text`].
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    /// Returns the display text of the cell; empty for [`Cell::Empty`].
    pub fn display(&self) -> &str {
        match self {
            Self::Empty => "",
            Self::Text(s) => s,
            Self::Number { text, .. } => text,
        }
    }

    /// Returns `true` if the cell is empty or whitespace-only.
    pub fn is_blank(&self) -> bool {
        self.display().trim().is_empty()
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display())
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        if value.is_empty() {
            Self::Empty
        } else {
            Self::Text(value.to_owned())
        }
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        if value.is_empty() {
            Self::Empty
        } else {
            Self::Text(value)
        }
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Self::number(value)
    }
}

/// Renders a number the way a spreadsheet shows it in a general-format cell.
///
/// Whole numbers print without a fractional part so that codes such as
/// `12345678` never become `12345678.0`.
pub fn render_number(value: f64) -> String {
    if value == value.trunc() && value.abs() < INTEGER_RENDER_LIMIT {
        #[allow(clippy::cast_possible_truncation)]
        let whole = value as i64;
        whole.to_string()
    } else {
        value.to_string()
    }
}

/// A rectangular-ish grid of cells; rows may have different lengths.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Grid {
    rows: Vec<Vec<Cell>>,
}

impl Grid {
    /// Wraps decoded rows into a grid.
    pub fn new(rows: Vec<Vec<Cell>>) -> Self {
        Self { rows }
    }

    /// Builds a grid from any nested iterator of cell-convertible values.
    pub fn from_rows<R, C>(rows: R) -> Self
    where
        R: IntoIterator,
        R::Item: IntoIterator<Item = C>,
        C: Into<Cell>,
    {
        Self {
            rows: rows
                .into_iter()
                .map(|r| r.into_iter().map(Into::into).collect())
                .collect(),
        }
    }

    /// All rows of the grid.
    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns `true` if the grid has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Widest row length.
    pub fn width(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    /// Returns the cell at zero-based `(row, col)`, if present.
    pub fn get(&self, row: usize, col: usize) -> Option<&Cell> {
        self.rows.get(row).and_then(|r| r.get(col))
    }

    /// Appends a row.
    pub fn push_row(&mut self, row: Vec<Cell>) {
        self.rows.push(row);
    }
}

/// A named grid: one sheet of a workbook or one worksheet of an XML document.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Section {
    /// Sheet name exactly as found in the source document.
    pub name: String,
    /// Decoded cells.
    pub grid: Grid,
}

impl Section {
    /// Creates a section.
    pub fn new(name: impl Into<String>, grid: Grid) -> Self {
        Self {
            name: name.into(),
            grid,
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used)]

    use super::*;

    #[test]
    fn whole_numbers_render_without_fraction() {
        assert_eq!(render_number(12_345_678.0), "12345678");
        assert_eq!(render_number(7_891_234_567_890.0), "7891234567890");
        assert_eq!(render_number(-3.0), "-3");
    }

    #[test]
    fn fractional_numbers_keep_shortest_form() {
        assert_eq!(render_number(10.5), "10.5");
        assert_eq!(render_number(0.0165), "0.0165");
    }

    #[test]
    fn empty_string_converts_to_empty_cell() {
        assert_eq!(Cell::from(""), Cell::Empty);
        assert_eq!(Cell::from("x"), Cell::Text("x".to_owned()));
    }

    #[test]
    fn whitespace_text_is_blank() {
        assert!(Cell::text("   ").is_blank());
        assert!(Cell::Empty.is_blank());
        assert!(!Cell::number(0.0).is_blank());
    }

    #[test]
    fn grid_from_rows_and_lookup() {
        let grid = Grid::from_rows([vec!["a", "b"], vec!["c"]]);
        assert_eq!(grid.len(), 2);
        assert_eq!(grid.width(), 2);
        assert_eq!(grid.get(1, 0).map(Cell::display), Some("c"));
        assert!(grid.get(1, 1).is_none());
    }

    #[test]
    fn cell_serializes_with_type_tag() {
        let json = serde_json::to_string(&Cell::text("x")).expect("serialize");
        assert_eq!(json, r#"{"type":"text","value":"x"}"#);
    }
}
