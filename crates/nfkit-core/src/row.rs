/// Catalog rows keyed by header name.
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::grid::Cell;

/// Identifies a row in diagnostics: its position among extracted rows and
/// its 1-based line in the source document.
///
/// Ordering is by source line first, so sorted collections of references
/// follow document order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RowRef {
    /// 1-based line number in the source document.
    pub line: u32,
    /// 0-based position among extracted rows.
    pub index: usize,
}

/// One catalog item: an ordered mapping from column name to raw cell value.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Row {
    /// 0-based position among extracted rows.
    pub index: usize,
    /// 1-based line number in the source document.
    pub line: u32,
    /// Cells in header order.
    pub cells: IndexMap<String, Cell>,
}

impl Row {
    /// Creates an empty row.
    pub fn new(index: usize, line: u32) -> Self {
        Self {
            index,
            line,
            cells: IndexMap::new(),
        }
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, column: impl Into<String>, cell: impl Into<Cell>) -> Self {
        self.cells.insert(column.into(), cell.into());
        self
    }

    /// Inserts or replaces a cell, keeping the column position of an
    /// existing key.
    pub fn insert(&mut self, column: impl Into<String>, cell: Cell) {
        self.cells.insert(column.into(), cell);
    }

    /// The row reference used by diagnostics.
    pub fn reference(&self) -> RowRef {
        RowRef {
            line: self.line,
            index: self.index,
        }
    }

    /// Returns the cell for `column`, if the column exists.
    pub fn get(&self, column: &str) -> Option<&Cell> {
        self.cells.get(column)
    }

    /// Display text of `column`; empty when absent.
    pub fn text(&self, column: &str) -> &str {
        self.get(column).map_or("", Cell::display)
    }

    /// Trimmed display text of `column`.
    pub fn trimmed(&self, column: &str) -> &str {
        self.text(column).trim()
    }

    /// Trimmed text of `column`, or `None` when blank.
    pub fn non_blank(&self, column: &str) -> Option<&str> {
        Some(self.trimmed(column)).filter(|s| !s.is_empty())
    }

    /// Returns `true` if every field is blank.
    pub fn is_blank(&self) -> bool {
        self.cells.values().all(Cell::is_blank)
    }
}
