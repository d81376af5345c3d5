/// Conversion of calamine worksheet ranges into core grids.
///
/// calamine ranges start at the first used cell; the grid built here is
/// anchored at `A1` so that grid row `i` is always source line `i + 1`.
use calamine::{Data, Range};

use nfkit_core::{Cell, Grid};

use crate::styles::{CellFormats, format_number};

/// Converts a decoded calamine cell.
///
/// Error cells and empty strings become [`Cell::Empty`]. Numbers are shown
/// through `format` when it is a zero-padded code. Dates keep the text
/// calamine renders for them.
pub fn to_cell(data: &Data, format: Option<&str>) -> Cell {
    let number = |value: f64| match format.and_then(|code| format_number(value, code)) {
        Some(text) => Cell::Number { value, text },
        None => Cell::number(value),
    };
    match data {
        Data::Empty | Data::Error(_) => Cell::Empty,
        Data::String(s) => Cell::from(s.as_str()),
        Data::Float(f) => number(*f),
        #[allow(clippy::cast_precision_loss)]
        Data::Int(i) => number(*i as f64),
        Data::Bool(b) => Cell::text(b.to_string()),
        Data::DateTime(dt) => Cell::text(dt.to_string()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::from(s.as_str()),
    }
}

/// Builds a grid covering `A1` through the last used cell of `range`.
pub fn range_to_grid(range: &Range<Data>, formats: &CellFormats) -> Grid {
    let Some((row0, col0)) = range.start() else {
        return Grid::default();
    };
    let mut grid = Grid::new(vec![Vec::new(); row0 as usize]);
    for (r, row) in (row0..).zip(range.rows()) {
        let mut cells = vec![Cell::Empty; col0 as usize];
        cells.extend(
            (col0..)
                .zip(row)
                .map(|(c, data)| to_cell(data, formats.get(r, c))),
        );
        while cells.last().is_some_and(|c| matches!(c, Cell::Empty)) {
            cells.pop();
        }
        grid.push_row(cells);
    }
    grid
}
