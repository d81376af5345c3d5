/// Normalizer/corrector: deterministic per-column rewrites with a recorded
/// before/after diff.
///
/// [`correct`] rewrites every known column of every row and records a
/// [`Correction`] only where the value actually changed. Running it again on
/// its own output records nothing.
use serde::Serialize;

use crate::columns;
use crate::grid::Cell;
use crate::number::{parse_amount, render_amount, reverse_scientific};
use crate::row::{Row, RowRef};
use crate::text::{AnnotatedText, annotate_diff, compact_group, strip_diacritics, truncate_chars};

/// One changed cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Correction {
    /// Row the correction belongs to.
    pub row: RowRef,
    /// Column name.
    pub column: String,
    /// Original display text.
    pub before: String,
    /// Corrected text.
    pub after: String,
    /// `before` with positions differing from `after` marked.
    pub before_marked: AnnotatedText,
    /// `after` with positions differing from `before` marked.
    pub after_marked: AnnotatedText,
}

/// Output of [`correct`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CorrectionOutcome {
    /// Rows with every known column rewritten.
    pub rows: Vec<Row>,
    /// Changed cells in row order, then column order.
    pub corrections: Vec<Correction>,
}

/// Normalizes every cell of `columns` in every row.
///
/// Corrected cells always replace the originals. A correction is recorded
/// when the trimmed texts differ; for `Preço` the parsed amounts are compared
/// instead, so `10.00` → `10,00` is not a change.
pub fn correct(rows: &[Row], columns: &[String]) -> CorrectionOutcome {
    let mut out_rows = Vec::with_capacity(rows.len());
    let mut corrections = Vec::new();

    for row in rows {
        let mut corrected = row.clone();
        for column in columns {
            let original = row.get(column).unwrap_or(&Cell::Empty);
            let fixed = normalize_cell(column, original);

            if changed(column, original, &fixed) {
                let before = original.display().to_owned();
                let after = fixed.display().to_owned();
                let (before_marked, after_marked) = annotate_diff(&before, &after);
                tracing::debug!(line = row.line, column = %column, %before, %after, "corrected cell");
                corrections.push(Correction {
                    row: row.reference(),
                    column: column.clone(),
                    before,
                    after,
                    before_marked,
                    after_marked,
                });
            }
            corrected.insert(column.clone(), fixed);
        }
        out_rows.push(corrected);
    }

    tracing::info!(
        rows = out_rows.len(),
        corrections = corrections.len(),
        "normalization complete"
    );

    CorrectionOutcome {
        rows: out_rows,
        corrections,
    }
}

fn changed(column: &str, original: &Cell, fixed: &Cell) -> bool {
    if column == columns::PRICE {
        amount_of(original) != amount_of(fixed)
    } else {
        original.display().trim() != fixed.display().trim()
    }
}

fn amount_of(cell: &Cell) -> Option<f64> {
    match cell {
        Cell::Empty => None,
        Cell::Number { value, .. } => Some(*value),
        Cell::Text(text) => parse_amount(text),
    }
}

/// Applies the column policy to one cell.
///
/// Steps, in order: scientific-notation reversal, diacritic stripping, then
/// the column-specific rewrite. Empty stays empty; any rewrite that ends up
/// empty becomes [`Cell::Empty`]. The result never matches the
/// scientific-notation shape, which keeps a second pass a no-op.
pub fn normalize_cell(column: &str, cell: &Cell) -> Cell {
    let text = match cell {
        Cell::Empty => return Cell::Empty,
        Cell::Number { value, .. } if column == columns::PRICE => {
            return Cell::Text(render_amount(*value));
        }
        Cell::Number { text, .. } | Cell::Text(text) => text,
    };

    let text = reverse_scientific(text.trim()).unwrap_or_else(|| text.clone());
    let text = strip_diacritics(&text);
    let fixed = apply_policy(column, &text);

    // Truncation and whitespace removal can expose a mangled number; its
    // plain digits go through the policy once more.
    let fixed = match reverse_scientific(&fixed) {
        Some(plain) => apply_policy(column, &plain),
        None => fixed,
    };
    Cell::from(fixed)
}

fn apply_policy(column: &str, text: &str) -> String {
    match column {
        columns::PRODUCT_GROUP => compact_group(text),
        columns::PRODUCT_NAME => truncate_chars(text.trim(), columns::PRODUCT_NAME_MAX_CHARS)
            .trim_end()
            .to_owned(),
        columns::PRICE => parse_amount(text).map_or_else(|| text.trim().to_owned(), render_amount),
        rate if columns::RATE_COLUMNS.contains(&rate) => text
            .chars()
            .filter(|c| !c.is_whitespace())
            .map(|c| if c == '.' { ',' } else { c })
            .collect(),
        _ => text.trim().to_owned(),
    }
}
