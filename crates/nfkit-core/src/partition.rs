/// Splits rows into valid and invalid sets from the post-correction result.
use serde::Serialize;

use crate::row::Row;
use crate::validation::ValidationResult;

/// Row classification after correction.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Partition {
    /// Indices of rows with no post-correction violation.
    pub valid: Vec<usize>,
    /// Indices of rows with at least one post-correction violation.
    pub invalid: Vec<usize>,
    /// Rows invalid before correction and valid after.
    pub auto_adjusted: usize,
    /// Rows valid before correction and invalid after, e.g. two names that
    /// collide once truncated.
    pub regressed: usize,
}

/// Classifies `rows` using `after`; `before` only feeds the diagnostic
/// counters.
pub fn partition(rows: &[Row], before: &ValidationResult, after: &ValidationResult) -> Partition {
    let invalid_before = before.invalid_indices();
    let invalid_after = after.invalid_indices();

    let mut out = Partition::default();
    for row in rows.iter().filter(|r| !r.is_blank()) {
        let was_invalid = invalid_before.contains(&row.index);
        let is_invalid = invalid_after.contains(&row.index);
        if is_invalid {
            out.invalid.push(row.index);
        } else {
            out.valid.push(row.index);
        }
        match (was_invalid, is_invalid) {
            (true, false) => out.auto_adjusted += 1,
            (false, true) => out.regressed += 1,
            (true, true) | (false, false) => {}
        }
    }

    tracing::info!(
        valid = out.valid.len(),
        invalid = out.invalid.len(),
        auto_adjusted = out.auto_adjusted,
        regressed = out.regressed,
        "rows partitioned"
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{Predicate, Rule, RuleTable};
    use crate::validation::validate;

    fn table() -> RuleTable {
        RuleTable::new(vec![Rule::new(
            "N",
            vec![Predicate::Unique, Predicate::MaxLength { count: 3 }],
        )])
    }

    #[test]
    fn counts_adjusted_and_regressed_rows() {
        let before_rows = vec![
            Row::new(0, 7).with("N", "abcd"),
            Row::new(1, 8).with("N", "xyz"),
            Row::new(2, 9).with("N", "abc"),
        ];
        let after_rows = vec![
            Row::new(0, 7).with("N", "abc"),
            Row::new(1, 8).with("N", "xyz"),
            Row::new(2, 9).with("N", "abc"),
        ];
        let before = validate(&before_rows, &table());
        let after = validate(&after_rows, &table());
        let p = partition(&after_rows, &before, &after);
        assert_eq!(p.valid, vec![1]);
        assert_eq!(p.invalid, vec![0, 2]);
        assert_eq!(p.auto_adjusted, 0);
        assert_eq!(p.regressed, 1);
    }

    #[test]
    fn fixed_row_counts_as_auto_adjusted() {
        let before_rows = vec![Row::new(0, 7).with("N", "abcd")];
        let after_rows = vec![Row::new(0, 7).with("N", "abc")];
        let before = validate(&before_rows, &table());
        let after = validate(&after_rows, &table());
        let p = partition(&after_rows, &before, &after);
        assert_eq!(p.valid, vec![0]);
        assert_eq!(p.auto_adjusted, 1);
    }
}
