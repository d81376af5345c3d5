/// Violation types and the rule dispatcher for catalog validation.
///
/// [`validate`] evaluates a [`RuleTable`] against every non-blank row and
/// returns a [`ValidationResult`]: violations grouped per row, rows in source
/// line order. Per-row predicates are evaluated by [`checks::evaluate`];
/// uniqueness is collected across the whole row set and appended after each
/// row's own violations.
pub mod checks;

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use indexmap::IndexMap;
use serde::Serialize;

use crate::columns;
use crate::row::{Row, RowRef};
use crate::rules::{Check, Predicate, RuleTable};
use crate::text::display_value;

#[cfg(test)]
mod tests;

// ---------------------------------------------------------------------------
// Violation
// ---------------------------------------------------------------------------

/// One failed predicate on one cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    /// Row the violation belongs to.
    pub row: RowRef,
    /// Column name.
    pub column: String,
    /// Offending value as displayed: `"<trimmed>"` or `vazio`.
    pub value: String,
    /// Kind of check that failed.
    pub check: Check,
    /// Human-readable message.
    pub message: String,
    /// For uniqueness violations, every source line sharing the value
    /// (this row included), ascending. Empty otherwise.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub duplicate_lines: Vec<u32>,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "linha {} {}: {} {}",
            self.row.line, self.column, self.value, self.message
        )
    }
}

// ---------------------------------------------------------------------------
// RowViolations
// ---------------------------------------------------------------------------

/// All violations of one row, with identifying fields for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowViolations {
    /// The row.
    pub row: RowRef,
    /// Trimmed internal code, when present.
    pub internal_code: Option<String>,
    /// Trimmed product name, when present.
    pub product_name: Option<String>,
    /// Per-row violations first, then uniqueness violations.
    pub violations: Vec<Violation>,
}

impl RowViolations {
    fn for_row(row: &Row) -> Self {
        Self {
            row: row.reference(),
            internal_code: row.non_blank(columns::INTERNAL_CODE).map(str::to_owned),
            product_name: row.non_blank(columns::PRODUCT_NAME).map(str::to_owned),
            violations: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// ValidationResult
// ---------------------------------------------------------------------------

/// Output of one validator pass.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ValidationResult {
    /// Rows with at least one violation, ascending by source line.
    pub rows: Vec<RowViolations>,
}

impl ValidationResult {
    /// Returns `true` if no row has a violation.
    pub fn is_clean(&self) -> bool {
        self.rows.is_empty()
    }

    /// Total number of violations.
    pub fn violation_count(&self) -> usize {
        self.rows.iter().map(|r| r.violations.len()).sum()
    }

    /// Iterates all violations in row order.
    pub fn violations(&self) -> impl Iterator<Item = &Violation> {
        self.rows.iter().flat_map(|r| r.violations.iter())
    }

    /// Row indices (positions among extracted rows) with a violation.
    pub fn invalid_indices(&self) -> BTreeSet<usize> {
        self.rows.iter().map(|r| r.row.index).collect()
    }

    /// Violations for the row at `line`, if any.
    pub fn for_line(&self, line: u32) -> Option<&RowViolations> {
        self.rows.iter().find(|r| r.row.line == line)
    }

    /// Violations whose check is `check`.
    pub fn by_check(&self, check: Check) -> impl Iterator<Item = &Violation> {
        self.violations().filter(move |v| v.check == check)
    }
}

// ---------------------------------------------------------------------------
// validate
// ---------------------------------------------------------------------------

/// Evaluates `rules` against `rows`.
///
/// Blank rows are skipped entirely. For each remaining row, every rule is
/// evaluated in table order and every predicate of the rule in its own
/// order. Uniqueness groups are built over all non-blank rows; a group with
/// two or more members produces one violation per member, listing every
/// member's line. The result is deterministic for identical input.
pub fn validate(rows: &[Row], rules: &RuleTable) -> ValidationResult {
    let mut by_row: BTreeMap<RowRef, RowViolations> = BTreeMap::new();
    let mut groups: IndexMap<&str, IndexMap<&str, Vec<&Row>>> = rules
        .unique_columns()
        .map(|column| (column, IndexMap::new()))
        .collect();

    for row in rows.iter().filter(|r| !r.is_blank()) {
        let mut found = Vec::new();

        for rule in rules.rules() {
            for predicate in &rule.predicates {
                match predicate {
                    Predicate::Unique => {
                        if let (Some(value), Some(group)) = (
                            row.non_blank(&rule.column),
                            groups.get_mut(rule.column.as_str()),
                        ) {
                            group.entry(value).or_default().push(row);
                        }
                    }
                    Predicate::Required
                    | Predicate::RequiredIf { .. }
                    | Predicate::Digits { .. }
                    | Predicate::Length { .. }
                    | Predicate::MaxLength { .. }
                    | Predicate::Min { .. }
                    | Predicate::Pattern { .. } => {
                        if let Some(message) = checks::evaluate(predicate, row, &rule.column) {
                            found.push(Violation {
                                row: row.reference(),
                                column: rule.column.clone(),
                                value: display_value(row.text(&rule.column)),
                                check: predicate.check(),
                                message,
                                duplicate_lines: Vec::new(),
                            });
                        }
                    }
                }
            }
        }

        if !found.is_empty() {
            tracing::debug!(line = row.line, count = found.len(), "row violations");
            by_row
                .entry(row.reference())
                .or_insert_with(|| RowViolations::for_row(row))
                .violations
                .extend(found);
        }
    }

    for (column, values) in &groups {
        for (value, members) in values {
            if members.len() < 2 {
                continue;
            }
            let mut lines: Vec<u32> = members.iter().map(|r| r.line).collect();
            lines.sort_unstable();
            let message = checks::duplicate_message(&lines);
            for member in members {
                by_row
                    .entry(member.reference())
                    .or_insert_with(|| RowViolations::for_row(member))
                    .violations
                    .push(Violation {
                        row: member.reference(),
                        column: (*column).to_owned(),
                        value: display_value(value),
                        check: Check::Unique,
                        message: message.clone(),
                        duplicate_lines: lines.clone(),
                    });
            }
        }
    }

    let result = ValidationResult {
        rows: by_row.into_values().collect(),
    };
    tracing::info!(
        rows = result.rows.len(),
        violations = result.violation_count(),
        "validation pass complete"
    );
    result
}
