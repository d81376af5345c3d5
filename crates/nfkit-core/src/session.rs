/// Pipeline orchestration and the single-document processing session.
///
/// [`process`] runs extract → validate → correct → validate → partition over
/// one section. [`Session`] holds at most one [`ProcessedCatalog`]; loading a
/// new document replaces it wholesale, and a failed load leaves it empty.
use std::fmt;

use serde::Serialize;

use crate::correction::{Correction, correct};
use crate::export::{
    CatalogExport, CorrectionRecord, RowSubset, ViolationRecord, catalog_export,
    correction_records, violation_records,
};
use crate::extract::{DocumentShapeError, SheetLayout, extract};
use crate::grid::{Cell, Section};
use crate::partition::{Partition, partition};
use crate::row::Row;
use crate::rules::RuleTable;
use crate::validation::{ValidationResult, validate};

/// Layout and rules for one pipeline run.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PipelineConfig {
    /// Where the catalog sits in the document.
    pub layout: SheetLayout,
    /// Rules evaluated on both passes.
    pub rules: RuleTable,
}

/// Everything produced by one pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessedCatalog {
    /// Name of the section the rows came from.
    pub section: String,
    /// Header names in column order.
    pub columns: Vec<String>,
    /// Grid rows up to and including the header.
    pub preamble: Vec<Vec<Cell>>,
    /// Rows as extracted.
    pub original_rows: Vec<Row>,
    /// Rows after normalization.
    pub corrected_rows: Vec<Row>,
    /// Validation of the original rows.
    pub before: ValidationResult,
    /// Validation of the corrected rows.
    pub after: ValidationResult,
    /// Every changed cell.
    pub corrections: Vec<Correction>,
    /// Valid/invalid split of the corrected rows.
    pub partition: Partition,
}

/// Headline counts of a processed catalog.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    /// Non-blank rows.
    pub rows: usize,
    /// Rows without post-correction violations.
    pub valid: usize,
    /// Rows with post-correction violations.
    pub invalid: usize,
    /// Rows fixed by correction.
    pub auto_adjusted: usize,
    /// Rows broken by correction.
    pub regressed: usize,
    /// Changed cells.
    pub corrections: usize,
    /// Violations before correction.
    pub violations_before: usize,
    /// Violations after correction.
    pub violations_after: usize,
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} rows, {} valid, {} invalid, {} auto-adjusted, {} corrections",
            self.rows, self.valid, self.invalid, self.auto_adjusted, self.corrections
        )
    }
}

impl ProcessedCatalog {
    /// Headline counts.
    pub fn summary(&self) -> Summary {
        Summary {
            rows: self.corrected_rows.len(),
            valid: self.partition.valid.len(),
            invalid: self.partition.invalid.len(),
            auto_adjusted: self.partition.auto_adjusted,
            regressed: self.partition.regressed,
            corrections: self.corrections.len(),
            violations_before: self.before.violation_count(),
            violations_after: self.after.violation_count(),
        }
    }

    /// Corrected rows belonging to `subset`, in row order.
    pub fn rows(&self, subset: RowSubset) -> Vec<&Row> {
        let keep: Option<&[usize]> = match subset {
            RowSubset::All => None,
            RowSubset::Valid => Some(self.partition.valid.as_slice()),
            RowSubset::Invalid => Some(self.partition.invalid.as_slice()),
        };
        self.corrected_rows
            .iter()
            .filter(|r| keep.is_none_or(|k| k.binary_search(&r.index).is_ok()))
            .collect()
    }
}

/// Runs the full pipeline over `section`.
///
/// # Errors
///
/// [`DocumentShapeError`] when the grid does not have the catalog shape; no
/// validation is attempted in that case.
pub fn process(
    section: &Section,
    config: &PipelineConfig,
) -> Result<ProcessedCatalog, DocumentShapeError> {
    let extraction = extract(&section.grid, &config.layout)?;

    let before = validate(&extraction.rows, &config.rules);
    let outcome = correct(&extraction.rows, &extraction.columns);
    let after = validate(&outcome.rows, &config.rules);
    let partition = partition(&outcome.rows, &before, &after);

    Ok(ProcessedCatalog {
        section: section.name.clone(),
        columns: extraction.columns,
        preamble: extraction.preamble,
        original_rows: extraction.rows,
        corrected_rows: outcome.rows,
        before,
        after,
        corrections: outcome.corrections,
        partition,
    })
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// Holds the result of the most recent successful load.
#[derive(Debug, Clone, Default)]
pub struct Session {
    current: Option<ProcessedCatalog>,
}

impl Session {
    /// Creates an empty session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Processes `section` and makes it the current state.
    ///
    /// The previous state is discarded before processing starts, so a failed
    /// load leaves the session empty.
    ///
    /// # Errors
    ///
    /// Propagates [`DocumentShapeError`] from [`process`].
    pub fn load(
        &mut self,
        section: &Section,
        config: &PipelineConfig,
    ) -> Result<&ProcessedCatalog, DocumentShapeError> {
        self.current = None;
        let processed = process(section, config)?;
        Ok(self.current.insert(processed))
    }

    /// Clears the current state.
    pub fn reset(&mut self) {
        self.current = None;
    }

    /// The current state, if any.
    pub fn current(&self) -> Option<&ProcessedCatalog> {
        self.current.as_ref()
    }

    /// Returns `true` if a document has been processed.
    pub fn is_loaded(&self) -> bool {
        self.current.is_some()
    }

    /// Catalog export of `subset`; `None` without a processed document.
    pub fn export_catalog(&self, subset: RowSubset) -> Option<CatalogExport> {
        self.current().map(|p| catalog_export(p, subset))
    }

    /// Flat correction list; `None` without a processed document.
    pub fn export_corrections(&self) -> Option<Vec<CorrectionRecord>> {
        self.current().map(|p| correction_records(&p.corrections))
    }

    /// Flat post-correction violation list; `None` without a processed
    /// document.
    pub fn export_violations(&self) -> Option<Vec<ViolationRecord>> {
        self.current().map(|p| violation_records(&p.after))
    }
}
