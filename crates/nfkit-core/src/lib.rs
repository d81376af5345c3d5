#![deny(clippy::print_stdout, clippy::print_stderr)]

pub mod columns;
pub mod correction;
pub mod export;
pub mod extract;
pub mod grid;
pub mod number;
pub mod partition;
pub mod row;
pub mod rules;
pub mod session;
pub mod text;
pub mod validation;

pub use correction::{Correction, CorrectionOutcome, correct, normalize_cell};
pub use export::{
    CORRECTIONS_SHEET, CatalogExport, CorrectionRecord, ExportKind, RowSubset, VIOLATIONS_SHEET,
    ViolationRecord, catalog_export, correction_records, violation_records,
};
pub use extract::{DocumentShapeError, Extraction, SheetLayout, extract, find_section};
pub use grid::{Cell, Grid, Section};
pub use number::{parse_amount, render_amount};
pub use partition::{Partition, partition};
pub use row::{Row, RowRef};
pub use rules::{Check, Pattern, Predicate, Rule, RuleTable, RuleTableError, RuleVariant};
pub use session::{PipelineConfig, ProcessedCatalog, Session, Summary, process};
pub use text::{AnnotatedText, Segment, annotate_diff, strip_diacritics};
pub use validation::{RowViolations, ValidationResult, Violation, validate};
