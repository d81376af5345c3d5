/// Format-neutral export data built from a processed catalog.
///
/// Writers (see `nfkit-excel`) turn these into workbooks. The catalog export
/// reproduces the source layout: preamble rows verbatim, then one row per
/// item in the original column order.
use serde::Serialize;

use crate::columns;
use crate::correction::Correction;
use crate::grid::Cell;
use crate::session::ProcessedCatalog;
use crate::validation::ValidationResult;

/// Which rows of a catalog to export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RowSubset {
    /// Rows with no post-correction violation.
    Valid,
    /// Rows with at least one post-correction violation.
    Invalid,
    /// Every non-blank row.
    All,
}

/// The four exportable documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExportKind {
    /// Valid rows in the source layout.
    Valid,
    /// Invalid rows in the source layout.
    Invalid,
    /// Correction table.
    Corrections,
    /// Violation table.
    Violations,
}

impl ExportKind {
    /// All kinds in a stable order.
    pub const ALL: [Self; 4] = [
        Self::Valid,
        Self::Invalid,
        Self::Corrections,
        Self::Violations,
    ];

    /// Default output file name.
    pub fn file_name(self) -> &'static str {
        match self {
            Self::Valid => "produtos_validos.xlsx",
            Self::Invalid => "produtos_invalidos.xlsx",
            Self::Corrections => "detalhes_correcoes.xlsx",
            Self::Violations => "inconsistencias_pos_correcao.xlsx",
        }
    }
}

// ---------------------------------------------------------------------------
// Catalog export
// ---------------------------------------------------------------------------

/// A catalog document ready to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogExport {
    /// Sheet name, taken from the source section.
    pub sheet_name: String,
    /// Rows before the data region, verbatim.
    pub preamble: Vec<Vec<Cell>>,
    /// Header names in output order.
    pub columns: Vec<String>,
    /// One text row per item, aligned with `columns`.
    pub rows: Vec<Vec<String>>,
    /// Positions in `columns` that must be written as text.
    pub text_columns: Vec<usize>,
}

impl CatalogExport {
    /// Returns `true` if column `position` must be written as text.
    pub fn is_text_column(&self, position: usize) -> bool {
        self.text_columns.contains(&position)
    }
}

/// Builds the export of `subset` from corrected rows.
pub fn catalog_export(processed: &ProcessedCatalog, subset: RowSubset) -> CatalogExport {
    let rows = processed
        .rows(subset)
        .into_iter()
        .map(|row| {
            processed
                .columns
                .iter()
                .map(|c| row.text(c).to_owned())
                .collect()
        })
        .collect();

    let text_columns = processed
        .columns
        .iter()
        .enumerate()
        .filter(|(_, c)| columns::TEXT_EXPORT_COLUMNS.contains(&c.as_str()))
        .map(|(i, _)| i)
        .collect();

    CatalogExport {
        sheet_name: processed.section.clone(),
        preamble: processed.preamble.clone(),
        columns: processed.columns.clone(),
        rows,
        text_columns,
    }
}

// ---------------------------------------------------------------------------
// Flat tables
// ---------------------------------------------------------------------------

/// Sheet name of the correction table.
pub const CORRECTIONS_SHEET: &str = "Correcoes";

/// Sheet name of the violation table.
pub const VIOLATIONS_SHEET: &str = "Erros";

/// One row of the correction table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CorrectionRecord {
    /// Source line.
    #[serde(rename = "Linha")]
    pub line: u32,
    /// Column name.
    #[serde(rename = "Coluna")]
    pub column: String,
    /// Original text, changed spaces shown as `␠`.
    #[serde(rename = "Antes")]
    pub before: String,
    /// Corrected text, changed spaces shown as `␠`.
    #[serde(rename = "Depois")]
    pub after: String,
}

impl CorrectionRecord {
    /// Table headers, in field order.
    pub const HEADERS: [&'static str; 4] = ["Linha", "Coluna", "Antes", "Depois"];

    /// Field values as text, in header order.
    pub fn fields(&self) -> [String; 4] {
        [
            self.line.to_string(),
            self.column.clone(),
            self.before.clone(),
            self.after.clone(),
        ]
    }
}

/// One row of the violation table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ViolationRecord {
    /// Source line.
    #[serde(rename = "Linha")]
    pub line: u32,
    /// Internal code of the row, empty when absent.
    #[serde(rename = "Código Interno")]
    pub internal_code: String,
    /// Product name of the row, empty when absent.
    #[serde(rename = "Nome Produto")]
    pub product_name: String,
    /// Column name.
    #[serde(rename = "Coluna")]
    pub column: String,
    /// Offending value as displayed.
    #[serde(rename = "Valor Atual")]
    pub value: String,
    /// Message.
    #[serde(rename = "Erro")]
    pub message: String,
}

impl ViolationRecord {
    /// Table headers, in field order.
    pub const HEADERS: [&'static str; 6] = [
        "Linha",
        "Código Interno",
        "Nome Produto",
        "Coluna",
        "Valor Atual",
        "Erro",
    ];

    /// Field values as text, in header order.
    pub fn fields(&self) -> [String; 6] {
        [
            self.line.to_string(),
            self.internal_code.clone(),
            self.product_name.clone(),
            self.column.clone(),
            self.value.clone(),
            self.message.clone(),
        ]
    }
}

/// Flattens corrections into table records.
///
/// `Antes` and `Depois` carry the diff-annotated texts, so that spaces
/// removed or added by a correction stay visible in a spreadsheet.
pub fn correction_records(corrections: &[Correction]) -> Vec<CorrectionRecord> {
    corrections
        .iter()
        .map(|c| CorrectionRecord {
            line: c.row.line,
            column: c.column.clone(),
            before: c.before_marked.render("", ""),
            after: c.after_marked.render("", ""),
        })
        .collect()
}

/// Flattens a validation result into one record per violation.
pub fn violation_records(result: &ValidationResult) -> Vec<ViolationRecord> {
    result
        .rows
        .iter()
        .flat_map(|group| {
            group.violations.iter().map(move |v| ViolationRecord {
                line: v.row.line,
                internal_code: group.internal_code.clone().unwrap_or_default(),
                product_name: group.product_name.clone().unwrap_or_default(),
                column: v.column.clone(),
                value: v.value.clone(),
                message: v.message.clone(),
            })
        })
        .collect()
}
