/// Errors produced while reading or writing `.xlsx` workbooks.
use nfkit_core::DocumentShapeError;

/// Failure to turn a workbook into a catalog section.
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    /// The bytes are not a readable `.xlsx` workbook.
    #[error("Excel read error: {detail}")]
    ExcelRead {
        /// Human-readable description of the error.
        detail: String,
    },

    /// The workbook has no catalog section.
    #[error(transparent)]
    Shape(#[from] DocumentShapeError),
}

/// Failure to build or write a workbook.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// `rust_xlsxwriter` rejected an operation.
    #[error("Excel write error: {detail}")]
    ExcelWrite {
        /// Human-readable description of the error.
        detail: String,
    },

    /// Writing the finished workbook failed.
    #[error("I/O error: {detail}")]
    Io {
        /// Human-readable description of the error.
        detail: String,
    },
}
