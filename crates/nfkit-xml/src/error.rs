/// Errors produced by the XML and ZIP adapters.
use nfkit_core::DocumentShapeError;

/// All error conditions of this crate.
#[derive(Debug, thiserror::Error)]
pub enum XmlError {
    /// The document is not well-formed XML.
    #[error("XML parse error: {detail}")]
    Parse {
        /// Parser message.
        detail: String,
    },

    /// The root element is neither `Planilha` nor `Workbook`.
    #[error("unsupported spreadsheet XML: root element <{root}>")]
    UnsupportedLayout {
        /// Local name of the root element; empty if the document has none.
        root: String,
    },

    /// The grid does not have the catalog shape.
    #[error(transparent)]
    Shape(#[from] DocumentShapeError),

    /// The archive is corrupt or cannot be written.
    #[error("ZIP error: {detail}")]
    Zip {
        /// Archive library message.
        detail: String,
    },

    /// Nested archives go deeper than allowed.
    #[error("nested archives exceed the maximum depth of {max}")]
    TooDeep {
        /// Configured depth limit.
        max: usize,
    },

    /// The archive holds more entries than allowed.
    #[error("archive holds more than {max} entries")]
    TooManyEntries {
        /// Configured entry limit.
        max: usize,
    },

    /// An entry or the archive as a whole is larger than allowed.
    #[error("{name:?} exceeds the size limit of {max} bytes")]
    TooLarge {
        /// Entry name, or the archive name for total-size overflows.
        name: String,
        /// Configured limit in bytes.
        max: u64,
    },

    /// Reading or writing archive data failed.
    #[error("I/O error: {detail}")]
    Io {
        /// Human-readable description of the error.
        detail: String,
    },
}

impl From<quick_xml::Error> for XmlError {
    fn from(e: quick_xml::Error) -> Self {
        Self::Parse {
            detail: e.to_string(),
        }
    }
}

impl From<quick_xml::events::attributes::AttrError> for XmlError {
    fn from(e: quick_xml::events::attributes::AttrError) -> Self {
        Self::Parse {
            detail: e.to_string(),
        }
    }
}

impl From<zip::result::ZipError> for XmlError {
    fn from(e: zip::result::ZipError) -> Self {
        Self::Zip {
            detail: e.to_string(),
        }
    }
}

impl From<std::io::Error> for XmlError {
    fn from(e: std::io::Error) -> Self {
        Self::Io {
            detail: e.to_string(),
        }
    }
}
