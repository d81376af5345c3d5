/// Errors of the `nfkit` binary and their exit codes.
///
/// [`CliError`] is the top-level error type for the `nfkit` binary. Every
/// variant maps to a stable exit code via [`CliError::exit_code`]:
///
/// - Exit code **2**: input failure. The document could not be read, parsed
///   or located, or an output file could not be written.
/// - Exit code **1**: logical failure. The command ran to completion but
///   invalid rows remain, or some documents could not be converted.
use std::fmt;
use std::path::PathBuf;

// ---------------------------------------------------------------------------
// CliError
// ---------------------------------------------------------------------------

/// All error conditions that the `nfkit` CLI can produce.
#[derive(Debug)]
pub enum CliError {
    // --- Exit code 2: input failures ---
    /// An input path does not exist.
    FileNotFound {
        /// Missing path.
        path: PathBuf,
    },

    /// An input or output path is not accessible.
    PermissionDenied {
        /// Inaccessible path.
        path: PathBuf,
    },

    /// The input exceeds the configured `--max-file-size` limit.
    FileTooLarge {
        /// The filesystem path.
        source: String,
        /// `--max-file-size`, in bytes.
        limit: u64,
        /// The actual size in bytes.
        actual: u64,
    },

    /// An XML catalog or rules file is not UTF-8.
    InvalidUtf8 {
        /// The filesystem path.
        source: String,
        /// Offset of the first bad byte.
        byte_offset: usize,
    },

    /// The catalog file is neither `.xlsx` nor `.xml`.
    UnsupportedInput {
        /// The offending path.
        path: PathBuf,
    },

    /// The document is corrupt or not a spreadsheet.
    CorruptDocument {
        /// The filesystem path.
        source: String,
        /// Reader message.
        detail: String,
    },

    /// The document was read but has no usable catalog section.
    DocumentShape {
        /// The filesystem path.
        source: String,
        /// Shape error message (missing section or too few rows).
        detail: String,
    },

    /// A `--rules` file could not be loaded.
    InvalidRules {
        /// The rules file.
        source: String,
        /// Loader message.
        detail: String,
    },

    /// An XML archive could not be walked or re-packed.
    ArchiveFailed {
        /// The archive path.
        source: String,
        /// Archive error message.
        detail: String,
    },

    /// A preset file or the resolved preset is unusable.
    InvalidPreset {
        /// The preset file, or the preset name.
        source: String,
        /// What is wrong with it.
        detail: String,
    },

    /// Any other read or write failure.
    IoError {
        /// The path being read or written.
        source: String,
        /// `std::io::Error` text.
        detail: String,
    },

    // --- Exit code 1: logical failures ---
    /// Rows with violations remain after correction.
    ///
    /// The violations have already been printed; this variant exists so
    /// `main` can exit with code 1 cleanly.
    InvalidRows {
        /// Number of invalid rows.
        count: usize,
    },

    /// Some XML documents could not be turned into orders; the others were
    /// printed.
    UnconvertedDocuments {
        /// Number of documents skipped.
        count: usize,
    },
}

impl CliError {
    /// Exit code: 2 for input failures, 1 for logical failures.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::FileNotFound { .. }
            | Self::PermissionDenied { .. }
            | Self::FileTooLarge { .. }
            | Self::InvalidUtf8 { .. }
            | Self::UnsupportedInput { .. }
            | Self::CorruptDocument { .. }
            | Self::DocumentShape { .. }
            | Self::InvalidRules { .. }
            | Self::ArchiveFailed { .. }
            | Self::InvalidPreset { .. }
            | Self::IoError { .. } => 2,

            Self::InvalidRows { .. } | Self::UnconvertedDocuments { .. } => 1,
        }
    }

    /// One-line message for stderr, prefixed with `error: `.
    pub fn message(&self) -> String {
        match self {
            Self::FileNotFound { path } => {
                format!("error: file not found: {}", path.display())
            }
            Self::PermissionDenied { path } => {
                format!("error: permission denied: {}", path.display())
            }
            Self::FileTooLarge {
                source,
                limit,
                actual,
            } => {
                format!("error: file too large: {source} is {actual} bytes, limit is {limit} bytes")
            }
            Self::InvalidUtf8 {
                source,
                byte_offset,
            } => {
                format!(
                    "error: invalid UTF-8 in {source}: first invalid byte at offset {byte_offset}"
                )
            }
            Self::UnsupportedInput { path } => {
                format!(
                    "error: unsupported catalog file {}: expected .xlsx or .xml",
                    path.display()
                )
            }
            Self::CorruptDocument { source, detail } => {
                format!("error: could not read {source}: {detail}")
            }
            Self::DocumentShape { source, detail } => {
                format!("error: {source}: {detail}")
            }
            Self::InvalidRules { source, detail } => {
                format!("error: could not load rules from {source}: {detail}")
            }
            Self::ArchiveFailed { source, detail } => {
                format!("error: archive {source}: {detail}")
            }
            Self::InvalidPreset { source, detail } => {
                format!("error: preset {source}: {detail}")
            }
            Self::IoError { source, detail } => {
                format!("error: I/O error on {source}: {detail}")
            }
            Self::InvalidRows { count } => {
                let (noun, verb) = if *count == 1 {
                    ("row", "remains")
                } else {
                    ("rows", "remain")
                };
                format!("error: {count} invalid {noun} {verb} after correction")
            }
            Self::UnconvertedDocuments { count } => {
                let noun = if *count == 1 { "document" } else { "documents" };
                format!("error: {count} XML {noun} could not be converted")
            }
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}

impl std::error::Error for CliError {}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
