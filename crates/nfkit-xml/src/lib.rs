//! XML adapters for nfkit.
//!
//! - [`spreadsheet`]: catalog grids from `Planilha` XML and Excel 2003
//!   SpreadsheetML.
//! - [`fiscal`]: identifying fields of NF-e and CT-e documents.
//! - [`minify`](mod@minify): whitespace minification.
//! - [`order`]: hub order JSON built from an NF-e.
//! - [`archive`]: recursive ZIP walking, key filtering, organized re-packing
//!   and summaries.
//!
//! `quick-xml` and `zip` are confined to this crate.
#![deny(clippy::print_stdout, clippy::print_stderr)]

pub mod archive;
pub mod error;
pub mod fiscal;
pub mod minify;
pub mod order;
pub mod spreadsheet;

pub use archive::{
    ArchiveLimits, Entry, FileSize, Summary, collect_input, filter_by_keys, minify_entries,
    organize, parse_keys, summarize, walk_zip,
};
pub use error::XmlError;
pub use fiscal::FiscalFields;
pub use minify::minify;
pub use order::{HubDefaults, Order};
pub use spreadsheet::read_xml_grid;
