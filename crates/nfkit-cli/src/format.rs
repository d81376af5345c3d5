/// Output formatting: human-readable and JSON (NDJSON) modes.
///
/// - **Human mode** (default): one line per violation, correction or file,
///   with the tag and changed characters colored when colors are enabled.
///   Colors are disabled when `--no-color` is set, the `NO_COLOR`
///   environment variable is present (per <https://no-color.org>), or stdout
///   is not a TTY.
/// - **JSON mode**: every item is a single-line JSON object (NDJSON) keyed by
///   its kind (`violation`, `correction`, `file`, `summary`, `order`, `curl`).
///
/// Both modes honour **quiet** (nothing but errors) and **verbose**
/// (corrections and timing).
use std::io::{IsTerminal as _, Write};
use std::time::Duration;

use nfkit_core::{AnnotatedText, Correction, Summary, Violation};
use nfkit_xml::{Entry, Order};
use serde::Serialize;

use crate::cli::OutputFormat;

// ---------------------------------------------------------------------------
// Color support detection
// ---------------------------------------------------------------------------

/// Returns `true` if ANSI color codes should be emitted to stdout.
pub fn colors_enabled(no_color_flag: bool) -> bool {
    if no_color_flag {
        return false;
    }
    if std::env::var_os("NO_COLOR").is_some() {
        return false;
    }
    std::io::stdout().is_terminal()
}

// ---------------------------------------------------------------------------
// ANSI escape sequences
// ---------------------------------------------------------------------------

const ANSI_RED: &str = "\x1b[31m";
const ANSI_YELLOW: &str = "\x1b[33m";
const ANSI_GREEN: &str = "\x1b[32m";
const ANSI_RESET: &str = "\x1b[0m";

// ---------------------------------------------------------------------------
// FormatterConfig
// ---------------------------------------------------------------------------

/// Configuration for the formatter, derived from CLI flags.
#[derive(Debug, Clone, Copy)]
pub struct FormatterConfig {
    /// Human or JSON.
    pub mode: OutputFormat,
    /// Whether ANSI colors are enabled.
    pub colors: bool,
    /// Suppress everything but errors.
    pub quiet: bool,
    /// Include corrections and timing.
    pub verbose: bool,
}

impl FormatterConfig {
    /// Constructs a [`FormatterConfig`] from the raw CLI flags.
    pub fn from_flags(mode: OutputFormat, no_color_flag: bool, quiet: bool, verbose: bool) -> Self {
        Self {
            mode,
            colors: mode == OutputFormat::Human && colors_enabled(no_color_flag),
            quiet,
            verbose,
        }
    }
}

// ---------------------------------------------------------------------------
// Catalog output
// ---------------------------------------------------------------------------

/// Writes one violation.
///
/// Human format: `[E] linha 8  NFCeNCM "123": deve conter exatamente 8 dígitos`
///
/// # Errors
///
/// Returns an error only if writing to `writer` fails.
pub fn write_violation<W: Write>(
    writer: &mut W,
    violation: &Violation,
    config: &FormatterConfig,
) -> std::io::Result<()> {
    if config.quiet {
        return Ok(());
    }
    match config.mode {
        OutputFormat::Json => write_json_line(writer, "violation", violation),
        OutputFormat::Human => {
            let tag = paint("[E]", ANSI_RED, config.colors);
            writeln!(
                writer,
                "{tag} linha {line}  {column} {value}: {message}",
                line = violation.row.line,
                column = violation.column,
                value = violation.value,
                message = violation.message,
            )
        }
    }
}

/// Writes one correction. Only emitted in verbose mode.
///
/// Human format: `[C] linha 7  Nome Produto: Pão Francês -> Pao Frances`,
/// with the differing characters colored on each side.
///
/// # Errors
///
/// Returns an error only if writing to `writer` fails.
pub fn write_correction<W: Write>(
    writer: &mut W,
    correction: &Correction,
    config: &FormatterConfig,
) -> std::io::Result<()> {
    if config.quiet || !config.verbose {
        return Ok(());
    }
    match config.mode {
        OutputFormat::Json => write_json_line(writer, "correction", correction),
        OutputFormat::Human => {
            let tag = paint("[C]", ANSI_YELLOW, config.colors);
            writeln!(
                writer,
                "{tag} linha {line}  {column}: {before} -> {after}",
                line = correction.row.line,
                column = correction.column,
                before = marked(&correction.before_marked, ANSI_RED, config.colors),
                after = marked(&correction.after_marked, ANSI_GREEN, config.colors),
            )
        }
    }
}

/// Writes the headline counts.
///
/// Human format: `3 rows, 2 valid, 1 invalid, 1 auto-adjusted, 4 corrections`
///
/// # Errors
///
/// Returns an error only if writing to `writer` fails.
pub fn write_summary<W: Write>(
    writer: &mut W,
    summary: &Summary,
    config: &FormatterConfig,
) -> std::io::Result<()> {
    if config.quiet {
        return Ok(());
    }
    match config.mode {
        OutputFormat::Json => write_json_line(writer, "summary", summary),
        OutputFormat::Human => writeln!(writer, "{summary}"),
    }
}

/// Writes the path of a file produced by `export` or `xml --organize`.
///
/// # Errors
///
/// Returns an error only if writing to `writer` fails.
pub fn write_output_file<W: Write>(
    writer: &mut W,
    path: &std::path::Path,
    config: &FormatterConfig,
) -> std::io::Result<()> {
    if config.quiet {
        return Ok(());
    }
    match config.mode {
        OutputFormat::Json => write_json_line(writer, "written", &path.display().to_string()),
        OutputFormat::Human => writeln!(writer, "wrote {}", path.display()),
    }
}

/// Writes timing information in verbose human mode.
///
/// # Errors
///
/// Returns an error only if writing to `writer` fails.
pub fn write_timing<W: Write>(
    writer: &mut W,
    label: &str,
    duration: Duration,
    config: &FormatterConfig,
) -> std::io::Result<()> {
    if !config.verbose || config.quiet || config.mode == OutputFormat::Json {
        return Ok(());
    }
    writeln!(writer, "{label} in {}ms", duration.as_millis())
}

// ---------------------------------------------------------------------------
// XML output
// ---------------------------------------------------------------------------

/// Writes one collected file.
///
/// Human format for XML files: name, access key, number, period and nature
/// of operation separated by two spaces, `-` for missing values. Other files
/// show their size.
///
/// # Errors
///
/// Returns an error only if writing to `writer` fails.
pub fn write_entry<W: Write>(
    writer: &mut W,
    entry: &Entry,
    config: &FormatterConfig,
) -> std::io::Result<()> {
    if config.quiet {
        return Ok(());
    }
    match config.mode {
        OutputFormat::Json => write_json_line(
            writer,
            "file",
            &EntryLine {
                name: &entry.name,
                size: entry.size(),
                fiscal: entry.fiscal.as_ref(),
            },
        ),
        OutputFormat::Human => match &entry.fiscal {
            Some(f) => writeln!(
                writer,
                "{}  {}  {}  {}  {}",
                entry.name,
                dash(&f.access_key),
                dash(&f.number),
                f.period(),
                f.nat_op_folder()
            ),
            None => writeln!(writer, "{}  ({} bytes)", entry.name, entry.size()),
        },
    }
}

/// Writes an archive summary.
///
/// # Errors
///
/// Returns an error only if writing to `writer` fails.
pub fn write_archive_summary<W: Write>(
    writer: &mut W,
    summary: &nfkit_xml::Summary,
    config: &FormatterConfig,
) -> std::io::Result<()> {
    if config.quiet {
        return Ok(());
    }
    match config.mode {
        OutputFormat::Json => write_json_line(writer, "summary", summary),
        OutputFormat::Human => write!(writer, "{summary}"),
    }
}

// ---------------------------------------------------------------------------
// Order output
// ---------------------------------------------------------------------------

/// Writes the hub order converted from `file`.
///
/// Human format: `Arquivo: <file>` followed by the pretty-printed order.
///
/// # Errors
///
/// Returns an error only if writing to `writer` fails.
pub fn write_order<W: Write>(
    writer: &mut W,
    file: &str,
    order: &Order,
    config: &FormatterConfig,
) -> std::io::Result<()> {
    if config.quiet {
        return Ok(());
    }
    match config.mode {
        OutputFormat::Json => write_json_line(writer, "order", &OrderLine { file, order }),
        OutputFormat::Human => {
            writeln!(writer, "Arquivo: {file}")?;
            serde_json::to_writer_pretty(&mut *writer, order).map_err(std::io::Error::other)?;
            writeln!(writer)
        }
    }
}

/// Writes the re-send command for order `id`.
///
/// Human format: the command followed by a blank line, ready to paste into
/// a shell.
///
/// # Errors
///
/// Returns an error only if writing to `writer` fails.
pub fn write_curl<W: Write>(
    writer: &mut W,
    id: &str,
    command: &str,
    config: &FormatterConfig,
) -> std::io::Result<()> {
    if config.quiet {
        return Ok(());
    }
    match config.mode {
        OutputFormat::Json => write_json_line(writer, "curl", &CurlLine { id, command }),
        OutputFormat::Human => writeln!(writer, "{command}\n"),
    }
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct OrderLine<'a> {
    file: &'a str,
    order: &'a Order,
}

#[derive(Serialize)]
struct CurlLine<'a> {
    id: &'a str,
    command: &'a str,
}

#[derive(Serialize)]
struct EntryLine<'a> {
    name: &'a str,
    size: u64,
    fiscal: Option<&'a nfkit_xml::FiscalFields>,
}

/// Writes `{"<key>": value}` followed by a newline.
fn write_json_line<W: Write, T: Serialize + ?Sized>(
    writer: &mut W,
    key: &str,
    value: &T,
) -> std::io::Result<()> {
    let mut object = serde_json::Map::new();
    object.insert(
        key.to_owned(),
        serde_json::to_value(value).map_err(std::io::Error::other)?,
    );
    serde_json::to_writer(&mut *writer, &object).map_err(std::io::Error::other)?;
    writeln!(writer)
}

fn paint(text: &str, color: &str, colors: bool) -> String {
    if colors {
        format!("{color}{text}{ANSI_RESET}")
    } else {
        text.to_owned()
    }
}

/// Renders annotated text, coloring changed runs.
fn marked(text: &AnnotatedText, color: &str, colors: bool) -> String {
    text.segments
        .iter()
        .map(|s| {
            if s.changed {
                paint(&s.text, color, colors)
            } else {
                s.text.clone()
            }
        })
        .collect()
}

fn dash(value: &str) -> &str {
    if value.is_empty() { "-" } else { value }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
