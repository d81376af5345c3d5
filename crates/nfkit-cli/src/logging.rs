//! Logging setup using `tracing` and `tracing-subscriber`.
//!
//! The library crates emit `tracing` events; this module installs the only
//! subscriber. Logs always go to stderr so stdout stays machine-readable.
//!
//! # Log Levels
//!
//! - `error`: only with `--quiet`
//! - `warn`: default; recoverable oddities such as duplicate headers
//! - `info`: with `--verbose`; pipeline stage progress and counts
//! - `debug`: per-row and per-cell detail, via `RUST_LOG`
//!
//! `RUST_LOG` overrides the level chosen from the flags.

use tracing::Level;
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, MakeWriter},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

use crate::cli::OutputFormat;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Compact single-line text.
    Compact,
    /// JSON objects for machine parsing.
    Json,
}

/// Configuration for logging behavior.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Level for the nfkit crates when `RUST_LOG` is unset.
    pub level: Level,
    /// Output format.
    pub format: LogFormat,
    /// Whether to use ANSI colors in text output.
    pub with_ansi: bool,
}

impl LogConfig {
    /// Derives the configuration from the global CLI flags.
    #[must_use]
    pub fn from_flags(quiet: bool, verbose: bool, output: OutputFormat, colors: bool) -> Self {
        let level = if quiet {
            Level::ERROR
        } else if verbose {
            Level::INFO
        } else {
            Level::WARN
        };
        let format = match output {
            OutputFormat::Human => LogFormat::Compact,
            OutputFormat::Json => LogFormat::Json,
        };
        Self {
            level,
            format,
            with_ansi: colors && format == LogFormat::Compact,
        }
    }
}

/// Installs the global subscriber writing to stderr.
///
/// Returns `false` if a subscriber was already installed.
pub fn init_logging(config: &LogConfig) -> bool {
    init_logging_with_writer(config, std::io::stderr)
}

/// Installs the global subscriber with a custom writer.
///
/// Returns `false` if a subscriber was already installed.
pub fn init_logging_with_writer<W>(config: &LogConfig, writer: W) -> bool
where
    W: for<'writer> MakeWriter<'writer> + Send + Sync + 'static,
{
    let filter = build_env_filter(config.level);

    match config.format {
        LogFormat::Json => {
            let layer = fmt::layer().json().with_writer(writer).with_target(true);
            tracing_subscriber::registry()
                .with(filter)
                .with(layer)
                .try_init()
                .is_ok()
        }
        LogFormat::Compact => {
            let layer = fmt::layer()
                .compact()
                .with_writer(writer)
                .with_ansi(config.with_ansi)
                .with_target(false)
                .without_time();
            tracing_subscriber::registry()
                .with(filter)
                .with(layer)
                .try_init()
                .is_ok()
        }
    }
}

/// Builds an `EnvFilter` from `level`, letting `RUST_LOG` take precedence.
fn build_env_filter(level: Level) -> EnvFilter {
    let level = level.as_str().to_lowercase();
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "{level},nfkit_cli={level},nfkit_core={level},nfkit_excel={level},nfkit_xml={level}"
        ))
    })
}
