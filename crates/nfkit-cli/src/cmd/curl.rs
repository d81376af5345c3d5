//! Implementation of `nfkit curl <ids...>`.
//!
//! Resolves the settings (a saved preset overridden by explicit flags),
//! optionally saves them back under a name, and prints one CURL command per
//! order id.
use std::path::Path;

use nfkit_xml::parse_keys;

use crate::cli::CurlArgs;
use crate::cmd::stdout_error;
use crate::error::CliError;
use crate::format::{FormatterConfig, write_curl, write_output_file};
use crate::io::{read_text, write_bytes};
use crate::presets::{Preset, PresetBook, parse_presets, presets_to_json};

/// Runs the `curl` command.
///
/// # Errors
///
/// [`CliError::InvalidPreset`] for an unreadable preset file, an unknown
/// preset name, a missing URL or an empty id list; read and write errors for
/// the preset file.
pub fn run(args: &CurlArgs, max_file_size: u64, config: &FormatterConfig) -> Result<(), CliError> {
    let mut book = match &args.presets {
        Some(path) => load_book(path, args.preset.is_some(), max_file_size)?,
        None => PresetBook::new(),
    };

    let base = match &args.preset {
        Some(name) => book.get(name).cloned().ok_or_else(|| CliError::InvalidPreset {
            source: name.clone(),
            detail: format!(
                "not found (available: {})",
                book.keys().cloned().collect::<Vec<_>>().join(", ")
            ),
        })?,
        None => Preset::default(),
    };
    let preset = args.apply(base);
    let label = args.preset.as_deref().unwrap_or("<flags>");
    if preset.url.trim().is_empty() {
        return Err(CliError::InvalidPreset {
            source: label.to_owned(),
            detail: "no URL; pass --url or choose a preset that has one".to_owned(),
        });
    }

    let ids = parse_keys(&args.ids.join(" "));
    if ids.is_empty() {
        return Err(CliError::InvalidPreset {
            source: label.to_owned(),
            detail: "no order ids given".to_owned(),
        });
    }

    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    if let (Some(name), Some(path)) = (&args.save, &args.presets) {
        book.insert(name.clone(), preset.clone());
        let json = presets_to_json(&book).map_err(|e| CliError::InvalidPreset {
            source: path.display().to_string(),
            detail: e.to_string(),
        })?;
        write_bytes(path, json.as_bytes())?;
        tracing::info!(preset = %name, file = %path.display(), "preset saved");
        write_output_file(&mut out, path, config).map_err(stdout_error)?;
    }

    tracing::info!(
        platform = ?preset.platform,
        ids = ids.len(),
        "generating re-send commands"
    );
    for id in &ids {
        write_curl(&mut out, id, &preset.command(id), config).map_err(stdout_error)?;
    }
    Ok(())
}

/// Reads the preset file. A missing file is an empty book unless a preset
/// has to be read from it.
fn load_book(path: &Path, required: bool, max_file_size: u64) -> Result<PresetBook, CliError> {
    let json = match read_text(path, max_file_size) {
        Ok(json) => json,
        Err(CliError::FileNotFound { .. }) if !required => return Ok(PresetBook::new()),
        Err(e) => return Err(e),
    };
    parse_presets(&json).map_err(|e| CliError::InvalidPreset {
        source: path.display().to_string(),
        detail: e.to_string(),
    })
}
