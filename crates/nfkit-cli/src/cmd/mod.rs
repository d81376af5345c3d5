/// Command module for the `nfkit` CLI.
///
/// Each submodule implements one subcommand. The `run` function in each
/// module takes the parsed arguments and returns `Ok(())` on success or
/// a [`crate::error::CliError`] on failure.
use nfkit_core::{PipelineConfig, ProcessedCatalog, RuleTable, RuleVariant, Session, SheetLayout};

use crate::cli::CatalogArgs;
use crate::error::CliError;
use crate::io::{read_catalog, read_text};

pub mod check;
pub mod curl;
pub mod export;
pub mod order;
pub mod xml;

/// Builds the pipeline configuration from the catalog arguments.
///
/// # Errors
///
/// [`CliError::InvalidRules`] when `--rules` points to an unusable table,
/// plus read errors for that file.
pub fn pipeline_config(args: &CatalogArgs, max_file_size: u64) -> Result<PipelineConfig, CliError> {
    let rules = match &args.rules {
        Some(path) => {
            let json = read_text(path, max_file_size)?;
            RuleTable::from_json(&json).map_err(|e| CliError::InvalidRules {
                source: path.display().to_string(),
                detail: e.to_string(),
            })?
        }
        None => RuleVariant::from(args.variant).table(),
    };
    Ok(PipelineConfig {
        layout: SheetLayout {
            section: args.section.clone(),
            ..SheetLayout::default()
        },
        rules,
    })
}

/// Reads the catalog named by `args` and loads it into `session`.
///
/// # Errors
///
/// Read, rules and document-shape failures, all exit code 2.
pub fn load_catalog<'s>(
    session: &'s mut Session,
    args: &CatalogArgs,
    max_file_size: u64,
) -> Result<&'s ProcessedCatalog, CliError> {
    let config = pipeline_config(args, max_file_size)?;
    let section = read_catalog(&args.file, &config.layout, max_file_size)?;
    tracing::info!(file = %args.file.display(), sheet = %section.name, "catalog read");
    session
        .load(&section, &config)
        .map_err(|e| CliError::DocumentShape {
            source: args.file.display().to_string(),
            detail: e.to_string(),
        })
}

/// Maps a failed write to stdout.
pub fn stdout_error(e: std::io::Error) -> CliError {
    CliError::IoError {
        source: "stdout".to_owned(),
        detail: e.to_string(),
    }
}
