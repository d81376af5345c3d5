use std::io::IsTerminal as _;
use std::process::ExitCode;

use clap::Parser;

mod cli;
mod cmd;
mod error;
mod format;
mod io;
mod logging;
mod presets;

use crate::cli::{Cli, Command};
use crate::cmd::xml::XmlOptions;
use crate::error::CliError;
use crate::format::FormatterConfig;
use crate::logging::LogConfig;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = FormatterConfig::from_flags(cli.format, cli.no_color, cli.quiet, cli.verbose);
    let log_ansi = !cli.no_color
        && std::env::var_os("NO_COLOR").is_none()
        && std::io::stderr().is_terminal();
    logging::init_logging(&LogConfig::from_flags(
        cli.quiet,
        cli.verbose,
        cli.format,
        log_ansi,
    ));

    match run(&cli, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e.message());
            ExitCode::from(u8::try_from(e.exit_code()).unwrap_or(2))
        }
    }
}

fn run(cli: &Cli, config: &FormatterConfig) -> Result<(), CliError> {
    match &cli.command {
        Command::Check { catalog, before } => {
            cmd::check::run(catalog, *before, cli.max_file_size, config)
        }
        Command::Export {
            catalog,
            out_dir,
            selection,
        } => cmd::export::run(catalog, out_dir, *selection, cli.max_file_size, config),
        Command::Xml {
            files,
            keys,
            minify,
            organize,
            summary,
        } => {
            let options = XmlOptions {
                keys: keys.as_deref(),
                minify: *minify,
                organize: organize.as_deref(),
                summary: *summary,
            };
            cmd::xml::run(files, &options, cli.max_file_size, config)
        }
        Command::Order { files, hub } => {
            cmd::order::run(files, &hub.defaults(), cli.max_file_size, config)
        }
        Command::Curl { args } => cmd::curl::run(args, cli.max_file_size, config),
    }
}
