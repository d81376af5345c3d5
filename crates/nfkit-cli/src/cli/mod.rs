//! Command-line surface of `nfkit`: global flags, the subcommands and the
//! argument groups they share.
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use nfkit_core::{ExportKind, RuleVariant};
use nfkit_xml::HubDefaults;

use crate::presets::{Platform, Preset};

/// How results are written to stdout.
///
/// `Human` emits aligned text to stdout. `Json` emits one JSON object per
/// line (NDJSON) and switches log output to JSON as well.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Plain text lines, colored on a terminal (default).
    Human,
    /// One JSON object per line.
    Json,
}

/// Rule table selected with `--variant`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum VariantArg {
    /// CST PIS/COFINS must be at least 1 (default).
    Standard,
    /// No numeric minimum on CST PIS/COFINS.
    NoCstMinimum,
}

impl From<VariantArg> for RuleVariant {
    fn from(arg: VariantArg) -> Self {
        match arg {
            VariantArg::Standard => RuleVariant::Standard,
            VariantArg::NoCstMinimum => RuleVariant::NoCstMinimum,
        }
    }
}

/// Arguments shared by every command that loads a catalog.
#[derive(Args, Clone, Debug)]
pub struct CatalogArgs {
    /// Catalog file (.xlsx or .xml).
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// JSON rule table replacing the built-in one.
    #[arg(long, value_name = "JSON", conflicts_with = "variant")]
    pub rules: Option<PathBuf>,

    /// Built-in rule table variant.
    #[arg(long, value_enum, default_value = "standard")]
    pub variant: VariantArg,

    /// Name of the sheet holding the catalog (case-insensitive).
    #[arg(long, env = "NFKIT_SECTION", default_value = nfkit_core::extract::DEFAULT_SECTION)]
    pub section: String,
}

/// Export selectors. No selector means every document.
#[derive(Args, Clone, Copy, Debug, Default)]
pub struct ExportSelection {
    /// Write the valid rows (`produtos_validos.xlsx`).
    #[arg(long)]
    pub valid: bool,
    /// Write the invalid rows (`produtos_invalidos.xlsx`).
    #[arg(long)]
    pub invalid: bool,
    /// Write the correction table (`detalhes_correcoes.xlsx`).
    #[arg(long)]
    pub corrections: bool,
    /// Write the violation table (`inconsistencias_pos_correcao.xlsx`).
    #[arg(long)]
    pub violations: bool,
}

impl ExportSelection {
    /// Selected kinds in [`ExportKind::ALL`] order.
    pub fn kinds(self) -> Vec<ExportKind> {
        let none = !(self.valid || self.invalid || self.corrections || self.violations);
        ExportKind::ALL
            .into_iter()
            .filter(|kind| {
                none || match kind {
                    ExportKind::Valid => self.valid,
                    ExportKind::Invalid => self.invalid,
                    ExportKind::Corrections => self.corrections,
                    ExportKind::Violations => self.violations,
                }
            })
            .collect()
    }
}

/// Overrides of the fixed values written into every hub order.
#[derive(Args, Clone, Debug, Default)]
pub struct HubArgs {
    /// `idCanal` of the orders (2 by default).
    #[arg(long, value_name = "ID")]
    pub channel_id: Option<u32>,
    /// `idLoja` of the orders ("1" by default).
    #[arg(long, value_name = "ID")]
    pub store_id: Option<String>,
    /// `idHub` of the orders (2 by default).
    #[arg(long, value_name = "ID")]
    pub hub_id: Option<u32>,
    /// Domain of the placeholder customer e-mail.
    #[arg(long, value_name = "DOMAIN")]
    pub email_domain: Option<String>,
}

impl HubArgs {
    /// The built-in defaults with the given overrides applied.
    pub fn defaults(&self) -> HubDefaults {
        let base = HubDefaults::default();
        HubDefaults {
            channel_id: self.channel_id.unwrap_or(base.channel_id),
            store_id: self.store_id.clone().unwrap_or(base.store_id),
            hub_id: self.hub_id.unwrap_or(base.hub_id),
            email_domain: self.email_domain.clone().unwrap_or(base.email_domain),
        }
    }
}

/// Arguments of `nfkit curl`.
#[derive(Args, Clone, Debug)]
pub struct CurlArgs {
    /// Order ids, separated by spaces, commas or semicolons.
    #[arg(value_name = "IDS", num_args = 1.., required = true)]
    pub ids: Vec<String>,

    /// JSON file of presets keyed by client name.
    #[arg(long, value_name = "JSON", env = "NFKIT_PRESETS")]
    pub presets: Option<PathBuf>,

    /// Preset to start from; explicit flags override its fields.
    #[arg(long, value_name = "NAME", requires = "presets")]
    pub preset: Option<String>,

    /// Payload layout of the receiving integration.
    #[arg(long, value_enum)]
    pub platform: Option<Platform>,

    /// Endpoint receiving the orders.
    #[arg(long)]
    pub url: Option<String>,

    /// Account id for `plugg` payloads.
    #[arg(long)]
    pub user: Option<String>,

    /// Integration id for `any` payloads.
    #[arg(long)]
    pub oi: Option<String>,

    /// Store the resulting settings in the preset file under NAME.
    #[arg(long, value_name = "NAME", requires = "presets")]
    pub save: Option<String>,
}

impl CurlArgs {
    /// `base` with every field given on the command line replaced.
    pub fn apply(&self, base: Preset) -> Preset {
        Preset {
            platform: self.platform.unwrap_or(base.platform),
            url: self.url.clone().unwrap_or(base.url),
            user: self.user.clone().unwrap_or(base.user),
            oi: self.oi.clone().unwrap_or(base.oi),
        }
    }
}

/// All top-level subcommands exposed by the `nfkit` binary.
#[derive(Subcommand)]
pub enum Command {
    /// Validate and correct a product catalog, then report what remains.
    Check {
        #[command(flatten)]
        catalog: CatalogArgs,
        /// Report violations found before correction instead of after.
        #[arg(long)]
        before: bool,
    },

    /// Write the corrected catalog split into spreadsheets.
    Export {
        #[command(flatten)]
        catalog: CatalogArgs,
        /// Directory receiving the workbooks (created if missing).
        #[arg(long, value_name = "DIR")]
        out_dir: PathBuf,
        #[command(flatten)]
        selection: ExportSelection,
    },

    /// List, filter, minify and organize NF-e/CT-e XML files.
    Xml {
        /// XML files or ZIP archives (nested archives are descended).
        #[arg(value_name = "FILE", num_args = 1.., required = true)]
        files: Vec<PathBuf>,
        /// Keep only files whose name contains one of these keys
        /// (separated by spaces, commas or semicolons).
        #[arg(long, value_name = "KEYS")]
        keys: Option<String>,
        /// Minify XML files before packing them.
        #[arg(long, requires = "organize")]
        minify: bool,
        /// Write a ZIP with files under `<natOp>/<YYYY-MM>/`.
        #[arg(long, value_name = "ZIP")]
        organize: Option<PathBuf>,
        /// Print counts, sizes and the largest files instead of the listing.
        #[arg(long)]
        summary: bool,
    },

    /// Convert NF-e XML files into hub order JSON.
    Order {
        /// NF-e XML files or ZIP archives (nested archives are descended).
        #[arg(value_name = "FILE", num_args = 1.., required = true)]
        files: Vec<PathBuf>,
        #[command(flatten)]
        hub: HubArgs,
    },

    /// Print CURL commands that re-send orders to an integration.
    Curl {
        #[command(flatten)]
        args: CurlArgs,
    },
}

/// Root CLI struct for the `nfkit` binary.
///
/// Global flags are accepted before or after the subcommand.
#[derive(Parser)]
#[command(
    name = "nfkit",
    version,
    about = "Fiscal product catalog toolkit",
    long_about = "Validates and corrects NFC-e product catalogs (.xlsx or .xml),\n\
                  exports the split results as spreadsheets, sorts NF-e/CT-e\n\
                  XML files, converts NF-e into hub orders and builds order\n\
                  re-send commands."
)]
pub struct Cli {
    /// Active subcommand.
    #[command(subcommand)]
    pub command: Command,

    /// Output format for results and logs.
    #[arg(long, short = 'f', default_value = "human", global = true)]
    pub format: OutputFormat,

    /// Suppress all output except errors (incompatible with `--verbose`).
    #[arg(long, short = 'q', global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Show corrections and pipeline progress (incompatible with `--quiet`).
    #[arg(long, short = 'v', global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Largest input file accepted, in bytes (256 MiB by default).
    #[arg(
        long,
        global = true,
        env = "NFKIT_MAX_FILE_SIZE",
        default_value = "268435456"
    )]
    pub max_file_size: u64,

    /// Never color human output or logs. Setting `NO_COLOR` has the same
    /// effect.
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,
}
