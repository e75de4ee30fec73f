use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author = "Tony Kan, Ted Yu",
    version,
    about = "Structura CLI - partition macromolecular models into units, expand assemblies, derive bonds, cross-links and carbohydrates, and export mmCIF.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Summarize the units, symmetry groups and derived properties of a model.
    Inspect(InspectArgs),
    /// Write a model (or one of its assemblies) as an mmCIF data block.
    Export(ExportArgs),
}

/// Options shared by every command that builds a structure.
#[derive(Args, Debug, Clone)]
pub struct StructureArgs {
    /// Path to the model manifest (TOML referencing an atom_site CSV).
    #[arg(short, long, required = true, value_name = "PATH")]
    pub model: PathBuf,

    /// Build this assembly instead of the asymmetric unit.
    #[arg(short, long, value_name = "ID")]
    pub assembly: Option<String>,

    /// Path to a structure configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S bond.max-bond-length=3.5
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}

/// Arguments for the `inspect` subcommand.
#[derive(Args, Debug)]
pub struct InspectArgs {
    #[command(flatten)]
    pub structure: StructureArgs,

    /// List every unit, not only the summary.
    #[arg(long)]
    pub units: bool,
}

/// Arguments for the `export` subcommand.
#[derive(Args, Debug)]
pub struct ExportArgs {
    #[command(flatten)]
    pub structure: StructureArgs,

    /// Path for the output mmCIF file.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub output: PathBuf,

    /// Name of the data block; defaults to the model label.
    #[arg(short, long, value_name = "NAME")]
    pub block: Option<String>,
}
