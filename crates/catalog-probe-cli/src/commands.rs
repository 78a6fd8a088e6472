//! CLI command definitions using clap

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// catalog-probe: route checks and health probes for the Product Catalog service
#[derive(Parser, Debug)]
#[command(name = "catalog-probe")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output (auto, always, never)
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorArg,

    /// YAML configuration file
    #[arg(long, global = true, env = "CATALOG_PROBE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run route checks against the catalog API
    Routes(RoutesArgs),

    /// Poll the health endpoint until it reports OK
    Health(HealthArgs),

    /// Show the resolved configuration
    Config(ConfigArgs),
}

/// Where requests go
#[derive(clap::Args, Debug, Clone, Default)]
pub struct TargetArgs {
    /// Service root URL (overrides config and BASE_URL)
    #[arg(long)]
    pub base_url: Option<String>,

    /// Run against the built-in in-memory catalog instead of HTTP
    #[arg(long, conflicts_with = "base_url")]
    pub in_memory: bool,
}

/// Arguments for the routes command
#[derive(Parser, Debug)]
pub struct RoutesArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Output format
    #[arg(long, value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Only run checks whose name contains this text
    #[arg(short, long)]
    pub filter: Option<String>,

    /// List check names without running them
    #[arg(long)]
    pub list: bool,

    /// Seed for sample products
    #[arg(long, default_value = "24301")]
    pub seed: u64,
}

/// Arguments for the health command
#[derive(Parser, Debug)]
pub struct HealthArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Attempts before giving up, one second apart
    #[arg(long, default_value = "3", value_parser = clap::value_parser!(u16).range(1..))]
    pub attempts: u16,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// YAML file to resolve instead of --config
    #[arg(long)]
    pub file: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value = "yaml")]
    pub format: ConfigFormat,
}

/// Report output format
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable lines
    #[default]
    Text,
    /// JSON report
    Json,
}

/// Configuration output format
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConfigFormat {
    /// YAML
    #[default]
    Yaml,
    /// JSON
    Json,
}

/// Color argument
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorArg {
    /// Automatic color detection
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

impl From<ColorArg> for crate::config::ColorChoice {
    fn from(arg: ColorArg) -> Self {
        match arg {
            ColorArg::Auto => Self::Auto,
            ColorArg::Always => Self::Always,
            ColorArg::Never => Self::Never,
        }
    }
}
