//! catalog-probe CLI library
//!
//! Command-line front end for the catalog-probe route checks and health
//! probe.

#![warn(missing_docs)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

mod commands;
mod config;
mod error;
mod output;
mod runner;

pub use commands::{
    Cli, ColorArg, Commands, ConfigArgs, ConfigFormat, HealthArgs, OutputFormat, RoutesArgs,
    TargetArgs,
};
pub use config::{CliConfig, ColorChoice, Verbosity};
pub use error::{CliError, CliResult};
pub use output::Reporter;
pub use runner::{resolve_config, run_config, run_health, run_routes};
