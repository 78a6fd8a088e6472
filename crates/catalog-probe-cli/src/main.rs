//! catalog-probe: route checks and health probes for the Product Catalog
//!
//! ## Usage
//!
//! ```bash
//! catalog-probe routes                          # Run every route check
//! catalog-probe routes --filter by_ --format json
//! catalog-probe health --attempts 10            # Wait for the service
//! catalog-probe config --file probe.yaml        # Show resolved settings
//! ```

use catalog_probe_cli::{run_config, run_health, run_routes, Cli, CliConfig, CliResult, Commands};
use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> CliResult<()> {
    let cli = Cli::parse();
    let config = CliConfig::from_cli(&cli);
    init_logging(&config);
    console::set_colors_enabled(config.use_color());

    let config_file = cli.config.as_deref();
    match cli.command {
        Commands::Routes(args) => run_routes(&config, config_file, &args),
        Commands::Health(args) => run_health(&config, config_file, &args),
        Commands::Config(args) => run_config(config_file, &args),
    }
}

fn init_logging(config: &CliConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.verbosity.log_filter()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
