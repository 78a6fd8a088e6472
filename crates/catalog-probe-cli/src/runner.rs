//! Subcommand execution

use crate::commands::{ConfigArgs, ConfigFormat, HealthArgs, OutputFormat, RoutesArgs, TargetArgs};
use crate::config::CliConfig;
use crate::error::{CliError, CliResult};
use crate::output::Reporter;
use catalog_probe::catalog::{
    wait_for_health, CatalogClient, HttpTransport, InMemoryCatalog, RouteCheck, RouteSuite,
    SuiteReport, Transport,
};
use catalog_probe::{ProbeConfig, SystemClock, TracingObserver};
use std::path::Path;

/// Defaults, then the YAML file, then the environment, then `--base-url`
pub fn resolve_config(file: Option<&Path>, base_url: Option<&str>) -> CliResult<ProbeConfig> {
    let config = ProbeConfig::load(file)?;
    let config = match base_url {
        Some(url) => config.with_base_url(url).validate()?,
        None => config,
    };
    tracing::debug!(base_url = config.base_url(), "resolved configuration");
    Ok(config)
}

fn with_transport<R>(
    target: &TargetArgs,
    config: &ProbeConfig,
    run: impl FnOnce(&dyn Transport, &str) -> CliResult<R>,
) -> CliResult<R> {
    if target.in_memory {
        let catalog = InMemoryCatalog::new();
        run(&catalog, "in-memory catalog")
    } else {
        let transport = HttpTransport::new(config.base_url())?;
        run(&transport, config.base_url())
    }
}

/// Run the route checks and report them
pub fn run_routes(cli: &CliConfig, config_file: Option<&Path>, args: &RoutesArgs) -> CliResult<()> {
    let reporter = Reporter::new(cli.use_color(), cli.verbosity.is_quiet());

    if args.list {
        for check in RouteCheck::ALL {
            reporter.info(&format!("{:<24} {}", check.name(), check.description()));
        }
        return Ok(());
    }

    let config = resolve_config(config_file, args.target.base_url.as_deref())?;
    let report: SuiteReport = with_transport(&args.target, &config, |transport, target| {
        tracing::info!("running route checks against {target}");
        Ok(RouteSuite::new(transport)
            .with_seed(args.seed)
            .run_filtered(args.filter.as_deref()))
    })?;

    if report.checks.is_empty() {
        return Err(CliError::NoChecksSelected {
            filter: args.filter.clone().unwrap_or_default(),
        });
    }

    match args.format {
        OutputFormat::Text => reporter.suite(&report),
        OutputFormat::Json => println!("{}", report.to_json()?),
    }

    if report.all_passed() {
        Ok(())
    } else {
        Err(CliError::ChecksFailed {
            failed: report.failed(),
            total: report.checks.len(),
        })
    }
}

/// Poll `/health` until the service reports OK
pub fn run_health(cli: &CliConfig, config_file: Option<&Path>, args: &HealthArgs) -> CliResult<()> {
    let reporter = Reporter::new(cli.use_color(), cli.verbosity.is_quiet());
    let config = resolve_config(config_file, args.target.base_url.as_deref())?;

    with_transport(&args.target, &config, |transport, target| {
        let client = CatalogClient::new(transport);
        let outcome = wait_for_health(
            &client,
            usize::from(args.attempts),
            &SystemClock::new(),
            &TracingObserver,
        )?;
        reporter.success(&format!(
            "{target} healthy after {} attempt(s)",
            outcome.attempts
        ));
        Ok(())
    })
}

/// Print the resolved configuration
pub fn run_config(config_file: Option<&Path>, args: &ConfigArgs) -> CliResult<()> {
    let file = args.file.as_deref().or(config_file);
    let config = resolve_config(file, None)?;
    let rendered = match args.format {
        ConfigFormat::Yaml => config.to_yaml()?,
        ConfigFormat::Json => serde_json::to_string_pretty(&config)?,
    };
    println!("{}", rendered.trim_end());
    Ok(())
}
