#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

mod config;
mod logging;
mod signals;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use registrar::{ConsulConnector, FileServiceSource, Reconciler, ServiceSource};
use tokio_util::sync::CancellationToken;

use crate::config::AppConfig;

/// catalog-sync - registers orchestrator tasks in a Consul catalog
#[derive(Parser)]
#[command(name = "catalog-sync")]
#[command(about = "Registers orchestrator tasks in a Consul catalog and keeps upstream records in step")]
#[command(version)]
struct Cli {
    /// Path to configuration file (YAML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Catalog agent HTTP port (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Desired-services JSON file (overrides config)
    #[arg(short, long)]
    services: Option<PathBuf>,

    /// Print effective configuration (secrets redacted) and exit
    #[arg(long)]
    print_config: bool,

    /// Log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Clone, Copy)]
enum Commands {
    /// Reconcile on an interval until interrupted
    Run,
    /// Run a single reconciliation pass and exit
    Once,
    /// Validate configuration and exit
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(path) = &cli.config
        && !path.is_file()
    {
        bail!("config file does not exist: {}", path.display());
    }

    // defaults -> YAML -> CATALOG_SYNC__* env -> CLI flags
    let mut config = AppConfig::load(cli.config.as_deref())?;
    apply_cli_overrides(&mut config, &cli);

    logging::init(&config.logging, cli.verbose);

    if cli.print_config {
        println!("{}", config.to_pretty_json()?);
        return Ok(());
    }

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run(config).await,
        Commands::Once => once(config).await,
        Commands::Check => check(&config),
    }
}

fn apply_cli_overrides(config: &mut AppConfig, cli: &Cli) {
    if let Some(port) = cli.port {
        config.catalog.port = port;
    }
    if let Some(path) = &cli.services {
        config.source.path = Some(path.clone());
    }
}

/// Checks that do not need the network.
fn validate(config: &AppConfig) -> Result<&Path> {
    if config.reconcile.interval.is_zero() {
        bail!("reconcile.interval must be greater than zero");
    }
    if config.catalog.request_timeout.is_zero() {
        bail!("catalog.request_timeout must be greater than zero");
    }
    config
        .source
        .path
        .as_deref()
        .context("source.path is not set (use --services or CATALOG_SYNC__SOURCE__PATH)")
}

fn check(config: &AppConfig) -> Result<()> {
    tracing::info!("checking configuration");
    let path = validate(config)?;
    if !path.is_file() {
        bail!("services file does not exist: {}", path.display());
    }
    println!("Configuration is valid");
    Ok(())
}

async fn once(config: AppConfig) -> Result<()> {
    let source = FileServiceSource::new(validate(&config)?);
    let mut reconciler = Reconciler::new(Arc::new(ConsulConnector::new(config.catalog)));

    let services = source
        .desired_services()
        .await
        .context("cannot load desired services")?;
    let report = reconciler
        .reconcile_once(&services)
        .await
        .context("reconciliation aborted")?;

    tracing::info!(
        registered = report.registered,
        register_failed = report.register_failed,
        "single pass complete"
    );
    Ok(())
}

async fn run(config: AppConfig) -> Result<()> {
    let source = FileServiceSource::new(validate(&config)?);
    let interval = config.reconcile.interval;
    let mut reconciler = Reconciler::new(Arc::new(ConsulConnector::new(config.catalog)));

    let cancel = CancellationToken::new();
    let shutdown = cancel.clone();
    tokio::spawn(async move {
        if let Err(e) = signals::wait_for_shutdown().await {
            tracing::error!(error = %e, "signal handling failed");
        }
        shutdown.cancel();
    });

    tracing::info!(
        services = %source.path().display(),
        interval = ?interval,
        "catalog-sync starting"
    );

    reconciler
        .run_until_cancelled(&source, interval, cancel)
        .await
        .context("reconciliation stopped")?;

    tracing::info!("catalog-sync stopped");
    Ok(())
}
