//! Command-line entry point for the Rival play-record service.
//!
//! Wires configuration, logging, `PostgreSQL`, and `Dragonfly` into a
//! [`PlaydataService`] and runs one subcommand against it.
//!
//! # Startup Sequence
//!
//! 1. Parse arguments
//! 2. Load configuration from `rival-config.yaml` (or `RIVAL_CONFIG`)
//! 3. Initialize structured logging (tracing, to stderr)
//! 4. Connect to `PostgreSQL` and apply migrations if enabled
//! 5. Connect to `Dragonfly`
//! 6. Run the subcommand and print its JSON result
//! 7. Close both connections

mod cli;
mod config;
mod error;

use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use rival_db::{DragonflyPool, PlaydataService, PostgresPool, SnapshotCache};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;
use crate::config::{LoggingConfig, RivalConfig};
use crate::error::ImporterError;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "rival-importer failed");
            eprintln!("error: {e:#}");
            let code = e
                .downcast_ref::<ImporterError>()
                .map_or(1, ImporterError::exit_code);
            ExitCode::from(code)
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = RivalConfig::load_or_default(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;
    init_tracing(&config.logging);
    info!(
        config = %cli.config.display(),
        command = ?cli.command,
        "rival-importer starting"
    );

    let pg = PostgresPool::connect(&config.postgres())
        .await
        .map_err(ImporterError::from)
        .context("connecting to PostgreSQL")?;
    if config.infrastructure.run_migrations || cli.command.forces_migrations() {
        pg.run_migrations()
            .await
            .map_err(ImporterError::from)
            .context("running migrations")?;
    }

    let dragonfly = DragonflyPool::connect(&config.infrastructure.dragonfly_url)
        .await
        .map_err(ImporterError::from)
        .context("connecting to Dragonfly")?;

    let service = PlaydataService::new(
        pg.clone(),
        SnapshotCache::new(dragonfly.clone()),
        config.service_settings(),
    );
    info!(
        cache_backend = service.cache().backend_name(),
        "Playdata service ready"
    );

    let outcome = cli.command.execute(&service).await;

    pg.close().await;
    if let Err(e) = dragonfly.close().await {
        tracing::warn!(error = %e, "Failed to close Dragonfly connection");
    }

    Ok(outcome?)
}

/// Install the global subscriber. `RUST_LOG` wins over the configured
/// level.
fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);
    if logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}
