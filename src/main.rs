//! sqlbridge service binary.
//!
//! Connects to the configured database, optionally applies a JSON schema
//! description, and serves until the process receives the host's stop
//! signal, at which point the pool drains and closes.

use clap::Parser;
use sqlbridge::config::{Config, ConnectionSettings};
use sqlbridge::models::TableDef;
use sqlbridge::service::SqlBridge;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Initialize the tracing subscriber for logging.
fn init_tracing(config: &Config) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let subscriber = tracing_subscriber::registry().with(filter);

    if config.json_logs {
        subscriber.with(fmt::layer().json()).init();
    } else {
        subscriber
            .with(fmt::layer().with_target(true).with_thread_ids(false))
            .init();
    }
}

/// Load a schema description (array of table definitions) from a JSON file.
fn load_schema(path: &std::path::Path) -> Result<Vec<TableDef>, Box<dyn std::error::Error>> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| format!("failed to read schema file {}: {e}", path.display()))?;
    let tables: Vec<TableDef> = serde_json::from_str(&raw)
        .map_err(|e| format!("invalid schema file {}: {e}", path.display()))?;
    Ok(tables)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::parse();
    init_tracing(&config);

    info!("Starting sqlbridge v{}", env!("CARGO_PKG_VERSION"));

    let settings = ConnectionSettings::parse(&config.database_url)?;
    let service = SqlBridge::connect(settings).await?;

    if let Some(path) = &config.schema {
        let tables = load_schema(path)?;
        info!(tables = tables.len(), "Applying schema description");
        if let Err(e) = service.initialize(&tables).await {
            error!(error = %e, "Schema initialization failed");
            service.shutdown().await;
            return Err(e.into());
        }
    }

    info!("Ready; waiting for shutdown signal");
    tokio::signal::ctrl_c().await?;

    info!("Shutdown signal received, draining pool");
    service.shutdown().await;

    Ok(())
}
