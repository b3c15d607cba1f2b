//! `catalog-ingest`: ingest one label's catalog into the release database
//!
//! Configuration comes from the environment; see
//! [`CatalogConfig::from_lookup`](core_runtime::config::CatalogConfig::from_lookup)
//! and [`LoggingConfig::from_lookup`](core_runtime::logging::LoggingConfig::from_lookup).
//! The run report is printed to stdout as JSON.

use anyhow::Context;
use core_runtime::config::CatalogConfig;
use core_runtime::logging::{init_logging, LoggingConfig};
use core_service::CatalogService;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let logging = LoggingConfig::from_env().context("Invalid logging configuration")?;
    init_logging(logging).context("Failed to initialize logging")?;

    let config = match CatalogConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Invalid configuration");
            return Err(e).context("Invalid configuration");
        }
    };

    info!(
        label_id = config.label_id,
        database = %config.database_path.display(),
        "Starting catalog ingestion"
    );

    let service = CatalogService::bootstrap(&config)
        .await
        .context("Failed to start catalog service")?;

    let report = service.ingest().await.context("Catalog ingestion failed")?;

    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}
