//! Catalog service façade and bootstrap helpers.
//!
//! This crate wires host-provided bridge implementations (HTTP, sleeping,
//! clock) and the release database into the ingestion pipeline. Desktop
//! hosts enable the `desktop-shims` feature (the default), which supplies
//! reqwest and Tokio backed bridges from `bridge-desktop`.

pub mod error;

pub use error::{CoreError, Result};

use std::sync::Arc;

use bridge_traits::{
    http::HttpClient,
    time::{Clock, Sleeper, SystemClock},
};
use core_library::{
    db::{create_pool, DatabaseConfig},
    models::{AttributeKind, CountResult, ReleaseFilter},
    repositories::{
        ReleaseRepository, SqliteReleaseRepository, SqliteStatsRepository, StatsRepository,
    },
};
use core_metadata::DiscogsClient;
use core_runtime::config::CatalogConfig;
use core_runtime::logging::redact_if_sensitive;
use core_sync::{IngestionConfig, IngestionCoordinator, IngestionReport};
use sqlx::SqlitePool;
use tracing::{debug, info};

/// Aggregated handle to the bridge dependencies the pipeline requires.
pub struct CatalogDependencies {
    pub http_client: Arc<dyn HttpClient>,
    pub sleeper: Arc<dyn Sleeper>,
    pub clock: Arc<dyn Clock>,
}

impl CatalogDependencies {
    /// Construct a dependency bundle from explicit bridge handles.
    pub fn new(http_client: Arc<dyn HttpClient>, sleeper: Arc<dyn Sleeper>) -> Self {
        Self {
            http_client,
            sleeper,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Desktop bridges for `config`.
    ///
    /// An HTTP client set on the configuration takes precedence over the
    /// reqwest default.
    #[cfg(feature = "desktop-shims")]
    pub fn desktop(config: &CatalogConfig) -> Result<Self> {
        let http_client: Arc<dyn HttpClient> = match config.http_client {
            Some(ref client) => client.clone(),
            None => Arc::new(bridge_desktop::ReqwestHttpClient::with_timeout(
                config.api.request_timeout,
            )?),
        };

        Ok(Self::new(http_client, Arc::new(bridge_desktop::TokioSleeper)))
    }

    /// Bridges for hosts without the desktop shims.
    ///
    /// The configuration must carry an HTTP client.
    #[cfg(not(feature = "desktop-shims"))]
    pub fn from_config(config: &CatalogConfig, sleeper: Arc<dyn Sleeper>) -> Result<Self> {
        let http_client = config
            .http_client
            .clone()
            .ok_or_else(|| CoreError::CapabilityMissing {
                capability: "http_client".to_string(),
                message: "No HTTP client configured and desktop shims are disabled".to_string(),
            })?;

        Ok(Self::new(http_client, sleeper))
    }
}

/// Primary façade exposed to host applications.
#[derive(Clone)]
pub struct CatalogService {
    label_id: i64,
    pool: SqlitePool,
    coordinator: Arc<IngestionCoordinator>,
    releases: Arc<dyn ReleaseRepository>,
    stats: Arc<dyn StatsRepository>,
}

impl CatalogService {
    /// Open the database named by `config` and wire the pipeline.
    ///
    /// # Errors
    ///
    /// Fails if the configuration is invalid or the database cannot be
    /// opened and migrated.
    pub async fn new(config: &CatalogConfig, deps: CatalogDependencies) -> Result<Self> {
        config.validate()?;

        let pool = create_pool(DatabaseConfig::new(config.database_path.clone())).await?;
        Self::with_pool(config, deps, pool)
    }

    /// Wire the pipeline over an existing, migrated pool.
    pub fn with_pool(
        config: &CatalogConfig,
        deps: CatalogDependencies,
        pool: SqlitePool,
    ) -> Result<Self> {
        config.validate()?;

        let api_key = config
            .api
            .credentials
            .as_ref()
            .map(|credentials| redact_if_sensitive("api_key", credentials.key()))
            .unwrap_or_else(|| "-".to_string());
        debug!(
            label_id = config.label_id,
            base_url = %config.api.base_url,
            app_name = config.api.app_name.as_deref().unwrap_or("-"),
            api_key = %api_key,
            write_mode = ?config.attribute_write_mode,
            "Wiring catalog service"
        );

        let client = Arc::new(
            DiscogsClient::new(
                deps.http_client,
                deps.sleeper,
                &config.api,
                config.retry_policy.clone(),
            )
            .with_clock(deps.clock),
        );

        let releases: Arc<dyn ReleaseRepository> = Arc::new(SqliteReleaseRepository::with_mode(
            pool.clone(),
            config.attribute_write_mode,
        ));
        let stats: Arc<dyn StatsRepository> = Arc::new(SqliteStatsRepository::new(pool.clone()));

        let coordinator = Arc::new(IngestionCoordinator::new(
            client,
            releases.clone(),
            IngestionConfig::from(config),
        ));

        Ok(Self {
            label_id: config.label_id,
            pool,
            coordinator,
            releases,
            stats,
        })
    }

    /// Bootstrap with desktop bridges.
    ///
    /// ```rust,ignore
    /// use core_runtime::config::CatalogConfig;
    ///
    /// let config = CatalogConfig::from_env()?;
    /// let service = core_service::CatalogService::bootstrap(&config).await?;
    /// let report = service.ingest().await?;
    /// ```
    #[cfg(feature = "desktop-shims")]
    pub async fn bootstrap(config: &CatalogConfig) -> Result<Self> {
        let deps = CatalogDependencies::desktop(config)?;
        Self::new(config, deps).await
    }

    pub fn label_id(&self) -> i64 {
        self.label_id
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Ingest the configured label
    pub async fn ingest(&self) -> Result<IngestionReport> {
        self.ingest_label(self.label_id).await
    }

    /// Ingest any label with the configured pipeline
    pub async fn ingest_label(&self, label_id: i64) -> Result<IngestionReport> {
        let report = self.coordinator.run(label_id).await?;
        let total = self.releases.count().await?;

        info!(
            label_id,
            stored = report.stored,
            total_releases = total,
            "Ingestion finished"
        );

        Ok(report)
    }

    /// Release counts for the releases matching `filter`
    pub async fn release_counts(&self, filter: &ReleaseFilter) -> Result<CountResult> {
        Ok(self.stats.release_counts(filter).await?)
    }

    /// Distinct names of one attribute kind, sorted ascending
    pub async fn unique_names(&self, kind: AttributeKind) -> Result<Vec<String>> {
        Ok(self.stats.unique_names(kind).await?)
    }
}
