//! # Catalog Configuration Module
//!
//! Provides configuration management for the label catalog ingester.
//!
//! ## Overview
//!
//! The configuration system uses a builder pattern to construct a
//! `CatalogConfig` instance holding every setting the ingestion pipeline
//! needs. It is built once at startup, validated fail-fast, and then passed
//! down by reference. Nothing below the service bootstrap reads the process
//! environment.
//!
//! ## Usage
//!
//! ### Explicit construction
//!
//! ```ignore
//! use core_runtime::config::CatalogConfig;
//!
//! let config = CatalogConfig::builder()
//!     .label_id(1)
//!     .database_path("/var/lib/catalog/catalog.db")
//!     .app_name("LabelCatalog/0.1")
//!     .credentials("key", "secret")
//!     .build()
//!     .expect("Failed to build config");
//! ```
//!
//! ### From the environment
//!
//! ```ignore
//! use core_runtime::config::CatalogConfig;
//!
//! let config = CatalogConfig::from_env()?;
//! ```
//!
//! | Variable | Meaning | Default |
//! |----------|---------|---------|
//! | `SELECTED_LABEL` | Label id to ingest | required |
//! | `DISCOGS_APP_NAME` | Sent as `User-Agent` | none |
//! | `DISCOGS_KEY` / `DISCOGS_SECRET` | Consumer credentials, honored as a pair | none |
//! | `CATALOG_DATABASE_PATH` | SQLite database file | `catalog.db` |
//! | `CATALOG_RETRY_DELAY_SECS` | Delay between retries | `60` |
//! | `CATALOG_MAX_ATTEMPTS` | Attempts per request | unlimited |
//! | `CATALOG_BEST_EFFORT` | Skip releases that fail to fetch | `false` |

use crate::error::{Error, Result};
use bridge_traits::http::{Backoff, RetryPolicy};
use bridge_traits::HttpClient;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// Public Discogs API root
pub const DEFAULT_BASE_URL: &str = "https://api.discogs.com";

/// Listing page size; also the largest value the API accepts
pub const DEFAULT_PAGE_SIZE: u32 = 100;

pub const DEFAULT_DATABASE_PATH: &str = "catalog.db";

pub const ENV_SELECTED_LABEL: &str = "SELECTED_LABEL";
pub const ENV_APP_NAME: &str = "DISCOGS_APP_NAME";
pub const ENV_KEY: &str = "DISCOGS_KEY";
pub const ENV_SECRET: &str = "DISCOGS_SECRET";
pub const ENV_DATABASE_PATH: &str = "CATALOG_DATABASE_PATH";
pub const ENV_RETRY_DELAY_SECS: &str = "CATALOG_RETRY_DELAY_SECS";
pub const ENV_MAX_ATTEMPTS: &str = "CATALOG_MAX_ATTEMPTS";
pub const ENV_BEST_EFFORT: &str = "CATALOG_BEST_EFFORT";

/// What the ingestion loop does when one step fails
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Stop the run and return the error
    AbortOnFirstError,
    /// Log the error, record it in the run report and continue
    BestEffort,
}

/// How attribute rows are written for a release that may already exist
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AttributeWriteMode {
    /// Insert attribute rows unconditionally. Re-ingesting a release
    /// duplicates its attribute rows.
    #[default]
    Append,
    /// Delete the release's attribute rows before inserting, in the same
    /// transaction.
    Replace,
}

/// Consumer key/secret pair for the Discogs API
#[derive(Clone, PartialEq, Eq)]
pub struct ApiCredentials {
    key: String,
    secret: String,
}

impl ApiCredentials {
    pub fn new(key: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            secret: secret.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn secret(&self) -> &str {
        &self.secret
    }

    /// Value for the `Authorization` header
    pub fn authorization_header(&self) -> String {
        format!("Discogs key={}, secret={}", self.key, self.secret)
    }
}

impl fmt::Debug for ApiCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiCredentials")
            .field("key", &self.key)
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

/// Upstream API settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    /// API root without trailing slash
    pub base_url: String,
    /// Application identity sent as `User-Agent`
    pub app_name: Option<String>,
    /// Optional consumer credentials; anonymous access when absent
    pub credentials: Option<ApiCredentials>,
    /// Entries requested per listing page
    pub page_size: u32,
    /// Per-request timeout
    pub request_timeout: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            app_name: None,
            credentials: None,
            page_size: DEFAULT_PAGE_SIZE,
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl ApiConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(Error::Config(format!(
                "API base URL must be an http(s) URL, got '{}'",
                self.base_url
            )));
        }

        if self.page_size == 0 || self.page_size > DEFAULT_PAGE_SIZE {
            return Err(Error::Config(format!(
                "Page size must be between 1 and {}",
                DEFAULT_PAGE_SIZE
            )));
        }

        if let Some(ref name) = self.app_name {
            if name.trim().is_empty() {
                return Err(Error::Config("Application name cannot be empty".to_string()));
            }
        }

        if self.request_timeout.is_zero() {
            return Err(Error::Config(
                "Request timeout must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}

/// Configuration for one ingestion process.
///
/// Use [`CatalogConfigBuilder`] to construct instances.
#[derive(Clone)]
pub struct CatalogConfig {
    /// Label whose catalog is ingested
    pub label_id: i64,

    /// Path to the SQLite database file
    pub database_path: PathBuf,

    /// Upstream API settings
    pub api: ApiConfig,

    /// Retry schedule for transport failures and rate limiting
    pub retry_policy: RetryPolicy,

    /// Applied when fetching or decoding a release fails
    pub fetch_failure_policy: FailurePolicy,

    /// Applied when persisting a release fails
    pub persist_failure_policy: FailurePolicy,

    pub attribute_write_mode: AttributeWriteMode,

    /// HTTP client override; the service falls back to reqwest when absent
    pub http_client: Option<Arc<dyn HttpClient>>,
}

impl fmt::Debug for CatalogConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CatalogConfig")
            .field("label_id", &self.label_id)
            .field("database_path", &self.database_path)
            .field("api", &self.api)
            .field("retry_policy", &self.retry_policy)
            .field("fetch_failure_policy", &self.fetch_failure_policy)
            .field("persist_failure_policy", &self.persist_failure_policy)
            .field("attribute_write_mode", &self.attribute_write_mode)
            .field(
                "http_client",
                &self.http_client.as_ref().map(|_| "HttpClient { ... }"),
            )
            .finish()
    }
}

impl CatalogConfig {
    /// Creates a new builder for constructing a `CatalogConfig`.
    pub fn builder() -> CatalogConfigBuilder {
        CatalogConfigBuilder::default()
    }

    /// Build the configuration from process environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the configuration from an arbitrary variable lookup.
    ///
    /// Empty values are treated as unset. Key and secret are only used
    /// together; providing just one of them logs a warning and falls back to
    /// anonymous access.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let label = read(ENV_SELECTED_LABEL).ok_or(Error::MissingVariable(ENV_SELECTED_LABEL))?;
        let label_id = parse_var::<i64>(ENV_SELECTED_LABEL, &label)?;

        let mut builder = Self::builder().label_id(label_id);

        if let Some(name) = read(ENV_APP_NAME) {
            builder = builder.app_name(name);
        }

        match (read(ENV_KEY), read(ENV_SECRET)) {
            (Some(key), Some(secret)) => builder = builder.credentials(key, secret),
            (None, None) => {}
            _ => warn!(
                "Only one of {} and {} is set; using anonymous access",
                ENV_KEY, ENV_SECRET
            ),
        }

        if let Some(path) = read(ENV_DATABASE_PATH) {
            builder = builder.database_path(path);
        }

        let delay = match read(ENV_RETRY_DELAY_SECS) {
            Some(value) => Duration::from_secs(parse_var::<u64>(ENV_RETRY_DELAY_SECS, &value)?),
            None => bridge_traits::http::DEFAULT_RATE_LIMIT_DELAY,
        };
        let retry_policy = match read(ENV_MAX_ATTEMPTS) {
            Some(value) => {
                let attempts = parse_var::<u32>(ENV_MAX_ATTEMPTS, &value)?;
                if attempts == 0 {
                    return Err(Error::InvalidVariable {
                        name: ENV_MAX_ATTEMPTS,
                        value: value.clone(),
                        reason: "must be at least 1".to_string(),
                    });
                }
                RetryPolicy::bounded(attempts, Backoff::Fixed(delay))
            }
            None => RetryPolicy::unbounded(delay),
        };
        builder = builder.retry_policy(retry_policy);

        if let Some(value) = read(ENV_BEST_EFFORT) {
            if parse_flag(ENV_BEST_EFFORT, &value)? {
                builder = builder.fetch_failure_policy(FailurePolicy::BestEffort);
            }
        }

        builder.build()
    }

    /// Validates the configuration and returns an error if invalid.
    pub fn validate(&self) -> Result<()> {
        if self.label_id <= 0 {
            return Err(Error::Config(format!(
                "Label id must be a positive integer, got {}",
                self.label_id
            )));
        }

        if self.database_path.as_os_str().is_empty() {
            return Err(Error::Config("Database path cannot be empty".to_string()));
        }

        if self.retry_policy.max_attempts == Some(0) {
            return Err(Error::Config(
                "Retry policy must allow at least one attempt".to_string(),
            ));
        }

        self.api.validate()
    }
}

fn parse_var<T: std::str::FromStr>(name: &'static str, value: &str) -> Result<T>
where
    T::Err: fmt::Display,
{
    value.parse::<T>().map_err(|e| Error::InvalidVariable {
        name,
        value: value.to_string(),
        reason: e.to_string(),
    })
}

fn parse_flag(name: &'static str, value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(Error::InvalidVariable {
            name,
            value: value.to_string(),
            reason: "expected a boolean".to_string(),
        }),
    }
}

/// Builder for constructing [`CatalogConfig`] instances.
///
/// Only the label id is required. Everything else defaults to the behavior
/// of an unattended catalog ingest: anonymous access, 100 entries per page,
/// retry forever every 60 seconds, abort on fetch failures, log and skip
/// persistence failures.
#[derive(Default)]
pub struct CatalogConfigBuilder {
    label_id: Option<i64>,
    database_path: Option<PathBuf>,
    api: ApiConfig,
    retry_policy: Option<RetryPolicy>,
    fetch_failure_policy: Option<FailurePolicy>,
    persist_failure_policy: Option<FailurePolicy>,
    attribute_write_mode: AttributeWriteMode,
    http_client: Option<Arc<dyn HttpClient>>,
}

impl CatalogConfigBuilder {
    pub fn label_id(mut self, label_id: i64) -> Self {
        self.label_id = Some(label_id);
        self
    }

    pub fn database_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.database_path = Some(path.into());
        self
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.api.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn app_name(mut self, app_name: impl Into<String>) -> Self {
        self.api.app_name = Some(app_name.into());
        self
    }

    pub fn credentials(mut self, key: impl Into<String>, secret: impl Into<String>) -> Self {
        self.api.credentials = Some(ApiCredentials::new(key, secret));
        self
    }

    pub fn page_size(mut self, page_size: u32) -> Self {
        self.api.page_size = page_size;
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.api.request_timeout = timeout;
        self
    }

    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = Some(policy);
        self
    }

    pub fn fetch_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.fetch_failure_policy = Some(policy);
        self
    }

    pub fn persist_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.persist_failure_policy = Some(policy);
        self
    }

    pub fn attribute_write_mode(mut self, mode: AttributeWriteMode) -> Self {
        self.attribute_write_mode = mode;
        self
    }

    /// Sets the HTTP client implementation.
    ///
    /// If not provided, the service builds a reqwest-based client.
    pub fn http_client(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Builds the final [`CatalogConfig`] instance.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the label id is missing or any value is
    /// out of range.
    pub fn build(self) -> Result<CatalogConfig> {
        let label_id = self.label_id.ok_or_else(|| {
            Error::Config(
                "Label id is required. Call .label_id() before building the config.".to_string(),
            )
        })?;

        let config = CatalogConfig {
            label_id,
            database_path: self
                .database_path
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATABASE_PATH)),
            api: self.api,
            retry_policy: self.retry_policy.unwrap_or_default(),
            fetch_failure_policy: self
                .fetch_failure_policy
                .unwrap_or(FailurePolicy::AbortOnFirstError),
            persist_failure_policy: self
                .persist_failure_policy
                .unwrap_or(FailurePolicy::BestEffort),
            attribute_write_mode: self.attribute_write_mode,
            http_client: self.http_client,
        };

        config.validate()?;
        Ok(config)
    }
}
