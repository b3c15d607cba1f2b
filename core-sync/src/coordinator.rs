//! # Ingestion Coordinator
//!
//! Sequences catalog discovery, release fetching, attribute extraction and
//! persistence for one label.
//!
//! ## Workflow
//!
//! 1. Walk the label listing to completion and collect every release
//!    reference (any failure fails the run)
//! 2. For each reference, in discovery order:
//!    - fetch the release document
//!    - extract artists, styles and genres
//!    - store the release in its own transaction
//!
//! Every step is awaited before the next one starts. Backoff waits inside
//! the client block the whole pipeline.
//!
//! ## Failure handling
//!
//! Fetch and extraction failures follow
//! [`IngestionConfig::fetch_failure_policy`]; persistence failures follow
//! [`IngestionConfig::persist_failure_policy`]. Under
//! [`FailurePolicy::BestEffort`] the failure is logged, recorded in the
//! [`IngestionReport`] and the loop moves on to the next reference.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use core_sync::{IngestionConfig, IngestionCoordinator};
//!
//! let coordinator = IngestionCoordinator::new(client, releases, IngestionConfig::default());
//! let report = coordinator.run(1).await?;
//! println!("Stored {} of {} releases", report.stored, report.discovered);
//! ```

use crate::job::{IngestionJob, IngestionJobId};
use crate::{Result, SyncError};
use core_library::models::{Release, StoreOutcome};
use core_library::repositories::ReleaseRepository;
use core_metadata::{
    extract_release, CatalogPaginator, DiscogsClient, MetadataError, ReleaseReference,
};
use core_runtime::config::{CatalogConfig, FailurePolicy, DEFAULT_PAGE_SIZE};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

/// Ingestion loop configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestionConfig {
    /// Listing page size requested from the API
    pub page_size: u32,

    /// Applied when a release cannot be fetched or decoded
    pub fetch_failure_policy: FailurePolicy,

    /// Applied when a release cannot be persisted
    pub persist_failure_policy: FailurePolicy,
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            fetch_failure_policy: FailurePolicy::AbortOnFirstError,
            persist_failure_policy: FailurePolicy::BestEffort,
        }
    }
}

impl From<&CatalogConfig> for IngestionConfig {
    fn from(config: &CatalogConfig) -> Self {
        Self {
            page_size: config.api.page_size,
            fetch_failure_policy: config.fetch_failure_policy,
            persist_failure_policy: config.persist_failure_policy,
        }
    }
}

/// A reference that was skipped because it could not be fetched or decoded
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchFailure {
    pub reference: String,
    pub message: String,
}

/// A release that was fetched but could not be stored
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistFailure {
    pub release_id: i64,
    pub message: String,
}

/// Outcome of one completed ingestion run
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestionReport {
    pub job: IngestionJob,
    pub label_id: i64,
    /// References returned by discovery
    pub discovered: usize,
    /// Releases committed to the database
    pub stored: usize,
    /// Stored releases whose row did not exist before
    pub created: usize,
    pub attributes_written: u64,
    pub fetch_failures: Vec<FetchFailure>,
    pub persist_failures: Vec<PersistFailure>,
}

impl IngestionReport {
    pub fn job_id(&self) -> IngestionJobId {
        self.job.id
    }

    /// True when every discovered reference was stored
    pub fn is_complete(&self) -> bool {
        self.fetch_failures.is_empty() && self.persist_failures.is_empty()
    }
}

#[derive(Default)]
struct Tally {
    stored: usize,
    created: usize,
    attributes_written: u64,
    fetch_failures: Vec<FetchFailure>,
    persist_failures: Vec<PersistFailure>,
}

impl Tally {
    fn record(&mut self, outcome: &StoreOutcome) {
        self.stored += 1;
        if outcome.created {
            self.created += 1;
        }
        self.attributes_written += outcome.attributes_written;
    }
}

/// Runs label ingestion end to end
pub struct IngestionCoordinator {
    client: Arc<DiscogsClient>,
    paginator: CatalogPaginator,
    releases: Arc<dyn ReleaseRepository>,
    config: IngestionConfig,
}

impl IngestionCoordinator {
    pub fn new(
        client: Arc<DiscogsClient>,
        releases: Arc<dyn ReleaseRepository>,
        config: IngestionConfig,
    ) -> Self {
        let paginator = CatalogPaginator::with_page_size(client.clone(), config.page_size);

        Self {
            client,
            paginator,
            releases,
            config,
        }
    }

    pub fn config(&self) -> &IngestionConfig {
        &self.config
    }

    /// Ingest the full catalog of `label_id`
    ///
    /// # Errors
    ///
    /// - [`SyncError::Discovery`] if the listing walk fails
    /// - [`SyncError::Fetch`] on the first fetch or decode failure when the
    ///   fetch policy is [`FailurePolicy::AbortOnFirstError`]
    /// - [`SyncError::Persist`] on the first persistence failure when the
    ///   persist policy is [`FailurePolicy::AbortOnFirstError`]
    #[instrument(skip(self))]
    pub async fn run(&self, label_id: i64) -> Result<IngestionReport> {
        let job = IngestionJob::new(label_id);
        info!(job_id = %job.id, "Starting catalog ingestion");

        let job = job.start_discovery()?;
        let references = match self.paginator.collect_references(label_id).await {
            Ok(references) => references,
            Err(e) => return Err(abort(job, SyncError::Discovery(e))),
        };

        let discovered = references.len();
        let mut job = job.start_ingesting(discovered as u64)?;
        let mut tally = Tally::default();

        for reference in references {
            let release = match self.fetch_and_extract(&reference).await {
                Ok(release) => release,
                Err(source) => match self.config.fetch_failure_policy {
                    FailurePolicy::AbortOnFirstError => {
                        return Err(abort(
                            job,
                            SyncError::Fetch {
                                reference: reference.into_inner(),
                                source,
                            },
                        ));
                    }
                    FailurePolicy::BestEffort => {
                        warn!(reference = %reference, error = %source, "Skipping release");
                        tally.fetch_failures.push(FetchFailure {
                            reference: reference.into_inner(),
                            message: source.to_string(),
                        });
                        job.record_processed(false)?;
                        continue;
                    }
                },
            };

            match self.releases.store(&release).await {
                Ok(outcome) => {
                    info!(
                        release_id = outcome.release_id,
                        created = outcome.created,
                        attributes = outcome.attributes_written,
                        "Stored release"
                    );
                    tally.record(&outcome);
                    job.record_processed(true)?;
                }
                Err(source) => match self.config.persist_failure_policy {
                    FailurePolicy::AbortOnFirstError => {
                        return Err(abort(
                            job,
                            SyncError::Persist {
                                release_id: release.id(),
                                source,
                            },
                        ));
                    }
                    FailurePolicy::BestEffort => {
                        error!(
                            release_id = release.id(),
                            error = %source,
                            "Failed to persist release"
                        );
                        tally.persist_failures.push(PersistFailure {
                            release_id: release.id(),
                            message: source.to_string(),
                        });
                        job.record_processed(false)?;
                    }
                },
            }
        }

        let job = job.complete()?;

        info!(
            job_id = %job.id,
            discovered,
            stored = tally.stored,
            created = tally.created,
            attributes_written = tally.attributes_written,
            fetch_failures = tally.fetch_failures.len(),
            persist_failures = tally.persist_failures.len(),
            "Catalog ingestion complete"
        );

        Ok(IngestionReport {
            job,
            label_id,
            discovered,
            stored: tally.stored,
            created: tally.created,
            attributes_written: tally.attributes_written,
            fetch_failures: tally.fetch_failures,
            persist_failures: tally.persist_failures,
        })
    }

    async fn fetch_and_extract(
        &self,
        reference: &ReleaseReference,
    ) -> std::result::Result<Release, MetadataError> {
        let payload = self.client.fetch_release(reference).await?;
        let release = extract_release(&payload)?;

        debug!(
            release_id = release.id(),
            attributes = release.attribute_count(),
            "Extracted release"
        );

        Ok(release)
    }
}

/// Move the job to `Failed` and hand back the error that caused it
fn abort(job: IngestionJob, error: SyncError) -> SyncError {
    let job_id = job.id;
    match job.fail(error.to_string()) {
        Ok(failed) => error!(
            job_id = %job_id,
            status = %failed.status,
            error = %error,
            "Catalog ingestion failed"
        ),
        Err(transition) => error!(
            job_id = %job_id,
            error = %error,
            transition_error = %transition,
            "Catalog ingestion failed"
        ),
    }
    error
}
