//! # Catalog Ingestion Module
//!
//! Orchestrates ingestion of a label's catalog into the release database.
//!
//! ## Components
//!
//! - **Ingestion Job** (`job`): run lifecycle with validated state transitions
//! - **Ingestion Coordinator** (`coordinator`): discovery, then fetch,
//!   extract and persist for each discovered release

pub mod coordinator;
pub mod error;
pub mod job;

pub use coordinator::{
    FetchFailure, IngestionConfig, IngestionCoordinator, IngestionReport, PersistFailure,
};
pub use core_runtime::config::FailurePolicy;
pub use error::{Result, SyncError};
pub use job::{IngestionJob, IngestionJobId, IngestionProgress, IngestionStatus};
