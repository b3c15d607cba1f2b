//! # Ingestion Job State Machine
//!
//! Tracks one ingestion run through its two phases with validated state
//! transitions.
//!
//! ## State Machine
//!
//! ```text
//! Pending → Discovering → Ingesting → Completed
//!     ↓          ↓            ↓
//!     └────────→ Failed ←─────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use core_sync::IngestionJob;
//!
//! let job = IngestionJob::new(1).start_discovery()?;
//! let mut job = job.start_ingesting(2)?;
//! job.record_processed(true)?;
//! job.record_processed(false)?;
//! let job = job.complete()?;
//! assert_eq!(job.progress.percent, 100);
//! ```

use crate::{Result, SyncError};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

// ============================================================================
// ID Types
// ============================================================================

/// Unique identifier for an ingestion run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IngestionJobId(Uuid);

impl IngestionJobId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a job ID from a string
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not a valid UUID
    pub fn from_string(s: &str) -> Result<Self> {
        Ok(Self(
            Uuid::parse_str(s).map_err(|e| SyncError::InvalidJobId(e.to_string()))?,
        ))
    }

    pub fn as_str(&self) -> String {
        self.0.to_string()
    }
}

impl Default for IngestionJobId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for IngestionJobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for IngestionJobId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

// ============================================================================
// Status
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IngestionStatus {
    /// Created, nothing fetched yet
    Pending,
    /// Walking the label listing
    Discovering,
    /// Fetching and persisting releases
    Ingesting,
    Completed,
    Failed,
}

impl IngestionStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, IngestionStatus::Completed | IngestionStatus::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            IngestionStatus::Pending => "pending",
            IngestionStatus::Discovering => "discovering",
            IngestionStatus::Ingesting => "ingesting",
            IngestionStatus::Completed => "completed",
            IngestionStatus::Failed => "failed",
        }
    }
}

impl FromStr for IngestionStatus {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(IngestionStatus::Pending),
            "discovering" => Ok(IngestionStatus::Discovering),
            "ingesting" => Ok(IngestionStatus::Ingesting),
            "completed" => Ok(IngestionStatus::Completed),
            "failed" => Ok(IngestionStatus::Failed),
            _ => Err(SyncError::InvalidStatus(s.to_string())),
        }
    }
}

impl std::fmt::Display for IngestionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// Progress
// ============================================================================

/// Progress of the ingestion phase
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestionProgress {
    /// References returned by discovery
    pub references_discovered: u64,
    /// References handled so far, stored or not
    pub references_processed: u64,
    /// References that failed to fetch or persist
    pub references_failed: u64,
    /// Progress percentage (0-100)
    pub percent: u8,
}

impl IngestionProgress {
    fn record(&mut self, succeeded: bool) {
        self.references_processed += 1;
        if !succeeded {
            self.references_failed += 1;
        }

        self.percent = if self.references_discovered > 0 {
            ((self.references_processed as f64 / self.references_discovered as f64) * 100.0)
                .min(100.0) as u8
        } else {
            0
        };
    }
}

// ============================================================================
// Job Entity
// ============================================================================

/// One ingestion run for one label
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestionJob {
    pub id: IngestionJobId,
    pub label_id: i64,
    pub status: IngestionStatus,
    pub progress: IngestionProgress,
    /// Error message if failed
    pub error_message: Option<String>,
    pub created_at: i64,
    pub started_at: Option<i64>,
    pub completed_at: Option<i64>,
}

impl IngestionJob {
    /// Create a job in `Pending` state
    pub fn new(label_id: i64) -> Self {
        Self {
            id: IngestionJobId::new(),
            label_id,
            status: IngestionStatus::Pending,
            progress: IngestionProgress::default(),
            error_message: None,
            created_at: current_timestamp(),
            started_at: None,
            completed_at: None,
        }
    }

    /// Enter the discovery phase
    ///
    /// # Errors
    ///
    /// Returns an error if the job is not `Pending`
    pub fn start_discovery(mut self) -> Result<Self> {
        self.validate_transition(IngestionStatus::Discovering)?;
        self.status = IngestionStatus::Discovering;
        self.started_at = Some(current_timestamp());
        Ok(self)
    }

    /// Enter the ingestion phase with the number of discovered references
    ///
    /// # Errors
    ///
    /// Returns an error if the job is not `Discovering`
    pub fn start_ingesting(mut self, references_discovered: u64) -> Result<Self> {
        self.validate_transition(IngestionStatus::Ingesting)?;
        self.status = IngestionStatus::Ingesting;
        self.progress.references_discovered = references_discovered;
        Ok(self)
    }

    /// Count one handled reference
    ///
    /// # Errors
    ///
    /// Returns an error if the job is not `Ingesting`
    pub fn record_processed(&mut self, succeeded: bool) -> Result<()> {
        if self.status != IngestionStatus::Ingesting {
            return Err(SyncError::InvalidStateTransition {
                from: self.status.as_str().to_string(),
                to: "record_processed".to_string(),
                reason: "Job must be ingesting to record progress".to_string(),
            });
        }

        self.progress.record(succeeded);
        Ok(())
    }

    /// # Errors
    ///
    /// Returns an error if the job is not `Ingesting`
    pub fn complete(mut self) -> Result<Self> {
        self.validate_transition(IngestionStatus::Completed)?;
        self.status = IngestionStatus::Completed;
        self.completed_at = Some(current_timestamp());
        self.progress.percent = 100;
        Ok(self)
    }

    /// # Errors
    ///
    /// Returns an error if the job is already terminal
    pub fn fail(mut self, error_message: impl Into<String>) -> Result<Self> {
        self.validate_transition(IngestionStatus::Failed)?;
        self.status = IngestionStatus::Failed;
        self.completed_at = Some(current_timestamp());
        self.error_message = Some(error_message.into());
        Ok(self)
    }

    /// Duration of the job in seconds, once it has started and finished
    pub fn duration_secs(&self) -> Option<u64> {
        match (self.started_at, self.completed_at) {
            (Some(start), Some(end)) => Some(end.saturating_sub(start).max(0) as u64),
            _ => None,
        }
    }

    fn validate_transition(&self, to: IngestionStatus) -> Result<()> {
        let valid = matches!(
            (self.status, to),
            (IngestionStatus::Pending, IngestionStatus::Discovering)
                | (IngestionStatus::Pending, IngestionStatus::Failed)
                | (IngestionStatus::Discovering, IngestionStatus::Ingesting)
                | (IngestionStatus::Discovering, IngestionStatus::Failed)
                | (IngestionStatus::Ingesting, IngestionStatus::Completed)
                | (IngestionStatus::Ingesting, IngestionStatus::Failed)
        );

        if !valid {
            return Err(SyncError::InvalidStateTransition {
                from: self.status.as_str().to_string(),
                to: to.as_str().to_string(),
                reason: format!(
                    "Cannot transition from {} to {}",
                    self.status.as_str(),
                    to.as_str()
                ),
            });
        }

        Ok(())
    }
}

fn current_timestamp() -> i64 {
    Utc::now().timestamp()
}

// ============================================================================
// Tests
// ============================================================================
