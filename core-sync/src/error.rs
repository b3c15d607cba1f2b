use core_library::LibraryError;
use core_metadata::MetadataError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Catalog discovery failed: {0}")]
    Discovery(#[source] MetadataError),

    #[error("Failed to fetch release {reference}: {source}")]
    Fetch {
        reference: String,
        #[source]
        source: MetadataError,
    },

    #[error("Failed to persist release {release_id}: {source}")]
    Persist {
        release_id: i64,
        #[source]
        source: LibraryError,
    },

    #[error("Invalid job ID: {0}")]
    InvalidJobId(String),

    #[error("Invalid ingestion status: {0}")]
    InvalidStatus(String),

    #[error("Invalid state transition from {from} to {to}: {reason}")]
    InvalidStateTransition {
        from: String,
        to: String,
        reason: String,
    },
}

pub type Result<T> = std::result::Result<T, SyncError>;
