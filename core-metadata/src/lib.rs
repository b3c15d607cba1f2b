//! # Catalog Metadata Module
//!
//! Talks to the upstream catalog and turns its documents into releases.
//!
//! ## Overview
//!
//! This module handles:
//! - Fetching listing pages and release documents with rate-limit backoff
//!   ([`providers::DiscogsClient`])
//! - Walking a label's paginated listing ([`paginator::CatalogPaginator`])
//! - Extracting artists, styles and genres from a release document
//!   ([`extractor::extract_release`])

pub mod error;
pub mod extractor;
pub mod paginator;
pub mod providers;
pub mod types;

pub use error::{MetadataError, Result};
pub use extractor::extract_release;
pub use paginator::CatalogPaginator;
pub use providers::DiscogsClient;
pub use types::{ListingPage, RawPayload, ReleaseReference};
