//! Upstream catalog types

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Undecoded body of a release detail response
pub type RawPayload = Bytes;

/// Opaque URL of one release detail resource
///
/// Produced by the paginator from listing entries and consumed once by the
/// release fetcher.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReleaseReference(String);

impl ReleaseReference {
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for ReleaseReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for ReleaseReference {
    fn from(url: String) -> Self {
        Self(url)
    }
}

/// One page of a label's release listing
///
/// `releases` is required. Every entry must carry a string `resource_url`;
/// other entry fields are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct ListingPage {
    pub releases: Vec<ListingEntry>,
    #[serde(default)]
    pub pagination: Option<Pagination>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListingEntry {
    pub resource_url: String,
}

/// Listing position as reported by the API
///
/// `pages` and `items` describe the whole listing and repeat on every page.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub pages: Option<u32>,
    #[serde(default)]
    pub items: Option<u64>,
    #[serde(default)]
    pub urls: Option<PaginationUrls>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaginationUrls {
    #[serde(default)]
    pub next: Option<String>,
}

impl ListingPage {
    /// URL of the following page; `None` on the last page
    ///
    /// An empty string is treated like a missing link.
    pub fn next_url(&self) -> Option<&str> {
        self.pagination
            .as_ref()
            .and_then(|p| p.urls.as_ref())
            .and_then(|urls| urls.next.as_deref())
            .filter(|next| !next.is_empty())
    }

    /// Listing size the API claims: `(pages, items)`
    pub fn reported_totals(&self) -> (Option<u32>, Option<u64>) {
        self.pagination
            .as_ref()
            .map_or((None, None), |p| (p.pages, p.items))
    }

    /// Entries on this page as release references, in page order
    pub fn into_references(self) -> Vec<ReleaseReference> {
        self.releases
            .into_iter()
            .map(|entry| ReleaseReference::new(entry.resource_url))
            .collect()
    }
}
