//! Catalog discovery over paginated label listings

use crate::error::{MetadataError, Result};
use crate::providers::DiscogsClient;
use crate::types::ReleaseReference;
use core_runtime::config::DEFAULT_PAGE_SIZE;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Walks a label's release listing from page 1 to the last page
///
/// Each page is fetched through the client's retry loop. The walk follows
/// `pagination.urls.next` until it is absent or `null`; a link back to a
/// page already visited fails the walk instead of looping forever.
pub struct CatalogPaginator {
    client: Arc<DiscogsClient>,
    page_size: u32,
}

impl CatalogPaginator {
    pub fn new(client: Arc<DiscogsClient>) -> Self {
        Self::with_page_size(client, DEFAULT_PAGE_SIZE)
    }

    pub fn with_page_size(client: Arc<DiscogsClient>, page_size: u32) -> Self {
        Self { client, page_size }
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Collect every release reference listed for `label_id`
    ///
    /// References come back in upstream order: page by page, entries in
    /// page order. Any page failure aborts the whole walk.
    #[instrument(skip(self))]
    pub async fn collect_references(&self, label_id: i64) -> Result<Vec<ReleaseReference>> {
        let mut url = self.client.label_releases_url(label_id, self.page_size);
        let mut visited = HashSet::new();
        let mut references = Vec::new();
        let mut pages = 0u32;
        let mut reported = (None, None);

        loop {
            visited.insert(url.clone());

            let page = self.client.fetch_page(&url).await?;
            pages += 1;
            if pages == 1 {
                reported = page.reported_totals();
            }

            let next = page.next_url().map(str::to_string);
            let entries = page.into_references();
            debug!(page = pages, entries = entries.len(), "Fetched listing page");
            references.extend(entries);

            match next {
                Some(next) if visited.contains(&next) => {
                    return Err(MetadataError::PaginationLoop { url: next });
                }
                Some(next) => url = next,
                None => break,
            }
        }

        let (reported_pages, reported_items) = reported;
        if let Some(items) = reported_items {
            if items != references.len() as u64 {
                warn!(
                    label_id,
                    reported_items = items,
                    references = references.len(),
                    "Listing size differs from the reported item count"
                );
            }
        }

        info!(
            label_id,
            pages,
            reported_pages,
            reported_items,
            references = references.len(),
            "Catalog discovery complete"
        );

        Ok(references)
    }
}
