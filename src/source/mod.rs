//! Source catalog providers
//!
//! The feed only needs two things from a catalog: one random document from a
//! given listing page, and a best-effort sample of documents from distinct
//! random pages. Failures are absorbed here; a sample may come back short or
//! empty and the feed copes with that.

pub mod nature;

pub use nature::NatureCatalog;

use crate::error::Result;
use crate::types::Document;
use async_trait::async_trait;
use tracing::{debug, info, warn};

/// Source Feed Provider contract
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SourceFeed: Send + Sync {
    /// Fetch one random document from listing page `page` (1-based).
    /// `Ok(None)` when the page lists nothing.
    async fn fetch_random(&self, page: u32) -> Result<Option<Document>>;

    /// Number of listing pages available for sampling
    fn page_count(&self) -> u32;

    /// Fetch up to `n` documents from distinct random pages
    async fn fetch_random_sample(&self, n: usize) -> Vec<Document> {
        let pages = sample_pages(self.page_count(), n);
        fetch_pages(self, &pages).await
    }
}

/// Pick `min(n, page_count)` distinct pages from `1..=page_count`
pub fn sample_pages(page_count: u32, n: usize) -> Vec<u32> {
    let amount = n.min(page_count as usize);
    let mut rng = rand::thread_rng();
    rand::seq::index::sample(&mut rng, page_count as usize, amount)
        .into_iter()
        .map(|i| i as u32 + 1)
        .collect()
}

/// Fetch one document per page, omitting pages that fail or list nothing
pub async fn fetch_pages<S: SourceFeed + ?Sized>(source: &S, pages: &[u32]) -> Vec<Document> {
    info!("Starting random sample fetch of size {}", pages.len());
    let mut documents = Vec::with_capacity(pages.len());

    for &page in pages {
        match source.fetch_random(page).await {
            Ok(Some(doc)) => {
                debug!("Fetched '{}' from page {}", doc.title, page);
                documents.push(doc);
            }
            Ok(None) => debug!("No documents found on page {}", page),
            Err(e) => warn!("Error fetching document from page {}: {}", page, e),
        }
    }

    info!("Fetched {} documents", documents.len());
    documents
}
