//! Background refill: fetch, deduplicate, merge with the unseen tail, rerank
//!
//! A `RefillJob` is a snapshot taken on the controller's context. Running it
//! touches only the snapshot, the source and the read-only reranker, and
//! produces a `RefillOutcome` for the controller to apply.

use crate::ranking::SimilarityReranker;
use crate::source::SourceFeed;
use crate::types::{Document, ScoredDocument};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Snapshot needed to compute a refill off the primary context
#[derive(Debug, Clone)]
pub struct RefillJob {
    pub unseen_tail: Vec<ScoredDocument>,
    pub seen_titles: HashSet<String>,
    pub batch_size: usize,
}

/// Result of a refill, applied by the controller
#[derive(Debug, Clone, Default)]
pub struct RefillOutcome {
    /// Unseen tail plus new unique documents, reranked. Empty means abort.
    pub ranked: Vec<ScoredDocument>,

    /// How many documents in `ranked` came from the new batch
    pub new_documents: usize,
}

impl RefillOutcome {
    pub fn is_empty(&self) -> bool {
        self.ranked.is_empty()
    }
}

impl RefillJob {
    pub fn new(
        unseen_tail: Vec<ScoredDocument>,
        seen_titles: HashSet<String>,
        batch_size: usize,
    ) -> Self {
        Self {
            unseen_tail,
            seen_titles,
            batch_size,
        }
    }

    /// Fetch a new batch and rerank it together with the unseen tail
    pub async fn run(
        self,
        source: &dyn SourceFeed,
        reranker: Arc<SimilarityReranker>,
    ) -> RefillOutcome {
        info!("Loading {} more documents...", self.batch_size);
        let fetched = source.fetch_random_sample(self.batch_size).await;

        let fresh = unique_new_documents(fetched, &self.seen_titles);
        let new_documents = fresh.len();

        let mut combined = self.unseen_tail;
        combined.extend(fresh.into_iter().map(ScoredDocument::new));

        if combined.is_empty() {
            warn!("No new unique documents found");
            return RefillOutcome::default();
        }

        let ranked = rerank_off_thread(reranker, combined).await;
        RefillOutcome {
            ranked,
            new_documents,
        }
    }
}

/// Drop documents whose title was already seen or repeats within the batch
pub fn unique_new_documents(fetched: Vec<Document>, seen: &HashSet<String>) -> Vec<Document> {
    let total = fetched.len();
    let mut batch_titles = HashSet::new();

    let unique: Vec<Document> = fetched
        .into_iter()
        .filter(|doc| !seen.contains(&doc.title) && batch_titles.insert(doc.title.clone()))
        .collect();

    if unique.len() < total {
        debug!("Skipped {} duplicate documents", total - unique.len());
    }
    unique
}

/// Rerank on the blocking pool; on failure keep the merged order
async fn rerank_off_thread(
    reranker: Arc<SimilarityReranker>,
    combined: Vec<ScoredDocument>,
) -> Vec<ScoredDocument> {
    let fallback = combined.clone();
    match tokio::task::spawn_blocking(move || reranker.rerank(combined)).await {
        Ok(ranked) => ranked,
        Err(e) => {
            warn!("Rerank task failed, keeping merged order: {}", e);
            fallback
        }
    }
}
