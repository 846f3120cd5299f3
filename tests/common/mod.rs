//! Common test utilities and helpers

#![allow(dead_code)]

use abstractfeed_core::{
    error::Result, Document, FeedConfig, FeedController, PreloadStore, ScoredDocument, SourceFeed,
};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::Notify;

/// Source that hands out pre-scripted batches, one per sample request.
///
/// With a gate, every sample request blocks until the gate is notified.
pub struct ScriptedSource {
    batches: Mutex<VecDeque<Vec<Document>>>,
    requested: Mutex<Vec<usize>>,
    calls: AtomicUsize,
    gate: Option<Arc<Notify>>,
}

impl ScriptedSource {
    pub fn new(batches: Vec<Vec<Document>>) -> Self {
        Self {
            batches: Mutex::new(batches.into()),
            requested: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
            gate: None,
        }
    }

    pub fn gated(batches: Vec<Vec<Document>>, gate: Arc<Notify>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::new(batches)
        }
    }

    /// Number of sample requests received
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Sizes of the sample requests received, in order
    pub fn requested(&self) -> Vec<usize> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl SourceFeed for ScriptedSource {
    async fn fetch_random(&self, _page: u32) -> Result<Option<Document>> {
        Ok(None)
    }

    fn page_count(&self) -> u32 {
        1000
    }

    async fn fetch_random_sample(&self, n: usize) -> Vec<Document> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requested.lock().unwrap().push(n);

        if let Some(gate) = &self.gate {
            gate.notified().await;
        }

        let mut batch = self.batches.lock().unwrap().pop_front().unwrap_or_default();
        batch.truncate(n);
        batch
    }
}

/// Document with a body derived from its title
pub fn doc(title: &str) -> Document {
    Document::new(
        title,
        format!("Abstract of {}.", title),
        format!("https://example.org/articles/{}", title),
    )
}

pub fn doc_with_body(title: &str, body: &str) -> Document {
    Document::new(title, body, format!("https://example.org/articles/{}", title))
}

/// `prefix-0 .. prefix-(n-1)`
pub fn docs(prefix: &str, n: usize) -> Vec<Document> {
    (0..n).map(|i| doc(&format!("{}-{}", prefix, i))).collect()
}

/// Configuration rooted in a temporary data directory
pub fn test_config(temp_dir: &TempDir) -> FeedConfig {
    let mut config = FeedConfig::default().with_data_dir(temp_dir.path());
    config.feed.shutdown_drain_timeout = Duration::from_secs(5);
    config
}

/// Leave a preload queue behind as if a previous session had ended
pub fn write_preload(config: &FeedConfig, docs: Vec<Document>) {
    let queue: Vec<ScoredDocument> = docs.into_iter().map(ScoredDocument::new).collect();
    PreloadStore::new(config.preload_path())
        .save(&queue)
        .expect("Failed to write test preload");
}

/// Titles of the feed in order
pub fn titles(controller: &FeedController) -> Vec<String> {
    controller
        .state()
        .documents()
        .iter()
        .map(|d| d.title().to_string())
        .collect()
}

pub fn controller_with(config: &FeedConfig, source: Arc<ScriptedSource>) -> FeedController {
    FeedController::new(config, source).expect("Failed to create test controller")
}
