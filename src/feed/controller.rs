//! Feed controller: the only place session state is mutated

use super::refill::{RefillJob, RefillOutcome};
use super::state::FeedState;
use super::FeedPhase;
use crate::config::{FeedConfig, FeedSettings};
use crate::error::Result;
use crate::persistence::{AbstractArchive, PreloadStore};
use crate::ranking::SimilarityReranker;
use crate::scoring::ScoringEngine;
use crate::source::SourceFeed;
use crate::types::{CurrentView, Direction, Document, ScoredDocument};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::oneshot::{self, error::TryRecvError};
use tracing::{debug, info, warn};

/// What shutdown persisted
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShutdownReport {
    /// Archive file written, if anything cleared the cutoff
    pub archive_path: Option<PathBuf>,

    /// Number of documents written to the preload queue
    pub preloaded: usize,
}

/// Owns the feed and drives every transition of the session
pub struct FeedController {
    state: FeedState,
    phase: FeedPhase,
    scoring: ScoringEngine,
    source: Arc<dyn SourceFeed>,
    reranker: Arc<SimilarityReranker>,
    archive: AbstractArchive,
    preload: PreloadStore,
    settings: FeedSettings,
    preload_size: usize,
    refreshing: AtomicBool,
    pending_initial: Option<oneshot::Receiver<Vec<Document>>>,
    pending_refill: Option<oneshot::Receiver<RefillOutcome>>,
    last_display: Instant,
}

impl FeedController {
    /// Build a controller and load the ranking corpus from the archive
    pub fn new(config: &FeedConfig, source: Arc<dyn SourceFeed>) -> Result<Self> {
        config.validate()?;

        let archive = AbstractArchive::from_config(config);
        let reranker = SimilarityReranker::new(archive.load_corpus());
        if !reranker.is_active() {
            info!("No usable corpus yet, new documents keep their fetch order");
        }

        Ok(Self {
            state: FeedState::new(),
            phase: FeedPhase::Empty,
            scoring: ScoringEngine::new(&config.scoring),
            source,
            reranker: Arc::new(reranker),
            archive,
            preload: PreloadStore::new(config.preload_path()),
            settings: config.feed.clone(),
            preload_size: config.persistence.preload_size,
            refreshing: AtomicBool::new(false),
            pending_initial: None,
            pending_refill: None,
            last_display: Instant::now(),
        })
    }

    pub fn phase(&self) -> FeedPhase {
        self.phase
    }

    pub fn state(&self) -> &FeedState {
        &self.state
    }

    pub fn corpus_len(&self) -> usize {
        self.reranker.corpus_len()
    }

    /// Whether a refill is in flight
    pub fn is_refreshing(&self) -> bool {
        self.refreshing.load(Ordering::Acquire)
    }

    /// When the current document was put on screen
    pub fn displayed_since(&self) -> Instant {
        self.last_display
    }

    /// The document on screen, if any
    pub fn current(&self) -> Option<CurrentView> {
        if self.phase != FeedPhase::Ready {
            return None;
        }
        self.state
            .current()
            .map(|doc| CurrentView::from_scored(doc, self.state.current_index(), self.state.len()))
    }

    /// Seed the feed from the preload queue, or start the initial fetch.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&mut self) -> FeedPhase {
        if self.phase != FeedPhase::Empty || !self.state.is_empty() {
            return self.phase;
        }

        if let Some(docs) = self.preload.load() {
            self.state.seed(docs);
            self.enter_ready();
            return self.phase;
        }

        warn!("No preloaded documents found. Starting fresh fetch...");
        let source = Arc::clone(&self.source);
        let batch_size = self.settings.initial_batch_size;
        let (tx, rx) = oneshot::channel();
        tokio::spawn(async move {
            let docs = source.fetch_random_sample(batch_size).await;
            if tx.send(docs).is_err() {
                debug!("Initial fetch finished after the controller went away");
            }
        });

        self.pending_initial = Some(rx);
        self.phase = FeedPhase::Loading;
        self.phase
    }

    /// Apply any finished background work. Returns whether the feed changed.
    pub fn poll(&mut self) -> bool {
        let mut changed = false;

        if let Some(rx) = self.pending_initial.as_mut() {
            match rx.try_recv() {
                Ok(docs) => {
                    self.pending_initial = None;
                    self.apply_initial(docs);
                    changed = true;
                }
                Err(TryRecvError::Empty) => {}
                Err(TryRecvError::Closed) => {
                    self.pending_initial = None;
                    warn!("Initial fetch task ended without a result");
                    self.apply_initial(Vec::new());
                    changed = true;
                }
            }
        }

        if let Some(rx) = self.pending_refill.as_mut() {
            match rx.try_recv() {
                Ok(outcome) => {
                    self.pending_refill = None;
                    changed |= self.apply_refill(outcome);
                }
                Err(TryRecvError::Empty) => {}
                Err(TryRecvError::Closed) => {
                    self.pending_refill = None;
                    self.refreshing.store(false, Ordering::Release);
                    warn!("Refill task ended without a result");
                }
            }
        }

        changed
    }

    /// Wait for the initial load to finish and apply it
    pub async fn wait_until_ready(&mut self) -> FeedPhase {
        if let Some(rx) = self.pending_initial.take() {
            match rx.await {
                Ok(docs) => self.apply_initial(docs),
                Err(_) => {
                    warn!("Initial fetch task ended without a result");
                    self.apply_initial(Vec::new());
                }
            }
        }
        self.phase
    }

    /// Wait for the in-flight refill, if any, and apply it.
    /// Returns whether a refill was pending.
    pub async fn wait_for_refill(&mut self) -> bool {
        let Some(rx) = self.pending_refill.take() else {
            return false;
        };

        match rx.await {
            Ok(outcome) => {
                self.apply_refill(outcome);
            }
            Err(_) => {
                self.refreshing.store(false, Ordering::Release);
                warn!("Refill task ended without a result");
            }
        }
        true
    }

    /// Navigate one step, crediting dwell time to the document on screen
    pub fn advance(&mut self, direction: Direction) -> bool {
        self.advance_at(direction, Instant::now())
    }

    /// `advance` with an explicit clock reading.
    ///
    /// The interval since the last display is credited to the document that
    /// was on screen, even when the cursor is already at the edge. Returns
    /// whether the cursor moved.
    pub fn advance_at(&mut self, direction: Direction, now: Instant) -> bool {
        if self.phase != FeedPhase::Ready {
            return false;
        }

        let dwell = now.saturating_duration_since(self.last_display);
        if let Some(doc) = self.state.current_mut() {
            self.scoring.on_display(doc, dwell);
        }
        self.last_display = now;

        if !self.state.move_cursor(direction) {
            debug!("No more documents to display {:?}", direction);
            return false;
        }
        debug!(
            "Displaying document {} of {}",
            self.state.current_index() + 1,
            self.state.len()
        );

        if direction == Direction::Forward && self.needs_refill() {
            self.request_refill();
        }
        true
    }

    fn needs_refill(&self) -> bool {
        let granularity = self.settings.refill_granularity.max(1);
        self.state.unseen_count() < self.settings.unseen_low_watermark
            && self.state.current_index() % granularity == 0
    }

    /// Like the current document. Returns false if nothing was recorded.
    pub fn like(&mut self) -> bool {
        if self.phase != FeedPhase::Ready {
            return false;
        }
        match self.state.current_mut() {
            Some(doc) => self.scoring.on_like(doc),
            None => false,
        }
    }

    /// Record an open of the current document and return its link
    pub fn open(&mut self) -> Option<String> {
        if self.phase != FeedPhase::Ready {
            return None;
        }
        let doc = self.state.current_mut()?;
        self.scoring.on_open(doc);
        info!("Opened document URL: {}", doc.url());
        Some(doc.url().to_string())
    }

    /// Manually request more documents
    pub fn refresh(&mut self) -> bool {
        self.request_refill()
    }

    /// Start a background refill unless one is already in flight
    fn request_refill(&mut self) -> bool {
        if self.phase == FeedPhase::Loading {
            debug!("Initial load still running, not refilling");
            return false;
        }
        if self
            .refreshing
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            warn!("Already loading more documents, skipping refill request");
            return false;
        }

        let job = RefillJob::new(
            self.state.unseen_tail().to_vec(),
            self.state.seen_titles().clone(),
            self.settings.refill_batch_size,
        );
        let source = Arc::clone(&self.source);
        let reranker = Arc::clone(&self.reranker);
        let (tx, rx) = oneshot::channel();

        tokio::spawn(async move {
            let outcome = job.run(source.as_ref(), reranker).await;
            if tx.send(outcome).is_err() {
                debug!("Refill finished after the controller went away");
            }
        });

        self.pending_refill = Some(rx);
        true
    }

    fn apply_initial(&mut self, docs: Vec<Document>) {
        if docs.is_empty() {
            warn!("Failed to fetch any documents");
            self.phase = FeedPhase::Empty;
            return;
        }

        info!("Fetched {} documents, displaying the first", docs.len());
        self.state
            .seed(docs.into_iter().map(ScoredDocument::new).collect());
        self.enter_ready();
    }

    fn apply_refill(&mut self, outcome: RefillOutcome) -> bool {
        self.refreshing.store(false, Ordering::Release);
        if outcome.is_empty() {
            return false;
        }

        let unseen = self.state.replace_unseen(outcome.ranked);
        info!(
            "Re-ranked {} unseen documents ({} new)",
            unseen, outcome.new_documents
        );

        if self.phase != FeedPhase::Ready && !self.state.is_empty() {
            self.enter_ready();
        }
        true
    }

    fn enter_ready(&mut self) {
        self.phase = FeedPhase::Ready;
        self.state.mark_displayed();
        self.last_display = Instant::now();
    }

    /// Finish the session: drain background work, then archive the top
    /// documents and write the preload queue. Persistence failures are
    /// logged, never returned.
    pub async fn shutdown(self) -> ShutdownReport {
        self.shutdown_at(Instant::now()).await
    }

    /// `shutdown` with an explicit clock reading for the final dwell credit
    pub async fn shutdown_at(mut self, now: Instant) -> ShutdownReport {
        let limit = self.settings.shutdown_drain_timeout;
        self.drain(limit).await;

        if self.phase == FeedPhase::Ready {
            let dwell = now.saturating_duration_since(self.last_display);
            if let Some(doc) = self.state.current_mut() {
                self.scoring.on_display(doc, dwell);
            }
        }

        let archive_path = match self.archive.save_top_abstracts(self.state.documents()) {
            Ok(path) => path,
            Err(e) => {
                warn!("Error saving top abstracts: {}", e);
                None
            }
        };

        self.top_up_unseen(limit).await;

        let queue: Vec<ScoredDocument> = self
            .state
            .unseen_tail()
            .iter()
            .take(self.preload_size)
            .cloned()
            .collect();
        let preloaded = match self.preload.save(&queue) {
            Ok(()) => queue.len(),
            Err(e) => {
                warn!("Error saving preloaded documents: {}", e);
                0
            }
        };

        for (i, doc) in self.state.documents().iter().enumerate() {
            debug!("Document {}: '{}' score {}", i + 1, doc.title(), doc.score);
        }
        info!("Session closed");

        ShutdownReport {
            archive_path,
            preloaded,
        }
    }

    async fn drain(&mut self, limit: Duration) {
        if let Some(rx) = self.pending_initial.take() {
            match tokio::time::timeout(limit, rx).await {
                Ok(Ok(docs)) => self.apply_initial(docs),
                Ok(Err(_)) => warn!("Initial fetch task ended without a result"),
                Err(_) => warn!("Initial fetch still running after {:?}, abandoning it", limit),
            }
        }

        if let Some(rx) = self.pending_refill.take() {
            debug!("Waiting for the in-flight refill");
            match tokio::time::timeout(limit, rx).await {
                Ok(Ok(outcome)) => {
                    self.apply_refill(outcome);
                }
                Ok(Err(_)) => {
                    self.refreshing.store(false, Ordering::Release);
                    warn!("Refill task ended without a result");
                }
                Err(_) => {
                    self.refreshing.store(false, Ordering::Release);
                    warn!("Refill still running after {:?}, abandoning it", limit);
                }
            }
        }
    }

    /// Fetch enough documents that the preload queue is full
    async fn top_up_unseen(&mut self, limit: Duration) {
        let unseen = self.state.unseen_count();
        let missing = self.preload_size.saturating_sub(unseen);
        if missing == 0 {
            return;
        }

        debug!(
            "{} unseen documents, fetching {} more for the preload queue",
            unseen, missing
        );
        let job = RefillJob::new(
            self.state.unseen_tail().to_vec(),
            self.state.seen_titles().clone(),
            missing,
        );

        let run = job.run(self.source.as_ref(), Arc::clone(&self.reranker));
        match tokio::time::timeout(limit, run).await {
            Ok(outcome) if !outcome.is_empty() => {
                self.state.replace_unseen(outcome.ranked);
            }
            Ok(_) => {}
            Err(_) => warn!("Preload fetch still running after {:?}, saving what we have", limit),
        }
    }
}
