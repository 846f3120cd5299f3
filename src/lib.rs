//! Abstractfeed - Personalized Abstract Feed
//!
//! An endless, one-at-a-time feed of research abstracts that learns from
//! implicit feedback:
//! - Dwell time, likes and link opens accumulate into per-document scores
//! - Top-scoring abstracts are archived and form the ranking corpus
//! - Newly fetched documents are reranked by TF-IDF similarity to that corpus
//! - Unseen documents are handed over to the next session
//!
//! # Architecture
//!
//! - **Types**: Core data structures (Document, ScoredDocument, ...)
//! - **Scoring**: engagement signals to score deltas
//! - **Ranking**: TF-IDF vector space and the similarity reranker
//! - **Source**: catalog providers behind the `SourceFeed` trait
//! - **Feed**: the controller state machine and background refill
//! - **Persistence**: archive and preload files
//!
//! # Example
//!
//! ```ignore
//! use abstractfeed_core::{Direction, FeedConfig, FeedController, NatureCatalog};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = FeedConfig::load(None)?;
//!     let source = Arc::new(NatureCatalog::new(&config.source)?);
//!     let mut feed = FeedController::new(&config, source)?;
//!
//!     feed.start();
//!     feed.wait_until_ready().await;
//!     feed.like();
//!     feed.advance(Direction::Forward);
//!
//!     let report = feed.shutdown().await;
//!     println!("Preloaded {} documents", report.preloaded);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod feed;
pub mod persistence;
pub mod ranking;
pub mod scoring;
pub mod source;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use config::FeedConfig;
pub use error::{FeedError, Result};
pub use feed::{FeedController, FeedPhase, ShutdownReport};
pub use persistence::{AbstractArchive, PreloadStore};
pub use ranking::{rank_by_similarity, SimilarityReranker};
pub use scoring::ScoringEngine;
pub use source::{NatureCatalog, SourceFeed};
pub use types::{CurrentView, Direction, Document, ScoredDocument};
