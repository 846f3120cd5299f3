//! Feed state machine
//!
//! The controller owns the whole session: the ordered feed, the navigation
//! cursors, the seen-title set and the background work. Background tasks
//! (initial fetch, refill) never touch the feed; they send a result back and
//! the controller applies it on the caller's context.
//!
//! # Phases
//!
//! `Empty -> Loading -> Ready`. A preload from the previous session goes
//! straight to `Ready`. While `Ready`, at most one refill is in flight; a
//! refill requested while another runs is dropped.
//!
//! # Unseen window
//!
//! Documents past the furthest position the user has displayed are unseen.
//! Only that suffix is ever reordered or replaced by a refill.

pub mod controller;
pub mod refill;
pub mod state;

pub use controller::{FeedController, ShutdownReport};
pub use refill::{RefillJob, RefillOutcome};
pub use state::FeedState;

/// Lifecycle phase of the feed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedPhase {
    /// Nothing to show and nothing loading
    Empty,

    /// Initial batch being fetched
    Loading,

    /// At least one document available
    Ready,
}

impl std::fmt::Display for FeedPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FeedPhase::Empty => write!(f, "empty"),
            FeedPhase::Loading => write!(f, "loading"),
            FeedPhase::Ready => write!(f, "ready"),
        }
    }
}
