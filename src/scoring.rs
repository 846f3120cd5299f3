//! Implicit-feedback scoring
//!
//! Converts engagement signals into score deltas on a `ScoredDocument`:
//! - Dwell time, attributed to the document the user is leaving
//! - Explicit likes (latched, counted once)
//! - Link opens (counted every time)
//!
//! Scores are additive within a session and never decay.

use crate::config::ScoringConfig;
use crate::types::ScoredDocument;
use std::time::Duration;
use tracing::debug;

/// Scoring engine holding the point values for each signal
#[derive(Debug, Clone)]
pub struct ScoringEngine {
    view_point_interval: Duration,
    max_view_points: u32,
    like_points: u32,
    click_points: u32,
}

impl Default for ScoringEngine {
    fn default() -> Self {
        Self::new(&ScoringConfig::default())
    }
}

impl ScoringEngine {
    /// Create a scoring engine from configuration
    pub fn new(config: &ScoringConfig) -> Self {
        Self {
            view_point_interval: Duration::from_secs(config.view_point_interval_secs.max(1)),
            max_view_points: config.max_view_points,
            like_points: config.like_points,
            click_points: config.click_points,
        }
    }

    /// Points earned for a single dwell interval
    ///
    /// `min(max_view_points, floor(dwell / interval))`
    pub fn dwell_points(&self, dwell: Duration) -> u32 {
        let intervals = dwell.as_millis() / self.view_point_interval.as_millis();
        intervals.min(self.max_view_points as u128) as u32
    }

    /// Credit the dwell time of a display interval to the document shown
    /// during it. Returns the points added.
    pub fn on_display(&self, previous: &mut ScoredDocument, dwell: Duration) -> u32 {
        let points = self.dwell_points(dwell);
        if points > 0 {
            previous.score = previous.score.saturating_add(points);
            debug!(
                "Dwell {:?} on '{}': +{} (score {})",
                dwell,
                previous.title(),
                points,
                previous.score
            );
        }
        points
    }

    /// Record an explicit like. Returns false if the document was already liked.
    pub fn on_like(&self, doc: &mut ScoredDocument) -> bool {
        if doc.liked {
            debug!("Ignoring repeated like on '{}'", doc.title());
            return false;
        }

        doc.liked = true;
        doc.score = doc.score.saturating_add(self.like_points);
        debug!("Liked '{}' (score {})", doc.title(), doc.score);
        true
    }

    /// Record the user following the document's link
    pub fn on_open(&self, doc: &mut ScoredDocument) {
        doc.score = doc.score.saturating_add(self.click_points);
        debug!("Opened '{}' (score {})", doc.title(), doc.score);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Document;
    use proptest::prelude::*;

    fn doc() -> ScoredDocument {
        ScoredDocument::new(Document::new("t", "body", "https://example.org"))
    }

    #[test]
    fn test_dwell_examples() {
        let engine = ScoringEngine::default();
        assert_eq!(engine.dwell_points(Duration::from_secs(27)), 5);
        assert_eq!(engine.dwell_points(Duration::from_secs(60)), 10);
        assert_eq!(engine.dwell_points(Duration::from_secs(3)), 0);
        assert_eq!(engine.dwell_points(Duration::from_millis(4999)), 0);
        assert_eq!(engine.dwell_points(Duration::from_secs(5)), 1);
    }

    #[test]
    fn test_on_display_accumulates() {
        let engine = ScoringEngine::default();
        let mut d = doc();

        assert_eq!(engine.on_display(&mut d, Duration::from_secs(12)), 2);
        assert_eq!(engine.on_display(&mut d, Duration::from_secs(600)), 10);
        assert_eq!(d.score, 12);
    }

    #[test]
    fn test_like_is_latched() {
        let engine = ScoringEngine::default();
        let mut d = doc();

        assert!(engine.on_like(&mut d));
        assert!(d.liked);
        assert_eq!(d.score, 10);

        for _ in 0..5 {
            assert!(!engine.on_like(&mut d));
        }
        assert!(d.liked);
        assert_eq!(d.score, 10);
    }

    #[test]
    fn test_open_is_not_idempotent() {
        let engine = ScoringEngine::default();
        let mut d = doc();

        engine.on_open(&mut d);
        engine.on_open(&mut d);
        assert_eq!(d.score, 40);
        assert!(!d.liked);
    }

    #[test]
    fn test_custom_point_values() {
        let engine = ScoringEngine::new(&ScoringConfig {
            view_point_interval_secs: 2,
            max_view_points: 3,
            like_points: 1,
            click_points: 7,
        });
        let mut d = doc();

        assert_eq!(engine.on_display(&mut d, Duration::from_secs(5)), 2);
        assert_eq!(engine.on_display(&mut d, Duration::from_secs(100)), 3);
        engine.on_like(&mut d);
        engine.on_open(&mut d);
        assert_eq!(d.score, 2 + 3 + 1 + 7);
    }

    #[test]
    fn test_score_saturates() {
        let engine = ScoringEngine::default();
        let mut d = doc();
        d.score = u32::MAX - 5;

        engine.on_open(&mut d);
        assert_eq!(d.score, u32::MAX);
    }

    proptest! {
        #[test]
        fn prop_dwell_points_match_formula(secs in 0u64..100_000) {
            let engine = ScoringEngine::default();
            let expected = std::cmp::min(10, secs / 5) as u32;
            prop_assert_eq!(engine.dwell_points(Duration::from_secs(secs)), expected);
        }

        #[test]
        fn prop_display_never_exceeds_cap(millis in 0u64..10_000_000) {
            let engine = ScoringEngine::default();
            let mut d = doc();
            let added = engine.on_display(&mut d, Duration::from_millis(millis));
            prop_assert!(added <= 10);
            prop_assert_eq!(d.score, added);
        }
    }
}
