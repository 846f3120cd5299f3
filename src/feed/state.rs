//! Session state: the feed, its two cursors and the seen-title set

use crate::types::{Direction, ScoredDocument};
use std::collections::HashSet;

/// Feed plus navigation cursors
///
/// `last_seen_index` is `None` until the head of the feed has been displayed.
/// Once set it never decreases and is always at least `current_index`.
#[derive(Debug, Default, Clone)]
pub struct FeedState {
    docs: Vec<ScoredDocument>,
    current_index: usize,
    last_seen_index: Option<usize>,
    seen_titles: HashSet<String>,
}

impl FeedState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    pub fn documents(&self) -> &[ScoredDocument] {
        &self.docs
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn last_seen_index(&self) -> Option<usize> {
        self.last_seen_index
    }

    pub fn seen_titles(&self) -> &HashSet<String> {
        &self.seen_titles
    }

    pub fn is_title_seen(&self, title: &str) -> bool {
        self.seen_titles.contains(title)
    }

    pub fn current(&self) -> Option<&ScoredDocument> {
        self.docs.get(self.current_index)
    }

    pub fn current_mut(&mut self) -> Option<&mut ScoredDocument> {
        self.docs.get_mut(self.current_index)
    }

    /// First index of the unseen window
    pub fn seen_boundary(&self) -> usize {
        match self.last_seen_index {
            Some(index) => (index + 1).min(self.docs.len()),
            None => 0,
        }
    }

    /// Documents never displayed
    pub fn unseen_tail(&self) -> &[ScoredDocument] {
        &self.docs[self.seen_boundary()..]
    }

    pub fn unseen_count(&self) -> usize {
        self.docs.len() - self.seen_boundary()
    }

    /// Append documents to the tail without deduplication, registering
    /// their titles. Used for the initial batch and the preload queue.
    pub fn seed(&mut self, docs: Vec<ScoredDocument>) {
        for doc in &docs {
            self.seen_titles.insert(doc.title().to_string());
        }
        self.docs.extend(docs);
    }

    /// Record that the current document is on screen
    pub fn mark_displayed(&mut self) {
        if self.docs.is_empty() {
            return;
        }
        let reached = match self.last_seen_index {
            Some(index) => index.max(self.current_index),
            None => self.current_index,
        };
        self.last_seen_index = Some(reached);
    }

    /// Move the current cursor one step, clamped to the feed.
    /// Returns whether it moved.
    pub fn move_cursor(&mut self, direction: Direction) -> bool {
        if self.docs.is_empty() {
            return false;
        }

        let moved = match direction {
            Direction::Forward if self.current_index + 1 < self.docs.len() => {
                self.current_index += 1;
                true
            }
            Direction::Backward if self.current_index > 0 => {
                self.current_index -= 1;
                true
            }
            _ => false,
        };

        if moved {
            self.mark_displayed();
        }
        moved
    }

    /// Replace the unseen window with `ranked`.
    ///
    /// The boundary is taken from the cursors as they are now, so documents
    /// displayed since `ranked` was computed stay where they are and are
    /// dropped from `ranked`. The seen prefix is never modified. Returns the
    /// number of documents in the new unseen window.
    pub fn replace_unseen(&mut self, ranked: Vec<ScoredDocument>) -> usize {
        let boundary = self.seen_boundary();
        let mut kept: HashSet<String> = self.docs[..boundary]
            .iter()
            .map(|doc| doc.title().to_string())
            .collect();

        let suffix: Vec<ScoredDocument> = ranked
            .into_iter()
            .filter(|doc| kept.insert(doc.title().to_string()))
            .collect();

        for doc in &suffix {
            self.seen_titles.insert(doc.title().to_string());
        }

        self.docs.truncate(boundary);
        self.docs.extend(suffix);
        self.docs.len() - boundary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Document;

    fn docs(titles: &[&str]) -> Vec<ScoredDocument> {
        titles
            .iter()
            .map(|t| ScoredDocument::new(Document::new(*t, "body", "url")))
            .collect()
    }

    fn titles(state: &FeedState) -> Vec<&str> {
        state.documents().iter().map(|d| d.title()).collect()
    }

    #[test]
    fn test_fresh_state_has_nothing_seen() {
        let mut state = FeedState::new();
        state.seed(docs(&["a", "b", "c"]));

        assert_eq!(state.last_seen_index(), None);
        assert_eq!(state.unseen_count(), 3);
        assert!(state.is_title_seen("b"));
    }

    #[test]
    fn test_cursor_clamps_and_tracks_high_water_mark() {
        let mut state = FeedState::new();
        state.seed(docs(&["a", "b", "c"]));
        state.mark_displayed();

        assert!(!state.move_cursor(Direction::Backward));
        assert!(state.move_cursor(Direction::Forward));
        assert!(state.move_cursor(Direction::Forward));
        assert!(!state.move_cursor(Direction::Forward));
        assert_eq!(state.current_index(), 2);
        assert_eq!(state.last_seen_index(), Some(2));

        assert!(state.move_cursor(Direction::Backward));
        assert_eq!(state.current_index(), 1);
        assert_eq!(state.last_seen_index(), Some(2));
        assert_eq!(state.unseen_count(), 0);
    }

    #[test]
    fn test_empty_state_does_not_move() {
        let mut state = FeedState::new();
        state.mark_displayed();
        assert!(!state.move_cursor(Direction::Forward));
        assert_eq!(state.last_seen_index(), None);
        assert!(state.current().is_none());
    }

    #[test]
    fn test_replace_unseen_keeps_prefix() {
        let mut state = FeedState::new();
        state.seed(docs(&["a", "b", "c", "d"]));
        state.mark_displayed();
        state.move_cursor(Direction::Forward);
        state.current_mut().unwrap().score = 9;

        let len = state.replace_unseen(docs(&["x", "d", "c"]));

        assert_eq!(len, 3);
        assert_eq!(titles(&state), vec!["a", "b", "x", "d", "c"]);
        assert_eq!(state.documents()[1].score, 9);
        assert!(state.is_title_seen("x"));
    }

    #[test]
    fn test_replace_unseen_drops_documents_seen_meanwhile() {
        let mut state = FeedState::new();
        state.seed(docs(&["a", "b", "c", "d"]));
        state.mark_displayed();

        // Ranked against the tail [b, c, d] while only "a" was seen...
        let ranked = docs(&["d", "b", "new", "c"]);
        // ...but the user reached "c" before the result arrived
        state.move_cursor(Direction::Forward);
        state.move_cursor(Direction::Forward);

        state.replace_unseen(ranked);
        assert_eq!(titles(&state), vec!["a", "b", "c", "d", "new"]);
    }

    #[test]
    fn test_replace_unseen_on_undisplayed_feed_replaces_everything() {
        let mut state = FeedState::new();
        state.replace_unseen(docs(&["x", "y"]));
        assert_eq!(titles(&state), vec!["x", "y"]);
        assert_eq!(state.unseen_count(), 2);
    }
}
