//! Core data types for the abstract feed
//!
//! This module defines the values that flow between the source catalog, the
//! scoring engine, the reranker and the persistence layer. A single
//! `ScoredDocument` type is used everywhere a document carries engagement
//! state, including the preload file.

use serde::{Deserialize, Serialize};

/// Body text used when the catalog page carries no abstract
pub const ABSTRACT_NOT_AVAILABLE: &str = "Abstract not available.";

/// A candidate piece of content fetched from the source catalog
///
/// `title` is the identity key within a session. The body text is stored on
/// disk under the `abstract` field name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Article title, unique within a session
    pub title: String,

    /// Abstract text
    #[serde(rename = "abstract")]
    pub body_text: String,

    /// Permalink to the full article
    pub url: String,
}

impl Document {
    pub fn new(
        title: impl Into<String>,
        body_text: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            body_text: body_text.into(),
            url: url.into(),
        }
    }
}

/// A document plus the engagement state accumulated during a session
///
/// Serializes flat as `{title, abstract, url, score, liked}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoredDocument {
    #[serde(flatten)]
    pub document: Document,

    /// Engagement score, only ever increases
    #[serde(default)]
    pub score: u32,

    /// One-way latch set by an explicit like
    #[serde(default)]
    pub liked: bool,
}

impl ScoredDocument {
    /// Wrap a freshly fetched document with zero score
    pub fn new(document: Document) -> Self {
        Self {
            document,
            score: 0,
            liked: false,
        }
    }

    pub fn title(&self) -> &str {
        &self.document.title
    }

    pub fn body_text(&self) -> &str {
        &self.document.body_text
    }

    pub fn url(&self) -> &str {
        &self.document.url
    }
}

impl From<Document> for ScoredDocument {
    fn from(document: Document) -> Self {
        Self::new(document)
    }
}

/// One row of an archive file
///
/// `abstract` holds preprocessed text (lowercased, punctuation stripped).
/// Every field except the abstract is optional so that older single-object
/// archive files still load into the corpus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchivedAbstract {
    #[serde(default)]
    pub title: String,

    #[serde(rename = "abstract")]
    pub abstract_text: String,

    #[serde(default)]
    pub score: u32,

    #[serde(default)]
    pub url: String,
}

/// Navigation direction reported by the presentation layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

/// What the presentation layer needs to render the current document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentView {
    pub title: String,
    pub body_text: String,
    pub url: String,

    /// Whether the like affordance should be disabled
    pub liked: bool,

    /// Position of the document within the feed
    pub index: usize,

    /// Feed length at render time
    pub feed_len: usize,
}

impl CurrentView {
    pub fn from_scored(doc: &ScoredDocument, index: usize, feed_len: usize) -> Self {
        Self {
            title: doc.document.title.clone(),
            body_text: doc.document.body_text.clone(),
            url: doc.document.url.clone(),
            liked: doc.liked,
            index,
            feed_len,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scored_document_serializes_flat() {
        let doc = ScoredDocument {
            document: Document::new("Coral reefs", "Reefs are dying.", "https://example.org/a"),
            score: 25,
            liked: true,
        };

        let value = serde_json::to_value(&doc).unwrap();
        assert_eq!(value["title"], "Coral reefs");
        assert_eq!(value["abstract"], "Reefs are dying.");
        assert_eq!(value["url"], "https://example.org/a");
        assert_eq!(value["score"], 25);
        assert_eq!(value["liked"], true);
        assert!(value.get("body_text").is_none());
        assert!(value.get("document").is_none());
    }

    #[test]
    fn test_scored_document_defaults_engagement() {
        let json = r#"{"title": "t", "abstract": "a", "url": "u"}"#;
        let doc: ScoredDocument = serde_json::from_str(json).unwrap();
        assert_eq!(doc.score, 0);
        assert!(!doc.liked);
    }

    #[test]
    fn test_archived_abstract_accepts_legacy_object() {
        let json = r#"{"abstract": "old style entry"}"#;
        let row: ArchivedAbstract = serde_json::from_str(json).unwrap();
        assert_eq!(row.abstract_text, "old style entry");
        assert!(row.title.is_empty());
    }
}
