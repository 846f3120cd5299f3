//! Similarity reranker
//!
//! Orders candidates by mean cosine similarity to the corpus of liked
//! abstracts. The corpus is fixed for the lifetime of a reranker, so the
//! vector space and the corpus rows are computed once at construction.
//!
//! Degraded mode: when the corpus is empty or blank, when no candidate has
//! text, or when the vector space cannot be built, candidates come back in
//! their original order. Ranking never fails the feed.

use super::tfidf::{cosine_similarity, SparseVector, TfidfModel};
use crate::types::{Document, ScoredDocument};
use crate::utils::text::{is_blank, preprocess};
use std::cmp::Ordering;
use tracing::{debug, warn};

/// Anything the reranker can order
pub trait Rankable {
    /// Raw (unpreprocessed) text used for similarity
    fn rank_text(&self) -> &str;
}

impl Rankable for Document {
    fn rank_text(&self) -> &str {
        &self.body_text
    }
}

impl Rankable for ScoredDocument {
    fn rank_text(&self) -> &str {
        &self.document.body_text
    }
}

/// Vector space fitted on the corpus plus the corpus rows
#[derive(Debug)]
struct CorpusSpace {
    model: TfidfModel,
    rows: Vec<SparseVector>,
}

/// Reranker bound to a read-only corpus
#[derive(Debug)]
pub struct SimilarityReranker {
    corpus_len: usize,
    space: Option<CorpusSpace>,
}

impl SimilarityReranker {
    /// Build a reranker over `corpus_texts`; texts are preprocessed here.
    pub fn new(corpus_texts: Vec<String>) -> Self {
        let corpus: Vec<String> = corpus_texts.iter().map(|t| preprocess(t)).collect();
        let corpus_len = corpus.len();

        if corpus.iter().all(|t| is_blank(t)) {
            warn!("No valid abstracts in the saved corpus; similarity ranking disabled");
            return Self {
                corpus_len,
                space: None,
            };
        }

        let space = match TfidfModel::fit(&corpus) {
            Ok(model) => {
                let rows = model.transform_all(&corpus);
                debug!(
                    "Fitted TF-IDF on {} corpus documents ({} terms)",
                    corpus_len,
                    model.vocabulary_len()
                );
                Some(CorpusSpace { model, rows })
            }
            Err(e) => {
                warn!("Error computing TF-IDF for corpus: {}", e);
                None
            }
        };

        Self { corpus_len, space }
    }

    /// Reranker with no corpus; always returns candidates unchanged
    pub fn empty() -> Self {
        Self {
            corpus_len: 0,
            space: None,
        }
    }

    pub fn corpus_len(&self) -> usize {
        self.corpus_len
    }

    /// Whether reranking will reorder anything
    pub fn is_active(&self) -> bool {
        self.space.is_some()
    }

    /// Mean cosine similarity of each candidate to the corpus, or `None` in
    /// degraded mode.
    pub fn similarity_scores<T: Rankable>(&self, candidates: &[T]) -> Option<Vec<f64>> {
        let space = self.space.as_ref()?;

        let texts: Vec<String> = candidates.iter().map(|c| preprocess(c.rank_text())).collect();
        if texts.iter().all(|t| is_blank(t)) {
            warn!("No valid candidate abstracts for ranking; keeping original order");
            return None;
        }

        let denominator = space.rows.len() as f64;
        let scores = texts
            .iter()
            .map(|text| {
                let v = space.model.transform(text);
                let total: f64 = space.rows.iter().map(|row| cosine_similarity(&v, row)).sum();
                total / denominator
            })
            .collect();

        Some(scores)
    }

    /// Stable sort of `candidates` by descending similarity
    pub fn rerank<T: Rankable>(&self, candidates: Vec<T>) -> Vec<T> {
        let Some(scores) = self.similarity_scores(&candidates) else {
            return candidates;
        };

        let mut scored: Vec<(f64, T)> = scores.into_iter().zip(candidates).collect();
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));

        debug!("Reranked {} candidates against the corpus", scored.len());
        scored.into_iter().map(|(_, c)| c).collect()
    }
}

/// One-shot rerank of `candidates` against `corpus_texts`
pub fn rank_by_similarity<T: Rankable>(candidates: Vec<T>, corpus_texts: &[String]) -> Vec<T> {
    SimilarityReranker::new(corpus_texts.to_vec()).rerank(candidates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    fn doc(title: &str, body: &str) -> Document {
        Document::new(title, body, format!("https://example.org/{}", title))
    }

    fn titles(docs: &[Document]) -> Vec<&str> {
        docs.iter().map(|d| d.title.as_str()).collect()
    }

    #[test]
    fn test_blank_corpus_keeps_order() {
        let candidates = vec![
            doc("c", "neutron stars merge"),
            doc("a", "protein folding"),
            doc("b", "coral reef bleaching"),
        ];

        let ranked = rank_by_similarity(candidates.clone(), &["".to_string()]);
        assert_eq!(ranked, candidates);

        let ranked = rank_by_similarity(candidates.clone(), &[]);
        assert_eq!(ranked, candidates);

        let ranked = rank_by_similarity(candidates.clone(), &["!!! ...".to_string()]);
        assert_eq!(ranked, candidates);
    }

    #[test]
    fn test_blank_candidates_keep_order() {
        let reranker = SimilarityReranker::new(vec!["protein folding dynamics".to_string()]);
        let candidates = vec![doc("x", ""), doc("y", "  ?! "), doc("z", "\n")];

        assert_eq!(reranker.rerank(candidates.clone()), candidates);
    }

    #[test]
    fn test_degenerate_vocabulary_keeps_order() {
        // Only single-character tokens: nothing for the vectorizer to keep
        let reranker = SimilarityReranker::new(vec!["a b c".to_string()]);
        assert!(!reranker.is_active());

        let candidates = vec![doc("1", "protein"), doc("2", "a b c")];
        assert_eq!(reranker.rerank(candidates.clone()), candidates);
    }

    #[test]
    fn test_similar_candidate_ranks_first() {
        let corpus = vec![
            "Protein folding is driven by hydrophobic collapse.".to_string(),
            "Misfolded protein aggregates in neurons.".to_string(),
        ];
        let candidates = vec![
            doc("volcano", "Volcanic eruptions cool the climate."),
            doc("galaxy", "Galaxy clusters bend light."),
            doc("protein", "Protein folding intermediates observed in neurons."),
        ];

        let ranked = rank_by_similarity(candidates, &corpus);
        assert_eq!(ranked[0].title, "protein");
    }

    #[test]
    fn test_ties_keep_original_order() {
        let corpus = vec!["quantum entanglement".to_string()];
        let candidates = vec![
            doc("first", "unrelated geology"),
            doc("match", "quantum entanglement"),
            doc("second", "unrelated botany"),
            doc("third", "marine biology"),
        ];

        let ranked = rank_by_similarity(candidates, &corpus);
        assert_eq!(titles(&ranked), vec!["match", "first", "second", "third"]);
    }

    #[test]
    fn test_mean_rewards_broad_resemblance() {
        let corpus = vec![
            "graphene conductivity".to_string(),
            "graphene superconductivity twisted bilayer".to_string(),
            "bilayer graphene magic angle".to_string(),
        ];
        let candidates = vec![
            // Near-exact copy of a single corpus entry
            doc("narrow", "magic angle"),
            // Shares the term present across the whole corpus
            doc("broad", "graphene graphene bilayer"),
        ];

        let reranker = SimilarityReranker::new(corpus);
        let scores = reranker.similarity_scores(&candidates).unwrap();
        assert!(scores[1] > scores[0]);
    }

    #[test]
    fn test_scored_documents_are_rankable() {
        let corpus = vec!["deep sea vents".to_string()];
        let candidates = vec![
            ScoredDocument::new(doc("other", "alpine glaciers")),
            ScoredDocument::new(doc("vents", "hydrothermal vents in the deep sea")),
        ];

        let ranked = rank_by_similarity(candidates, &corpus);
        assert_eq!(ranked[0].title(), "vents");
    }

    proptest! {
        #[test]
        fn prop_rerank_is_a_permutation(
            bodies in proptest::collection::vec("[a-e ]{0,20}", 0..20),
            corpus in proptest::collection::vec("[a-e ]{0,20}", 0..5),
        ) {
            let candidates: Vec<Document> = bodies
                .iter()
                .enumerate()
                .map(|(i, body)| doc(&format!("doc-{}", i), body))
                .collect();

            let ranked = rank_by_similarity(candidates.clone(), &corpus);

            prop_assert_eq!(ranked.len(), candidates.len());
            let before: HashSet<&str> = titles(&candidates).into_iter().collect();
            let after: HashSet<&str> = titles(&ranked).into_iter().collect();
            prop_assert_eq!(before, after);
        }
    }
}
