//! TF-IDF vector space
//!
//! Tokens are runs of two or more word characters. Rows are raw term counts
//! weighted by smoothed IDF, `ln((1 + n) / (1 + df)) + 1`, then L2-normalized.
//! The vocabulary and IDF weights come from the fitted documents only; terms
//! unseen during fitting contribute nothing when transforming other text.

use crate::error::{FeedError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{BTreeMap, HashMap, HashSet};

static TOKEN_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b\w\w+\b").expect("Valid token pattern regex"));

/// Split text into vectorizer tokens
pub fn tokenize(text: &str) -> impl Iterator<Item = &str> + '_ {
    TOKEN_PATTERN.find_iter(text).map(|m| m.as_str())
}

/// Sparse row vector, entries sorted by term index
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SparseVector {
    entries: Vec<(usize, f64)>,
}

impl SparseVector {
    pub fn entries(&self) -> &[(usize, f64)] {
        &self.entries
    }

    pub fn is_zero(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn norm(&self) -> f64 {
        self.entries.iter().map(|(_, w)| w * w).sum::<f64>().sqrt()
    }

    /// Dot product by merging the two sorted index lists
    pub fn dot(&self, other: &SparseVector) -> f64 {
        let (mut i, mut j) = (0, 0);
        let mut sum = 0.0;
        while i < self.entries.len() && j < other.entries.len() {
            let (a_idx, a_w) = self.entries[i];
            let (b_idx, b_w) = other.entries[j];
            match a_idx.cmp(&b_idx) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    sum += a_w * b_w;
                    i += 1;
                    j += 1;
                }
            }
        }
        sum
    }
}

/// Cosine similarity between two sparse vectors; zero vectors score 0
pub fn cosine_similarity(a: &SparseVector, b: &SparseVector) -> f64 {
    let magnitude_a = a.norm();
    let magnitude_b = b.norm();

    if magnitude_a == 0.0 || magnitude_b == 0.0 {
        return 0.0;
    }

    a.dot(b) / (magnitude_a * magnitude_b)
}

/// Fitted vocabulary and IDF weights
#[derive(Debug, Clone)]
pub struct TfidfModel {
    vocabulary: HashMap<String, usize>,
    idf: Vec<f64>,
}

impl TfidfModel {
    /// Fit vocabulary and IDF weights on `documents`.
    ///
    /// Fails when no document yields a single token.
    pub fn fit<S: AsRef<str>>(documents: &[S]) -> Result<Self> {
        let mut doc_freq: BTreeMap<&str, usize> = BTreeMap::new();

        for doc in documents {
            let unique: HashSet<&str> = tokenize(doc.as_ref()).collect();
            for term in unique {
                *doc_freq.entry(term).or_insert(0) += 1;
            }
        }

        if doc_freq.is_empty() {
            return Err(FeedError::Vectorize(
                "empty vocabulary; documents contain no terms".to_string(),
            ));
        }

        let n = documents.len() as f64;
        let mut vocabulary = HashMap::with_capacity(doc_freq.len());
        let mut idf = Vec::with_capacity(doc_freq.len());

        // BTreeMap iteration gives a sorted, deterministic term order
        for (index, (term, df)) in doc_freq.into_iter().enumerate() {
            vocabulary.insert(term.to_string(), index);
            idf.push(((1.0 + n) / (1.0 + df as f64)).ln() + 1.0);
        }

        Ok(Self { vocabulary, idf })
    }

    pub fn vocabulary_len(&self) -> usize {
        self.idf.len()
    }

    /// IDF weight of a fitted term
    pub fn idf(&self, term: &str) -> Option<f64> {
        self.vocabulary.get(term).map(|&i| self.idf[i])
    }

    /// Project text into the fitted space (L2-normalized)
    pub fn transform(&self, text: &str) -> SparseVector {
        let mut counts: BTreeMap<usize, f64> = BTreeMap::new();
        for term in tokenize(text) {
            if let Some(&index) = self.vocabulary.get(term) {
                *counts.entry(index).or_insert(0.0) += 1.0;
            }
        }

        let mut entries: Vec<(usize, f64)> = counts
            .into_iter()
            .map(|(index, tf)| (index, tf * self.idf[index]))
            .collect();

        let norm = entries.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
        if norm > 0.0 {
            for (_, w) in entries.iter_mut() {
                *w /= norm;
            }
        }

        SparseVector { entries }
    }

    pub fn transform_all<S: AsRef<str>>(&self, texts: &[S]) -> Vec<SparseVector> {
        texts.iter().map(|t| self.transform(t.as_ref())).collect()
    }
}
