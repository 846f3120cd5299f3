//! Content-similarity ranking
//!
//! Candidates are ordered by how much they resemble the corpus of previously
//! liked abstracts:
//! - **tfidf**: term-frequency / inverse-document-frequency vector space,
//!   fitted on the corpus only
//! - **reranker**: mean cosine similarity of each candidate to every corpus
//!   document, stable descending sort, unranked fallback when the corpus or
//!   the candidates carry no usable text

pub mod reranker;
pub mod tfidf;

pub use reranker::{rank_by_similarity, Rankable, SimilarityReranker};
pub use tfidf::{cosine_similarity, SparseVector, TfidfModel};
