//! Error types for the abstract feed engine
//!
//! This module provides structured error definitions using thiserror and
//! lets anyhow-based call sites convert into them.

use thiserror::Error;

/// Main error type for feed operations
#[derive(Error, Debug)]
pub enum FeedError {
    /// Configuration could not be loaded
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Configuration loaded but holds unusable values
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// HTTP request error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Source catalog returned something we could not use
    #[error("Fetch error: {0}")]
    Fetch(String),

    /// TF-IDF vector space could not be built
    #[error("Vectorization error: {0}")]
    Vectorize(String),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

/// Result type alias for feed operations
pub type Result<T> = std::result::Result<T, FeedError>;

/// Convert anyhow::Error to FeedError
impl From<anyhow::Error> for FeedError {
    fn from(err: anyhow::Error) -> Self {
        FeedError::Other(err.to_string())
    }
}
