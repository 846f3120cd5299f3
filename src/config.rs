//! Configuration for the abstract feed
//!
//! Every knob has a default matching the tuned behaviour of the feed, so an
//! empty configuration is valid. Values are layered: defaults, then an
//! optional TOML file, then `ABSTRACTFEED_*` environment variables using
//! `__` between sections (`ABSTRACTFEED_FEED__REFILL_BATCH_SIZE=15`).

use crate::error::{FeedError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Environment variable prefix for overrides
pub const ENV_PREFIX: &str = "ABSTRACTFEED";

/// Top-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    /// Directory holding the archive directory and the preload file
    pub data_dir: PathBuf,

    /// Engagement point values
    pub scoring: ScoringConfig,

    /// Refill and navigation tuning
    pub feed: FeedSettings,

    /// Archive and preload limits
    pub persistence: PersistenceConfig,

    /// Source catalog settings
    pub source: SourceConfig,
}

/// Points awarded for engagement signals
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Seconds of dwell worth one point
    pub view_point_interval_secs: u64,

    /// Cap on points from a single dwell interval
    pub max_view_points: u32,

    /// Bonus for an explicit like
    pub like_points: u32,

    /// Bonus for following the document's link
    pub click_points: u32,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            view_point_interval_secs: 5,
            max_view_points: 10,
            like_points: 10,
            click_points: 20,
        }
    }
}

/// Feed controller tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedSettings {
    /// Documents fetched for a cold start
    pub initial_batch_size: usize,

    /// Documents fetched per background refill
    pub refill_batch_size: usize,

    /// Refill when fewer unseen documents than this remain
    pub unseen_low_watermark: usize,

    /// Refill only when the current index is a multiple of this
    pub refill_granularity: usize,

    /// Upper bound on waiting for an in-flight refill at shutdown (seconds)
    #[serde(with = "serde_duration")]
    pub shutdown_drain_timeout: Duration,
}

impl Default for FeedSettings {
    fn default() -> Self {
        Self {
            initial_batch_size: 10,
            refill_batch_size: 10,
            unseen_low_watermark: 50,
            refill_granularity: 5,
            shutdown_drain_timeout: Duration::from_secs(30),
        }
    }
}

/// Archive and preload limits
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistenceConfig {
    /// Archive directory name under `data_dir`
    pub archive_dir_name: String,

    /// Preload file name under `data_dir`
    pub preload_file_name: String,

    /// Minimum score for a document to be archived
    pub archive_cutoff_score: u32,

    /// Rows kept per archive file
    pub max_archived_per_save: usize,

    /// Archive files kept before the oldest is evicted
    pub max_archive_files: usize,

    /// Unseen documents handed to the next session
    pub preload_size: usize,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            archive_dir_name: "saved_abstracts".to_string(),
            preload_file_name: "next_articles.json".to_string(),
            archive_cutoff_score: 15,
            max_archived_per_save: 10,
            max_archive_files: 8,
            preload_size: 20,
        }
    }
}

/// Source catalog settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Catalog origin
    pub base_url: String,

    /// Highest listing page sampled
    pub furthest_page: u32,

    /// Per-request timeout (seconds)
    #[serde(with = "serde_duration")]
    pub request_timeout: Duration,

    /// User agent sent with catalog requests
    pub user_agent: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.nature.com".to_string(),
            furthest_page: 1000,
            request_timeout: Duration::from_secs(10),
            user_agent: format!("abstractfeed/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

// Custom serde module for Duration (serialize/deserialize as seconds)
mod serde_duration {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

/// Default data directory using the platform's local data dir
pub fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("abstractfeed")
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            scoring: ScoringConfig::default(),
            feed: FeedSettings::default(),
            persistence: PersistenceConfig::default(),
            source: SourceConfig::default(),
        }
    }
}

impl FeedConfig {
    /// Load defaults, then the optional file, then environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            debug!("Loading configuration from {}", path.display());
            builder = builder.add_source(config::File::from(path).required(true));
        }

        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config: FeedConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML string (no environment layering)
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let config: FeedConfig = config::Config::builder()
            .add_source(config::File::from_str(toml_str, config::FileFormat::Toml))
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Replace the data directory (CLI override)
    pub fn with_data_dir(mut self, data_dir: impl Into<PathBuf>) -> Self {
        self.data_dir = data_dir.into();
        self
    }

    /// Directory holding archived top abstracts
    pub fn archive_dir(&self) -> PathBuf {
        self.data_dir.join(&self.persistence.archive_dir_name)
    }

    /// Fixed path of the preload queue
    pub fn preload_path(&self) -> PathBuf {
        self.data_dir.join(&self.persistence.preload_file_name)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.scoring.view_point_interval_secs == 0 {
            return Err(invalid("scoring.view_point_interval_secs must be positive"));
        }
        if self.feed.refill_granularity == 0 {
            return Err(invalid("feed.refill_granularity must be positive"));
        }
        if self.feed.initial_batch_size == 0 || self.feed.refill_batch_size == 0 {
            return Err(invalid("feed batch sizes must be positive"));
        }
        if self.persistence.max_archive_files == 0 {
            return Err(invalid("persistence.max_archive_files must be at least 1"));
        }
        if self.persistence.max_archived_per_save == 0 {
            return Err(invalid("persistence.max_archived_per_save must be at least 1"));
        }
        if self.persistence.preload_size == 0 {
            return Err(invalid("persistence.preload_size must be at least 1"));
        }
        if self.persistence.archive_dir_name.is_empty()
            || self.persistence.preload_file_name.is_empty()
        {
            return Err(invalid("persistence paths cannot be empty"));
        }
        if self.source.furthest_page == 0 {
            return Err(invalid("source.furthest_page must be at least 1"));
        }
        Ok(())
    }
}

fn invalid(msg: &str) -> FeedError {
    FeedError::InvalidConfig(msg.to_string())
}
