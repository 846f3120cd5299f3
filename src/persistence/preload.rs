//! Preload queue for the next session
//!
//! A single JSON array of `{title, abstract, url, score, liked}` at a fixed
//! path, fully overwritten on every save. A file that is absent, unreadable,
//! malformed or empty means "no preload" and the feed starts with a fresh
//! fetch instead.

use super::write_json_atomic;
use crate::error::Result;
use crate::types::ScoredDocument;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct PreloadStore {
    path: PathBuf,
}

impl PreloadStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Documents saved by the previous session, if any
    pub fn load(&self) -> Option<Vec<ScoredDocument>> {
        if !self.path.exists() {
            return None;
        }

        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) => {
                warn!("Error reading preload file {}: {}", self.path.display(), e);
                return None;
            }
        };

        match serde_json::from_str::<Vec<ScoredDocument>>(&contents) {
            Ok(docs) if docs.is_empty() => None,
            Ok(docs) => {
                info!("Loaded {} preloaded documents", docs.len());
                Some(docs)
            }
            Err(e) => {
                warn!("Error loading preloaded documents: {}", e);
                None
            }
        }
    }

    /// Overwrite the preload file with `docs`
    pub fn save(&self, docs: &[ScoredDocument]) -> Result<()> {
        write_json_atomic(&self.path, docs, false)?;
        info!("Saved {} documents for next preload", docs.len());
        Ok(())
    }
}
