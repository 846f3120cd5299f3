//! Archive of top-scoring abstracts
//!
//! Each save writes one `top_abstracts_<timestamp>.json` file holding up to
//! `max_archived_per_save` rows that cleared the score cutoff. The directory
//! keeps at most `max_archive_files` files: when it is full, the file with the
//! oldest modification time is removed before the new one is written.
//!
//! Every `*.json` file in the directory feeds the ranking corpus at startup.

use super::write_json_atomic;
use crate::config::{FeedConfig, PersistenceConfig};
use crate::error::Result;
use crate::types::{ArchivedAbstract, ScoredDocument};
use crate::utils::text::preprocess;
use chrono::Local;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, info, warn};

/// On-disk shape of an archive file; older files hold a single object
#[derive(Deserialize)]
#[serde(untagged)]
enum ArchiveFile {
    Rows(Vec<ArchivedAbstract>),
    Single(ArchivedAbstract),
}

impl ArchiveFile {
    fn into_rows(self) -> Vec<ArchivedAbstract> {
        match self {
            ArchiveFile::Rows(rows) => rows,
            ArchiveFile::Single(row) => vec![row],
        }
    }
}

/// Bounded directory of archived abstracts
#[derive(Debug, Clone)]
pub struct AbstractArchive {
    dir: PathBuf,
    cutoff_score: u32,
    max_per_save: usize,
    max_files: usize,
}

impl AbstractArchive {
    pub fn new(dir: impl Into<PathBuf>, config: &PersistenceConfig) -> Self {
        Self {
            dir: dir.into(),
            cutoff_score: config.archive_cutoff_score,
            max_per_save: config.max_archived_per_save,
            max_files: config.max_archive_files.max(1),
        }
    }

    pub fn from_config(config: &FeedConfig) -> Self {
        Self::new(config.archive_dir(), &config.persistence)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Preprocessed abstracts of every archived row.
    ///
    /// A missing directory yields an empty corpus; unreadable or malformed
    /// files are skipped with a warning.
    pub fn load_corpus(&self) -> Vec<String> {
        let mut files = match self.list_files() {
            Ok(files) => files,
            Err(e) => {
                warn!("Error listing archive {}: {}", self.dir.display(), e);
                return Vec::new();
            }
        };
        files.retain(|p| p.extension().is_some_and(|ext| ext == "json"));
        files.sort();

        let mut corpus = Vec::new();
        for path in files {
            match read_archive_file(&path) {
                Ok(rows) => {
                    debug!("Loaded {} archived abstracts from {}", rows.len(), path.display());
                    corpus.extend(rows.into_iter().map(|row| preprocess(&row.abstract_text)));
                }
                Err(e) => warn!("Error loading archive file {}: {}", path.display(), e),
            }
        }

        info!("Loaded corpus of {} archived abstracts", corpus.len());
        corpus
    }

    /// Rows that would be archived for `feed`: score at or above the cutoff,
    /// highest first (ties keep feed order), at most `max_per_save`.
    pub fn select_top(&self, feed: &[ScoredDocument]) -> Vec<ArchivedAbstract> {
        let mut top: Vec<ArchivedAbstract> = feed
            .iter()
            .filter(|doc| doc.score >= self.cutoff_score)
            .map(|doc| ArchivedAbstract {
                title: doc.title().to_string(),
                abstract_text: preprocess(doc.body_text()),
                score: doc.score,
                url: doc.url().to_string(),
            })
            .collect();

        top.sort_by(|a, b| b.score.cmp(&a.score));
        top.truncate(self.max_per_save);
        top
    }

    /// Archive the top documents of `feed`.
    ///
    /// Returns the written file, or `None` when nothing cleared the cutoff.
    pub fn save_top_abstracts(&self, feed: &[ScoredDocument]) -> Result<Option<PathBuf>> {
        let top = self.select_top(feed);
        if top.is_empty() {
            info!("No documents with a high enough score to archive");
            return Ok(None);
        }

        fs::create_dir_all(&self.dir)?;

        if self.list_files()?.len() >= self.max_files {
            if let Some(evicted) = self.evict_oldest()? {
                info!(
                    "Removed the oldest archive file {} to make room",
                    evicted.display()
                );
            }
        }

        let path = self.next_file_path();
        write_json_atomic(&path, &top, true)?;
        info!("Saved {} abstracts to {}", top.len(), path.display());
        Ok(Some(path))
    }

    /// Regular files currently in the archive directory
    pub fn list_files(&self) -> Result<Vec<PathBuf>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let mut files = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                files.push(entry.path());
            }
        }
        Ok(files)
    }

    /// Delete the file with the oldest modification time
    pub fn evict_oldest(&self) -> Result<Option<PathBuf>> {
        let oldest = self
            .list_files()?
            .into_iter()
            .filter_map(|path| modified_at(&path).map(|mtime| (mtime, path)))
            .min_by_key(|(mtime, _)| *mtime)
            .map(|(_, path)| path);

        match oldest {
            Some(path) => {
                fs::remove_file(&path)?;
                Ok(Some(path))
            }
            None => {
                debug!("No archive files to remove");
                Ok(None)
            }
        }
    }

    fn next_file_path(&self) -> PathBuf {
        let stamp = Local::now().format("%Y%m%d_%H%M%S").to_string();
        let mut path = self.dir.join(format!("top_abstracts_{}.json", stamp));
        let mut suffix = 1;
        while path.exists() {
            path = self
                .dir
                .join(format!("top_abstracts_{}_{}.json", stamp, suffix));
            suffix += 1;
        }
        path
    }
}

fn read_archive_file(path: &Path) -> Result<Vec<ArchivedAbstract>> {
    let contents = fs::read_to_string(path)?;
    let file: ArchiveFile = serde_json::from_str(&contents)?;
    Ok(file.into_rows())
}

fn modified_at(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|m| m.modified()).ok()
}
