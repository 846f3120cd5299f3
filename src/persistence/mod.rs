//! Session-to-session persistence
//!
//! Two independent artifacts, read at startup and written at shutdown:
//! - **archive**: timestamp-named files of top-scoring abstracts, bounded in
//!   count by evicting the oldest file; their text forms the ranking corpus
//! - **preload**: one fixed-path file holding the unseen documents handed to
//!   the next session
//!
//! Both writers go through a temp file and a rename so an interrupted write
//! never leaves a truncated artifact behind.

pub mod archive;
pub mod preload;

pub use archive::AbstractArchive;
pub use preload::PreloadStore;

use crate::error::Result;
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Serialize `value` as JSON to `path` atomically, creating parent dirs
pub(crate) fn write_json_atomic<T: Serialize + ?Sized>(
    path: &Path,
    value: &T,
    pretty: bool,
) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let data = if pretty {
        serde_json::to_vec_pretty(value)?
    } else {
        serde_json::to_vec(value)?
    };

    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = Path::new(&tmp_name);

    fs::write(tmp_path, &data)?;
    fs::rename(tmp_path, path)?;
    Ok(())
}
