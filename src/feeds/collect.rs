// src/feeds/collect.rs

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::error::{FeedError, Result};

const CSV_MARKER: &str = ".csv";

/// Recursively list files under `root` whose name contains `.csv`.
/// Entries are visited in file-name order so the result is stable for a given tree.
pub fn collect_csv_files(root: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(|e| FeedError::FeedLoad {
            feed: root.display().to_string(),
            reason: e.to_string(),
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let is_csv = entry
            .file_name()
            .to_str()
            .map(|name| name.contains(CSV_MARKER))
            .unwrap_or(false);
        if is_csv {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}
