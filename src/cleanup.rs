// src/cleanup.rs

use std::{fs, path::Path};
use tracing::info;

use crate::error::{FeedError, Result};

/// Recursively delete the local feed directory.
pub fn remove_feed_dir(path: &Path) -> Result<()> {
    fs::remove_dir_all(path).map_err(|source| FeedError::Cleanup {
        path: path.to_path_buf(),
        source,
    })?;
    info!("removed {}", path.display());
    Ok(())
}
