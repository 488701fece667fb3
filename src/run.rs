// src/run.rs

use arrow::{csv::WriterBuilder, record_batch::RecordBatch};
use object_store::ObjectStore;
use std::{
    fs::{self, File},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};
use tracing::{error, info, warn};

use crate::cleanup::remove_feed_dir;
use crate::config::FeedConfig;
use crate::error::{FeedError, Result};
use crate::plan::resolve_purchasers;
use crate::sync::{build_store, sync_prefix, SyncReport};

/// What a completed run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub output: PathBuf,
    pub rows: usize,
    pub sync: Option<SyncReport>,
    /// `false` when cleanup was requested but failed, or was not requested.
    pub cleaned: bool,
}

/// Sync (optional), join, write, clean up (optional), using the configured remote store.
pub async fn run(config: &FeedConfig) -> Result<RunSummary> {
    let store = if config.download_data_feeds {
        Some(build_store(config.storage_provider, &config.s3_bucket_name)?)
    } else {
        None
    };
    run_with_store(config, store.as_deref()).await
}

/// Same as [`run`] but against a caller-supplied store.
pub async fn run_with_store(
    config: &FeedConfig,
    store: Option<&dyn ObjectStore>,
) -> Result<RunSummary> {
    let sync = if config.download_data_feeds {
        let store = store.ok_or_else(|| {
            FeedError::RemoteSync("download_data_feeds is set but no store is available".into())
        })?;
        info!(
            bucket = %config.s3_bucket_name,
            prefix = %config.s3_folder,
            "syncing remote feeds"
        );
        Some(
            sync_prefix(
                store,
                &config.s3_bucket_name,
                &config.s3_folder,
                &config.local_feed_path,
            )
            .await?,
        )
    } else {
        None
    };

    let result = resolve_purchasers(&config.local_feed_path, &config.product_name)?;
    if result.num_rows() == 0 {
        warn!(product = %config.product_name, "no purchasers found");
    }

    let output = config.output_path();
    write_csv(result.batch(), &output)?;
    info!(path = %output.display(), rows = result.num_rows(), "wrote output");

    let cleaned = config.cleanup_feeds && cleanup_best_effort(&config.local_feed_path);

    Ok(RunSummary {
        output,
        rows: result.num_rows(),
        sync,
        cleaned,
    })
}

/// Remove the feed directory, reporting but never propagating a failure.
pub fn cleanup_best_effort(path: &Path) -> bool {
    match remove_feed_dir(path) {
        Ok(()) => true,
        Err(e) => {
            error!(path = %path.display(), error = %e, "cleanup failed, continuing");
            false
        }
    }
}

/// Write `batch` as CSV with a header row, creating the parent directory if needed.
pub fn write_csv(batch: &RecordBatch, path: &Path) -> Result<()> {
    let to_err = |reason: String| FeedError::OutputWrite {
        path: path.to_path_buf(),
        reason,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| to_err(e.to_string()))?;
    }
    let file = File::create(path).map_err(|e| to_err(e.to_string()))?;
    let mut writer = WriterBuilder::new()
        .with_header(true)
        .build(BufWriter::new(file));
    writer.write(batch).map_err(|e| to_err(e.to_string()))?;
    writer
        .into_inner()
        .flush()
        .map_err(|e| to_err(e.to_string()))?;
    Ok(())
}
