// src/sync/mod.rs

use futures::StreamExt;
use object_store::{
    aws::AmazonS3Builder, gcp::GoogleCloudStorageBuilder, path::Path as ObjectPath, ObjectMeta, ObjectStore,
};
use std::{
    path::{Path, PathBuf},
    sync::Arc,
};
use tokio::fs;
use tracing::{debug, error, info, instrument};

use crate::config::StorageProvider;
use crate::error::{FeedError, Result};

/// Outcome of mirroring one remote prefix.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub downloaded: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Connect to `bucket` on the configured provider. Credentials, region and
/// retry policy come from the environment and the builder defaults.
pub fn build_store(provider: StorageProvider, bucket: &str) -> Result<Arc<dyn ObjectStore>> {
    let store: Arc<dyn ObjectStore> = match provider {
        StorageProvider::S3 => Arc::new(
            AmazonS3Builder::from_env()
                .with_bucket_name(bucket)
                .build()?,
        ),
        StorageProvider::Gcs => Arc::new(
            GoogleCloudStorageBuilder::from_env()
                .with_bucket_name(bucket)
                .build()?,
        ),
    };
    Ok(store)
}

/// Where `key` lands under `local_root`, or `None` for directory markers.
///
/// The key is taken relative to `prefix`; a key equal to the prefix keeps its
/// final segment as the file name.
pub fn local_path_for(key: &str, prefix: &str, local_root: &Path) -> Option<PathBuf> {
    if key.is_empty() || key.ends_with('/') {
        return None;
    }
    let prefix = prefix.trim_matches('/');
    let relative = match key.strip_prefix(prefix) {
        Some(rest) if prefix.is_empty() || rest.is_empty() || rest.starts_with('/') => {
            rest.trim_start_matches('/')
        }
        _ => key,
    };
    let relative = if relative.is_empty() {
        key.rsplit('/').next().unwrap_or(key)
    } else {
        relative
    };
    Some(local_root.join(relative))
}

/// Mirror every object under `prefix` into `local_root`.
///
/// The listing stream follows continuation tokens, so all objects are seen no
/// matter how many pages the backend returns. A failed listing aborts at once;
/// failed downloads are logged, the rest still run, and the sync then fails.
#[instrument(level = "info", skip(store, local_root), fields(root = %local_root.display()))]
pub async fn sync_prefix(
    store: &dyn ObjectStore,
    bucket: &str,
    prefix: &str,
    local_root: &Path,
) -> Result<SyncReport> {
    let trimmed = prefix.trim_matches('/');
    let list_prefix = (!trimmed.is_empty()).then(|| ObjectPath::from(trimmed));

    let mut objects = Vec::new();
    let mut listing = store.list(list_prefix.as_ref());
    while let Some(meta) = listing.next().await {
        let meta = meta.map_err(|e| FeedError::RemoteSync(format!("listing {bucket}/{prefix}: {e}")))?;
        objects.push(meta);
    }
    drop(listing);
    info!(objects = objects.len(), "listed remote prefix");

    let mut report = SyncReport::default();
    for meta in &objects {
        let key = &meta.location;
        let dest = if is_directory_marker(meta, &objects) {
            None
        } else {
            local_path_for(key.as_ref(), prefix, local_root)
        };
        let Some(dest) = dest else {
            debug!(key = %key, "skipping directory marker");
            report.skipped += 1;
            continue;
        };
        match download_object(store, key, &dest).await {
            Ok(bytes) => {
                info!(bucket, key = %key, dest = %dest.display(), bytes, "downloaded");
                report.downloaded += 1;
            }
            Err(e) => {
                error!(bucket, key = %key, error = %e, "download failed");
                report.failed += 1;
            }
        }
    }

    if report.failed > 0 {
        return Err(FeedError::RemoteSync(format!(
            "{} of {} objects under {}/{} failed to download",
            report.failed,
            objects.len(),
            bucket,
            prefix
        )));
    }
    Ok(report)
}

/// A zero-byte object whose key is also the parent of another listed key.
///
/// Stores strip the trailing `/` from "folder" placeholder keys when listing, so
/// `exports/AccountFeed_V1/` arrives as `exports/AccountFeed_V1`.
fn is_directory_marker(meta: &ObjectMeta, listed: &[ObjectMeta]) -> bool {
    if meta.size != 0 {
        return false;
    }
    let dir = format!("{}/", meta.location);
    listed
        .iter()
        .any(|other| other.location.as_ref().starts_with(&dir))
}

async fn download_object(store: &dyn ObjectStore, key: &ObjectPath, dest: &Path) -> Result<usize> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).await?;
    }
    let bytes = store.get(key).await?.bytes().await?;
    fs::write(dest, &bytes).await?;
    Ok(bytes.len())
}
