// src/error.rs

use arrow::error::ArrowError;
use std::path::PathBuf;
use thiserror::Error;

/// Failure kinds surfaced by the feed join run.
///
/// Everything except [`FeedError::Cleanup`] aborts the run; cleanup failures are
/// reported by the orchestrator and then dropped.
#[derive(Error, Debug)]
pub enum FeedError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("failed to load feed {feed}: {reason}")]
    FeedLoad { feed: String, reason: String },

    #[error("column `{column}` not found in `{relation}`")]
    MissingColumn { relation: String, column: String },

    #[error("relation `{0}` has not been produced by any earlier step")]
    UnknownRelation(String),

    #[error("`{relation}` has {rows} rows, more than a join can index")]
    TooManyRows { relation: String, rows: usize },

    #[error("arrow error: {0}")]
    Arrow(#[from] ArrowError),

    #[error("remote sync failed: {0}")]
    RemoteSync(String),

    #[error("failed to remove {path:?}: {source}")]
    Cleanup {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write output {path:?}: {reason}")]
    OutputWrite { path: PathBuf, reason: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<object_store::Error> for FeedError {
    fn from(err: object_store::Error) -> Self {
        FeedError::RemoteSync(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, FeedError>;
