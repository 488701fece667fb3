//! Resolve which accounts bought a product, and where to reach them, by joining
//! the account, address, agreement, offer, offer-product and product feeds.

pub mod cleanup;
pub mod config;
pub mod error;
pub mod feeds;
pub mod frame;
pub mod plan;
pub mod run;
pub mod sync;

pub use config::{FeedConfig, StorageProvider};
pub use error::{FeedError, Result};
pub use frame::Frame;
pub use run::{run, run_with_store, RunSummary};
