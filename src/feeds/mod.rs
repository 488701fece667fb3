// src/feeds/mod.rs

pub mod collect;
pub mod load;

use std::{collections::HashMap, path::Path};
use tracing::info;

use crate::error::Result;
use crate::frame::Frame;

pub use collect::collect_csv_files;
pub use load::load_table;

pub const ACCOUNT_FEED: &str = "AccountFeed_V1";
pub const ADDRESS_FEED: &str = "AddressFeed_V1";
pub const AGREEMENT_FEED: &str = "AgreementFeed";
pub const OFFER_FEED: &str = "OfferFeed_V1";
pub const OFFER_PRODUCT_FEED: &str = "OfferProductFeed_V1";
pub const PRODUCT_FEED: &str = "ProductFeed_V1";

/// Every feed the join plan reads, one sub-directory each under the feed root.
pub const FEED_TABLES: [&str; 6] = [
    ACCOUNT_FEED,
    ADDRESS_FEED,
    AGREEMENT_FEED,
    OFFER_FEED,
    OFFER_PRODUCT_FEED,
    PRODUCT_FEED,
];

/// Load all six feeds from `base/<table>/`, keyed by table name.
pub fn load_feeds(base: &Path) -> Result<HashMap<String, Frame>> {
    let mut tables = HashMap::with_capacity(FEED_TABLES.len());
    for table in FEED_TABLES {
        let frame = load_table(&base.join(table), None)?;
        info!(table, rows = frame.num_rows(), cols = frame.num_columns(), "loaded feed");
        tables.insert(table.to_string(), frame);
    }
    Ok(tables)
}
