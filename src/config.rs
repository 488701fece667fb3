// src/config.rs

use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::error::{FeedError, Result};

/// Which object store backend holds the remote feeds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageProvider {
    #[default]
    S3,
    Gcs,
}

/// Options read from `config.yml`.
#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
    /// Mirror the remote prefix into `local_feed_path` before joining.
    pub download_data_feeds: bool,
    pub s3_bucket_name: String,
    pub s3_folder: String,
    /// Root holding one sub-directory per feed table.
    pub local_feed_path: PathBuf,
    /// Exact, case-sensitive product title to resolve.
    pub product_name: String,
    /// Remove `local_feed_path` once the output is written.
    pub cleanup_feeds: bool,

    #[serde(default)]
    pub storage_provider: StorageProvider,

    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

impl FeedConfig {
    /// Read and parse a YAML config file. Missing required keys fail here,
    /// before any feed or network I/O.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .map_err(|e| FeedError::Config(format!("reading {}: {}", path.display(), e)))?;
        Self::from_yaml_str(&text)
    }

    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let config: FeedConfig =
            serde_yaml::from_str(text).map_err(|e| FeedError::Config(e.to_string()))?;
        if config.product_name.trim().is_empty() {
            return Err(FeedError::Config("product_name must not be empty".into()));
        }
        Ok(config)
    }

    /// `user_info_<product>.csv`, spaces in the product name replaced by `_`.
    pub fn output_file_name(&self) -> String {
        format!("user_info_{}.csv", self.product_name.replace(' ', "_"))
    }

    pub fn output_path(&self) -> PathBuf {
        self.output_dir.join(self.output_file_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = r#"
download_data_feeds: false
s3_bucket_name: imi-subscribers
s3_folder: ""
local_feed_path: feeds
product_name: Integrated Methane Inversion
cleanup_feeds: true
"#;

    #[test]
    fn parses_required_keys_with_defaults() {
        let cfg = FeedConfig::from_yaml_str(FULL).unwrap();
        assert!(!cfg.download_data_feeds);
        assert_eq!(cfg.s3_bucket_name, "imi-subscribers");
        assert_eq!(cfg.s3_folder, "");
        assert_eq!(cfg.local_feed_path, PathBuf::from("feeds"));
        assert!(cfg.cleanup_feeds);
        assert_eq!(cfg.storage_provider, StorageProvider::S3);
        assert_eq!(cfg.output_dir, PathBuf::from("."));
    }

    #[test]
    fn output_name_replaces_spaces() {
        let cfg = FeedConfig::from_yaml_str(FULL).unwrap();
        assert_eq!(
            cfg.output_file_name(),
            "user_info_Integrated_Methane_Inversion.csv"
        );
    }

    #[test]
    fn missing_key_is_config_error() {
        let text = FULL.replace("cleanup_feeds: true\n", "");
        let err = FeedConfig::from_yaml_str(&text).unwrap_err();
        assert!(matches!(err, FeedError::Config(ref m) if m.contains("cleanup_feeds")));
    }

    #[test]
    fn malformed_value_is_config_error() {
        let text = FULL.replace("download_data_feeds: false", "download_data_feeds: maybe");
        assert!(matches!(
            FeedConfig::from_yaml_str(&text),
            Err(FeedError::Config(_))
        ));
    }

    #[test]
    fn optional_keys_override_defaults() {
        let text = format!("{FULL}storage_provider: gcs\noutput_dir: out\n");
        let cfg = FeedConfig::from_yaml_str(&text).unwrap();
        assert_eq!(cfg.storage_provider, StorageProvider::Gcs);
        assert_eq!(cfg.output_path(), PathBuf::from("out/user_info_Integrated_Methane_Inversion.csv"));
    }
}
