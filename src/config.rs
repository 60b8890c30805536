use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use crate::constants::*;
use crate::error::{EtlError, Result};

/// Everything a run needs to know about where data lives and how long to wait
/// for it. Built once in `main` and handed to each component.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct EtlConfig {
    pub base_listing_url: String,
    pub registry_url: String,
    pub raw_dir: PathBuf,
    pub processed_dir: PathBuf,
    pub log_dir: PathBuf,
    pub listing_timeout_secs: u64,
    pub download_timeout_secs: u64,
    pub max_quarters: usize,
    pub max_retries: u32,
    pub retry_backoff_ms: u64,
    pub aggregated_archive_name: String,
}

impl Default for EtlConfig {
    fn default() -> Self {
        Self {
            base_listing_url: DEFAULT_BASE_LISTING_URL.to_string(),
            registry_url: DEFAULT_REGISTRY_URL.to_string(),
            raw_dir: PathBuf::from(DEFAULT_RAW_DIR),
            processed_dir: PathBuf::from(DEFAULT_PROCESSED_DIR),
            log_dir: PathBuf::from(DEFAULT_LOG_DIR),
            listing_timeout_secs: DEFAULT_LISTING_TIMEOUT_SECS,
            download_timeout_secs: DEFAULT_DOWNLOAD_TIMEOUT_SECS,
            max_quarters: DEFAULT_MAX_QUARTERS,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_backoff_ms: DEFAULT_RETRY_BACKOFF_MS,
            aggregated_archive_name: DEFAULT_AGGREGATED_ARCHIVE_NAME.to_string(),
        }
    }
}

impl EtlConfig {
    /// Load from an optional TOML file, then apply `ANS_*` environment
    /// overrides. A path that does not exist yields the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(p) if p.exists() => Self::from_file(p)?,
            Some(p) => {
                debug!(path = %p.display(), "config file not found, using defaults");
                Self::default()
            }
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            EtlError::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        let config: EtlConfig = toml::from_str(&content)?;
        Ok(config)
    }

    fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("ANS_BASE_URL") {
            self.base_listing_url = v;
        }
        if let Some(v) = lookup("ANS_REGISTRY_URL") {
            self.registry_url = v;
        }
        if let Some(v) = lookup("ANS_RAW_DIR") {
            self.raw_dir = PathBuf::from(v);
        }
        if let Some(v) = lookup("ANS_PROCESSED_DIR") {
            self.processed_dir = PathBuf::from(v);
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.listing_timeout_secs == 0 || self.download_timeout_secs == 0 {
            return Err(EtlError::Config("timeouts must be greater than zero".into()));
        }
        if self.max_quarters == 0 {
            return Err(EtlError::Config("max_quarters must be at least 1".into()));
        }
        if self.aggregated_archive_name.trim().is_empty() {
            return Err(EtlError::Config("aggregated_archive_name is empty".into()));
        }
        Ok(())
    }

    pub fn listing_timeout(&self) -> Duration {
        Duration::from_secs(self.listing_timeout_secs)
    }

    pub fn download_timeout(&self) -> Duration {
        Duration::from_secs(self.download_timeout_secs)
    }

    pub fn registry_path(&self) -> PathBuf {
        self.raw_dir.join(REGISTRY_FILE_NAME)
    }

    pub fn archive_download_dir(&self) -> PathBuf {
        self.raw_dir.join(ARCHIVE_DOWNLOAD_SUBDIR)
    }
}
