//! Runtime configuration.
//!
//! Stored as JSON. Every field has a default, so a missing file or a
//! partial file are both fine.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::state::pagination::{PAGE_SIZE, SCROLL_DEBOUNCE, SCROLL_GAP};

/// Default time allowed for the batch fetch and for each preview image
pub const REQUEST_FAILURE_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct CatalogConfig {
    /// Catalog JSON file. Asked for interactively when unset.
    pub data_path: Option<PathBuf>,
    /// Preference database; platform data directory when unset
    pub preferences_path: Option<PathBuf>,
    pub page_size: usize,
    /// Distance from the end of the list that triggers the next page
    pub scroll_gap: f32,
    pub scroll_debounce_ms: u64,
    pub image_timeout_ms: u64,
    pub fetch_timeout_ms: u64,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            data_path: None,
            preferences_path: None,
            page_size: PAGE_SIZE,
            scroll_gap: SCROLL_GAP,
            scroll_debounce_ms: SCROLL_DEBOUNCE.as_millis() as u64,
            image_timeout_ms: REQUEST_FAILURE_TIMEOUT.as_millis() as u64,
            fetch_timeout_ms: REQUEST_FAILURE_TIMEOUT.as_millis() as u64,
        }
    }
}

impl CatalogConfig {
    /// Default config file location, e.g. ~/.config/hotel-catalog/config.json
    pub fn default_path() -> Option<PathBuf> {
        let mut path = dirs::config_dir()?;
        path.push("hotel-catalog");
        path.push("config.json");
        Some(path)
    }

    /// Load `path`, or the default location when `None`. A missing file at
    /// the default location yields the defaults; an explicitly given file
    /// must exist.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let (path, explicit) = match path {
            Some(path) => (path.to_path_buf(), true),
            None => match Self::default_path() {
                Some(path) => (path, false),
                None => return Ok(Self::default()),
            },
        };

        if !explicit && !path.exists() {
            log::debug!("no config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let text = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        Self::from_json(&text).map_err(|err| match err {
            ConfigError::Parse { source, .. } => ConfigError::Parse { path, source },
            other => other,
        })
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: CatalogConfig =
            serde_json::from_str(json).map_err(|source| ConfigError::Parse {
                path: PathBuf::new(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.page_size == 0 {
            return Err(ConfigError::Invalid("page_size must be at least 1".into()));
        }
        if !self.scroll_gap.is_finite() || self.scroll_gap < 0.0 {
            return Err(ConfigError::Invalid("scroll_gap must be a non-negative number".into()));
        }
        Ok(())
    }

    pub fn scroll_debounce(&self) -> Duration {
        Duration::from_millis(self.scroll_debounce_ms)
    }

    pub fn image_timeout(&self) -> Duration {
        Duration::from_millis(self.image_timeout_ms)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CatalogConfig::default();
        assert_eq!(config.page_size, 9);
        assert_eq!(config.image_timeout(), Duration::from_secs(10));
        assert_eq!(config.scroll_debounce(), Duration::from_millis(100));
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config = CatalogConfig::from_json(r#"{ "page_size": 12, "data_path": "/tmp/h.json" }"#)
            .unwrap();
        assert_eq!(config.page_size, 12);
        assert_eq!(config.data_path, Some(PathBuf::from("/tmp/h.json")));
        assert_eq!(config.scroll_gap, 100.0);
    }

    #[test]
    fn test_zero_page_size_rejected() {
        assert!(matches!(
            CatalogConfig::from_json(r#"{ "page_size": 0 }"#),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let result = CatalogConfig::load(Some(Path::new("/no/such/config.json")));
        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }
}
