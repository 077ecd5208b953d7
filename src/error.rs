//! Error taxonomy for the catalog.
//!
//! Only the batch fetch, the preference store and the config loader can fail
//! in a way that callers need to see. Image failures are a per-item visual
//! state (see `view::preview`) and unknown filter ids fall back to the default
//! ordering, so neither has an error type.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

/// The upstream batch never arrived.
///
/// Cloneable because it travels inside [`crate::runtime::Event`].
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    #[error("failed to read catalog {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: Arc<std::io::Error>,
    },

    #[error("catalog is not valid JSON: {0}")]
    Malformed(#[source] Arc<serde_json::Error>),

    #[error("item {id} is invalid: {reason}")]
    InvalidItem { id: u64, reason: String },

    #[error("catalog did not arrive within {0:?}")]
    Timeout(Duration),
}

impl FetchError {
    /// Whether this is the timeout flavour rather than a hard failure.
    pub fn is_timeout(&self) -> bool {
        matches!(self, FetchError::Timeout(_))
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(err: serde_json::Error) -> Self {
        FetchError::Malformed(Arc::new(err))
    }
}

/// Failures of the persisted key-value store.
#[derive(Debug, Error)]
pub enum PreferenceError {
    #[error("preference database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("failed to create preference directory {path}: {source}")]
    Directory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Failures while loading [`crate::config::CatalogConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("config {path} is not valid JSON: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid config value: {0}")]
    Invalid(String),
}
