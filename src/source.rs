//! Where the item batch comes from.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;

use crate::error::FetchError;
use crate::state::data::{parse_batch, Item};

pub type FetchFuture = Pin<Box<dyn Future<Output = Result<Vec<Item>, FetchError>> + Send + 'static>>;

/// One-shot provider of the whole item batch.
///
/// The caller bounds the fetch with its own timeout.
pub trait DataSource: Send + Sync {
    fn fetch(&self) -> FetchFuture;
}

/// Reads the batch from a JSON file
#[derive(Debug, Clone)]
pub struct FileDataSource {
    path: PathBuf,
}

impl FileDataSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory relative image URLs are resolved against
    pub fn base_dir(&self) -> PathBuf {
        self.path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default()
    }
}

impl DataSource for FileDataSource {
    fn fetch(&self) -> FetchFuture {
        let path = self.path.clone();
        Box::pin(async move {
            let bytes = tokio::fs::read(&path).await.map_err(|source| FetchError::Io {
                path: path.clone(),
                source: Arc::new(source),
            })?;
            let items = parse_batch(&bytes)?;
            log::info!("read {} items from {}", items.len(), path.display());
            Ok(items)
        })
    }
}
