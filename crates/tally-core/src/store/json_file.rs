//! Local JSON snapshot fetcher
//!
//! Reads a collection exported from the backend as a single JSON document,
//! e.g. `transactions.json` holding an array of transactions.

use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::debug;

use super::Fetcher;
use crate::error::{Error, Result};

pub struct JsonFileFetcher<T> {
    path: PathBuf,
    name: String,
    _marker: PhantomData<fn() -> T>,
}

impl<T> JsonFileFetcher<T> {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = format!("file:{}", path.display());
        Self {
            path,
            name,
            _marker: PhantomData,
        }
    }

    /// Snapshot file `<dir>/<collection>.json`
    pub fn in_dir(dir: &Path, collection: &str) -> Self {
        Self::new(dir.join(format!("{}.json", collection)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl<T> Fetcher<T> for JsonFileFetcher<T>
where
    T: DeserializeOwned + Send + 'static,
{
    async fn fetch(&self) -> Result<T> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::NotFound(format!(
                    "snapshot {}",
                    self.path.display()
                )));
            }
            Err(e) => return Err(e.into()),
        };

        debug!(path = %self.path.display(), bytes = bytes.len(), "Read snapshot");
        Ok(serde_json::from_slice(&bytes)?)
    }

    fn name(&self) -> &str {
        &self.name
    }
}
