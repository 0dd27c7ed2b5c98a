use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;

use crate::error::Error;

/// Persists the identifier of the last clip that was announced.
#[async_trait]
pub trait MarkerStore: Send + Sync {
    async fn read(&self) -> Result<Option<String>, Error>;
    async fn write(&self, id: &str) -> Result<(), Error>;
}

/// Marker kept as the sole contents of a text file.
#[derive(Debug, Clone)]
pub struct FileMarkerStore {
    path: PathBuf,
}

impl FileMarkerStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl MarkerStore for FileMarkerStore {
    async fn read(&self) -> Result<Option<String>, Error> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => {
                let id = contents.trim();
                Ok((!id.is_empty()).then(|| id.to_string()))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn write(&self, id: &str) -> Result<(), Error> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&self.path, id).await?;
        Ok(())
    }
}
