//! Local filesystem storage implementation.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::storage::{CatalogStore, ResourceKey};

/// Local filesystem storage backend.
#[derive(Debug, Clone)]
pub struct LocalStore {
    root: PathBuf,
    snapshot_file: String,
}

impl LocalStore {
    /// Create a store rooted at the given directory.
    pub fn new(root: impl Into<PathBuf>, snapshot_file: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            snapshot_file: snapshot_file.into(),
        }
    }

    fn snapshot_path(&self) -> PathBuf {
        self.root.join(&self.snapshot_file)
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let tmp = path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&tmp, path).await?;
        Ok(())
    }

    /// Read bytes, returning None if the file doesn't exist.
    async fn read_bytes(&self, path: &Path) -> Result<Option<Vec<u8>>> {
        match tokio::fs::read(path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }

    /// Modification time, returning None if the file doesn't exist.
    async fn modified(&self, path: &Path) -> Result<Option<DateTime<Utc>>> {
        match tokio::fs::metadata(path).await {
            Ok(meta) => Ok(Some(DateTime::<Utc>::from(meta.modified()?))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }
}

#[async_trait]
impl CatalogStore for LocalStore {
    fn resource_path(&self, key: &ResourceKey) -> PathBuf {
        self.root
            .join(&key.organization)
            .join(&key.dataset)
            .join(format!("{}.csv", key.resource))
    }

    async fn read_resource(&self, key: &ResourceKey) -> Result<Option<Vec<u8>>> {
        self.read_bytes(&self.resource_path(key)).await
    }

    async fn write_resource(&self, key: &ResourceKey, bytes: &[u8]) -> Result<()> {
        self.write_bytes(&self.resource_path(key), bytes).await
    }

    async fn resource_modified(&self, key: &ResourceKey) -> Result<Option<DateTime<Utc>>> {
        self.modified(&self.resource_path(key)).await
    }

    async fn read_snapshot(&self) -> Result<Option<Vec<u8>>> {
        self.read_bytes(&self.snapshot_path()).await
    }

    async fn write_snapshot(&self, bytes: &[u8]) -> Result<()> {
        self.write_bytes(&self.snapshot_path(), bytes).await
    }

    async fn snapshot_modified(&self) -> Result<Option<DateTime<Utc>>> {
        self.modified(&self.snapshot_path()).await
    }
}
