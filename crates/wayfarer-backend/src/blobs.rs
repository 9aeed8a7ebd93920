//! Blob storage collaborator: raw bytes under slash-separated logical paths.

use std::path::PathBuf;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::fs;
use tracing::{debug, info};

use crate::error::{BackendError, Result};

/// Blob storage collaborator.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store `data` under the logical `path`, overwriting any previous blob.
    async fn upload(&self, path: &str, data: Bytes) -> Result<()>;

    /// Public download URL for a previously uploaded path.
    async fn download_url(&self, path: &str) -> Result<String>;

    /// Remove the blob at `path`.
    async fn delete(&self, path: &str) -> Result<()>;
}

/// Filesystem-backed blob store used by the embedded backend.
///
/// Logical paths map 1:1 onto files below `base_path`; download URLs use the
/// `local://` scheme so callers can tell them apart from hosted URLs.
#[derive(Debug, Clone)]
pub struct LocalBlobStore {
    base_path: PathBuf,
    max_size: usize,
}

/// Validate a logical blob path: non-empty slash-separated segments, no
/// traversal, no platform separators.
fn validate_path(path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(BackendError::Blob("Empty blob path".to_string()));
    }
    for segment in path.split('/') {
        if segment.is_empty() || segment == "." || segment == ".." || segment.contains('\\') {
            return Err(BackendError::Blob(format!("Invalid blob path '{path}'")));
        }
    }
    Ok(())
}

impl LocalBlobStore {
    pub async fn new(base_path: PathBuf, max_size: usize) -> Result<Self> {
        fs::create_dir_all(&base_path).await.map_err(|e| {
            BackendError::Blob(format!(
                "Failed to create blob directory '{}': {}",
                base_path.display(),
                e
            ))
        })?;

        info!(path = %base_path.display(), "Blob store initialized");

        Ok(Self {
            base_path,
            max_size,
        })
    }

    fn file_for(&self, path: &str) -> Result<PathBuf> {
        validate_path(path)?;
        let mut resolved = self.base_path.clone();
        for segment in path.split('/') {
            resolved.push(segment);
        }
        Ok(resolved)
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn upload(&self, path: &str, data: Bytes) -> Result<()> {
        if data.is_empty() {
            return Err(BackendError::Blob("Empty blob".to_string()));
        }
        if data.len() > self.max_size {
            return Err(BackendError::BlobTooLarge {
                size: data.len(),
                max: self.max_size,
            });
        }

        let file = self.file_for(path)?;
        if let Some(parent) = file.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&file, &data).await.map_err(|e| {
            BackendError::Blob(format!("Failed to write blob '{path}': {e}"))
        })?;

        debug!(path, size = data.len(), "Stored blob");
        Ok(())
    }

    async fn download_url(&self, path: &str) -> Result<String> {
        let file = self.file_for(path)?;
        if !file.exists() {
            return Err(BackendError::NotFound);
        }
        Ok(format!("local://{path}"))
    }

    async fn delete(&self, path: &str) -> Result<()> {
        let file = self.file_for(path)?;
        if !file.exists() {
            return Err(BackendError::NotFound);
        }
        fs::remove_file(&file).await.map_err(|e| {
            BackendError::Blob(format!("Failed to delete blob '{path}': {e}"))
        })?;

        debug!(path, "Deleted blob");
        Ok(())
    }
}
