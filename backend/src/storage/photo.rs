//! Blob-store boundary for chore proof photos.
//!
//! Uploads return an opaque reference the chore record carries around;
//! deletion is best-effort and callers must treat a failed delete as
//! non-fatal.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::path::PathBuf;
use uuid::Uuid;

#[async_trait]
pub trait PhotoStore: Send + Sync {
    /// Store a photo and return an opaque reference to it.
    async fn store_photo(&self, chore_id: &str, data: &[u8]) -> Result<String>;

    /// Delete a previously stored photo by reference.
    async fn delete_photo(&self, reference: &str) -> Result<()>;
}

/// Photo store backed by a local directory. References are paths
/// relative to the root.
#[derive(Clone)]
pub struct LocalPhotoStore {
    root: PathBuf,
}

impl LocalPhotoStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }
}

#[async_trait]
impl PhotoStore for LocalPhotoStore {
    async fn store_photo(&self, chore_id: &str, data: &[u8]) -> Result<String> {
        let reference = format!("{}/{}.jpg", chore_id, Uuid::new_v4());
        let path = self.root.join(&reference);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, data).await?;
        Ok(reference)
    }

    async fn delete_photo(&self, reference: &str) -> Result<()> {
        tokio::fs::remove_file(self.root.join(reference)).await?;
        Ok(())
    }
}

/// Placeholder used when no photo storage is configured. Uploads are
/// refused; deletes succeed so stale references never block anything.
#[derive(Clone, Default)]
pub struct NoopPhotoStore;

#[async_trait]
impl PhotoStore for NoopPhotoStore {
    async fn store_photo(&self, _chore_id: &str, _data: &[u8]) -> Result<String> {
        Err(anyhow!("photo storage is not configured"))
    }

    async fn delete_photo(&self, _reference: &str) -> Result<()> {
        Ok(())
    }
}
