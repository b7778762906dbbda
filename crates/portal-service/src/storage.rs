//! Attachment file storage

use async_trait::async_trait;
use portal_core::{Error, Result};
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

/// Where attachment bytes are kept
#[async_trait]
pub trait AttachmentStorage: Send + Sync + std::fmt::Debug {
    /// Write `data` at `relative` under the storage root, returning the full path
    ///
    /// # Errors
    ///
    /// Returns an error if the path escapes the root or the write fails.
    async fn write(&self, relative: &Path, data: &[u8]) -> Result<PathBuf>;

    /// Remove a file previously returned by [`AttachmentStorage::write`]
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be removed.
    async fn delete(&self, path: &Path) -> Result<()>;
}

/// Stores attachments on the local filesystem
///
/// Layout: `{root}/{complaint_id}/{token}_{name}`.
#[derive(Debug, Clone)]
pub struct FilesystemStorage {
    root: PathBuf,
}

impl FilesystemStorage {
    /// Create a storage rooted at `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Storage root directory
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the root and verify it is writable
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or written to.
    pub async fn validate(&self) -> Result<()> {
        fs::create_dir_all(&self.root).await?;

        let test_file = self.root.join(".write_test");
        fs::write(&test_file, b"test").await?;
        fs::remove_file(&test_file).await?;

        Ok(())
    }

    fn resolve(&self, relative: &Path) -> Result<PathBuf> {
        let plain = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
        if !plain || relative.as_os_str().is_empty() {
            return Err(Error::Storage(format!(
                "refusing to write outside storage root: {}",
                relative.display()
            )));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl AttachmentStorage for FilesystemStorage {
    async fn write(&self, relative: &Path, data: &[u8]) -> Result<PathBuf> {
        let full_path = self.resolve(relative)?;
        debug!(path = %full_path.display(), size = data.len(), "writing attachment");

        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                warn!(parent = %parent.display(), error = %e, "create_dir_all failed");
                e
            })?;
        }

        // Readers never observe a partially written attachment
        let mut temp_name = full_path.as_os_str().to_owned();
        temp_name.push(".part");
        let temp_path = PathBuf::from(temp_name);

        let mut file = fs::File::create(&temp_path).await?;
        if let Err(e) = file.write_all(data).await {
            drop(file);
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }
        file.sync_all().await?;
        drop(file);

        if let Err(e) = fs::rename(&temp_path, &full_path).await {
            warn!(from = %temp_path.display(), to = %full_path.display(), error = %e, "rename failed");
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        Ok(full_path)
    }

    async fn delete(&self, path: &Path) -> Result<()> {
        fs::remove_file(path).await?;
        Ok(())
    }
}
