//! Application state management

use portal_core::{ComplaintStore, Config, Result};
use portal_service::{ComplaintService, FilesystemStorage};
use std::path::PathBuf;
use std::sync::Arc;

/// Shared application state
#[derive(Debug, Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Config,
    /// Complaint operations
    pub service: ComplaintService,
    /// Directory holding attachment files
    pub upload_dir: PathBuf,
    storage: Arc<FilesystemStorage>,
}

impl AppState {
    /// Create application state over `store`, storing attachments under the configured upload root
    #[must_use]
    pub fn new(config: Config, store: Arc<dyn ComplaintStore>) -> Self {
        let upload_dir = config.storage.upload_root();
        let storage = Arc::new(FilesystemStorage::new(&upload_dir));
        let service = ComplaintService::new(store, storage.clone());

        Self {
            config,
            service,
            upload_dir,
            storage,
        }
    }

    /// Whether admin routes demand the `x-admin-key` header
    #[must_use]
    pub fn admin_key_required(&self) -> bool {
        self.config.api.admin_key.is_some()
    }

    /// Make sure the upload directory exists and is writable
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or written to.
    pub async fn validate(&self) -> Result<()> {
        self.storage.validate().await
    }
}

#[cfg(test)]
#[allow(clippy::missing_panics_doc, clippy::unwrap_used)]
mod tests {
    use super::*;
    use portal_database::MemoryStore;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn test_config(temp_dir: &TempDir) -> Config {
        let mut config = Config::default();
        config.storage.base_dir = temp_dir.path().to_path_buf();
        config
    }

    #[tokio::test]
    async fn test_state_uses_upload_root() {
        let temp_dir = TempDir::new().unwrap();
        let state = AppState::new(test_config(&temp_dir), Arc::new(MemoryStore::new()));

        assert_eq!(state.upload_dir, temp_dir.path().join("uploads"));
        assert!(!state.upload_dir.exists());

        state.validate().await.unwrap();
        assert!(state.upload_dir.is_dir());
    }

    #[test]
    fn test_admin_key_required_follows_config() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = test_config(&temp_dir);
        let open = AppState::new(config.clone(), Arc::new(MemoryStore::new()));
        assert!(!open.admin_key_required());

        config.api.admin_key = Some("secret".to_string());
        let locked = AppState::new(config, Arc::new(MemoryStore::new()));
        assert!(locked.admin_key_required());
    }
}
