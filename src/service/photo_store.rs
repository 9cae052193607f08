//! Photo Storage
//!
//! Persists uploaded restaurant photos.

use std::path::PathBuf;

use async_trait::async_trait;
use log::{error, info};

use crate::utils::error::{AppError, AppResult};

/// Storage seam for uploaded files
#[async_trait]
pub trait PhotoStore: Send + Sync {
    /// Write `bytes` under `file_name`, replacing any previous file
    async fn save(&self, file_name: &str, bytes: &[u8]) -> AppResult<()>;
}

/// Stores photos in a directory on the local filesystem
pub struct LocalPhotoStore {
    root: PathBuf,
}

impl LocalPhotoStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl PhotoStore for LocalPhotoStore {
    async fn save(&self, file_name: &str, bytes: &[u8]) -> AppResult<()> {
        let path = self.root.join(file_name);

        let result = async {
            tokio::fs::create_dir_all(&self.root).await?;
            tokio::fs::write(&path, bytes).await
        }
        .await;

        match result {
            Ok(()) => {
                info!("Stored photo {}", path.display());
                Ok(())
            }
            Err(e) => {
                error!("Failed to store photo {}: {}", path.display(), e);
                Err(AppError::UpstreamFailure(
                    "Problem with file upload".to_string(),
                ))
            }
        }
    }
}
