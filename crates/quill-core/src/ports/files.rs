//! File storage port for cover images.

use async_trait::async_trait;

use crate::domain::ImageUpload;

/// Where uploaded cover images live.
#[async_trait]
pub trait FileStore: Send + Sync {
    /// Persist an upload and return the stored filename.
    async fn save(&self, upload: &ImageUpload) -> Result<String, FileStoreError>;

    /// Remove a stored file by filename.
    async fn remove(&self, filename: &str) -> Result<(), FileStoreError>;
}

/// File storage errors.
#[derive(Debug, thiserror::Error)]
pub enum FileStoreError {
    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid file name: {0}")]
    InvalidName(String),

    #[error("I/O error: {0}")]
    Io(String),
}
