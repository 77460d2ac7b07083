//! Cover images on the local filesystem.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use uuid::Uuid;

use quill_core::domain::ImageUpload;
use quill_core::ports::{FileStore, FileStoreError};

/// Stores uploads as `<uuid>-<sanitized original name>` inside one directory.
#[derive(Debug, Clone)]
pub struct LocalFileStore {
    root: PathBuf,
}

impl LocalFileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Create the upload directory if it does not exist yet.
    pub async fn ensure_root(&self) -> Result<(), FileStoreError> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| FileStoreError::Io(e.to_string()))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute location of a stored file. Rejects anything that is not a
    /// bare file name.
    pub fn path_for(&self, filename: &str) -> Result<PathBuf, FileStoreError> {
        let is_bare = !filename.is_empty()
            && filename != "."
            && filename != ".."
            && !filename.contains(['/', '\\']);
        if !is_bare {
            return Err(FileStoreError::InvalidName(filename.to_owned()));
        }
        Ok(self.root.join(filename))
    }
}

/// Keep the last path segment and replace anything unusual with `_`.
fn sanitize(original: &str) -> Option<String> {
    let base = original.rsplit(['/', '\\']).next().unwrap_or(original);
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let trimmed = cleaned.trim_start_matches('.');
    (!trimmed.is_empty()).then(|| trimmed.to_owned())
}

#[async_trait]
impl FileStore for LocalFileStore {
    async fn save(&self, upload: &ImageUpload) -> Result<String, FileStoreError> {
        let name = sanitize(&upload.file_name)
            .ok_or_else(|| FileStoreError::InvalidName(upload.file_name.clone()))?;
        let filename = format!("{}-{}", Uuid::new_v4().simple(), name);
        let path = self.path_for(&filename)?;

        tokio::fs::write(&path, &upload.bytes)
            .await
            .map_err(|e| FileStoreError::Io(e.to_string()))?;

        tracing::debug!(path = %path.display(), bytes = upload.bytes.len(), "Wrote upload");
        Ok(filename)
    }

    async fn remove(&self, filename: &str) -> Result<(), FileStoreError> {
        let path = self.path_for(filename)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(FileStoreError::NotFound(filename.to_owned()))
            }
            Err(e) => Err(FileStoreError::Io(e.to_string())),
        }
    }
}
