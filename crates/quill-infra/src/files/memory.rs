//! In-memory file store for tests and database-less runs.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use quill_core::domain::ImageUpload;
use quill_core::ports::{FileStore, FileStoreError};

/// Keeps uploads in a map. A file keeps its original name unless that name
/// is taken, in which case a numeric prefix is added.
#[derive(Default)]
pub struct InMemoryFileStore {
    files: RwLock<BTreeMap<String, Vec<u8>>>,
}

impl InMemoryFileStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn contains(&self, filename: &str) -> bool {
        self.files.read().await.contains_key(filename)
    }

    /// Names of every stored file, sorted.
    pub async fn filenames(&self) -> Vec<String> {
        self.files.read().await.keys().cloned().collect()
    }
}

#[async_trait]
impl FileStore for InMemoryFileStore {
    async fn save(&self, upload: &ImageUpload) -> Result<String, FileStoreError> {
        if upload.file_name.is_empty() || upload.file_name.contains(['/', '\\']) {
            return Err(FileStoreError::InvalidName(upload.file_name.clone()));
        }

        let mut files = self.files.write().await;
        let mut filename = upload.file_name.clone();
        let mut n = 1;
        while files.contains_key(&filename) {
            filename = format!("{n}-{}", upload.file_name);
            n += 1;
        }
        files.insert(filename.clone(), upload.bytes.clone());
        Ok(filename)
    }

    async fn remove(&self, filename: &str) -> Result<(), FileStoreError> {
        self.files
            .write()
            .await
            .remove(filename)
            .map(|_| ())
            .ok_or_else(|| FileStoreError::NotFound(filename.to_owned()))
    }
}
