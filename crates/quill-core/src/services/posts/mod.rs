//! Post service - cache-aside reads and transactional writes.
//!
//! Reads of the full listing and of a single post consult the cache first and
//! only open a transaction on a miss. Writes always run inside a transaction;
//! image files are reconciled after the outcome is known: a new upload is
//! removed when the transaction does not commit, a replaced or deleted image
//! is removed only after it does.
//!
//! Writes never invalidate cache entries. Cached reads may lag behind the
//! database for up to [`PostServiceConfig::cache_ttl`].

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::domain::{ImageUpload, Post, PostDetail, PostInput, PostView, UploadError, UploadPolicy};
use crate::error::{PostError, RepoError};
use crate::ports::{Cache, FileStore, IdGenerator, PostStore, PostTransaction};

/// Cache key of the full post listing.
pub const POST_LIST_CACHE_KEY: &str = "posts";

/// How long cached reads stay valid unless configured otherwise.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(50_000);

/// Cache key of a single post view. `None` when the id collides with the
/// listing key; such lookups bypass the cache.
pub fn post_cache_key(post_id: &str) -> Option<String> {
    (post_id != POST_LIST_CACHE_KEY).then(|| post_id.to_owned())
}

/// Tunables of the post service.
#[derive(Debug, Clone)]
pub struct PostServiceConfig {
    pub cache_ttl: Duration,
    pub upload_policy: UploadPolicy,
}

impl Default for PostServiceConfig {
    fn default() -> Self {
        Self {
            cache_ttl: DEFAULT_CACHE_TTL,
            upload_policy: UploadPolicy::default(),
        }
    }
}

/// Orchestrates post storage, caching and cover image files.
pub struct PostService {
    store: Arc<dyn PostStore>,
    cache: Arc<dyn Cache>,
    files: Arc<dyn FileStore>,
    ids: Arc<dyn IdGenerator>,
    config: PostServiceConfig,
}

impl PostService {
    pub fn new(
        store: Arc<dyn PostStore>,
        cache: Arc<dyn Cache>,
        files: Arc<dyn FileStore>,
        ids: Arc<dyn IdGenerator>,
        config: PostServiceConfig,
    ) -> Self {
        Self {
            store,
            cache,
            files,
            ids,
            config,
        }
    }

    /// Create a post, optionally with a cover image.
    pub async fn create(
        &self,
        input: PostInput,
        upload: Option<ImageUpload>,
    ) -> Result<Post, PostError> {
        let image = self.store_upload(upload.as_ref()).await?;
        let post = Post::new(self.ids.next_id(), &input, image.clone(), Utc::now());

        let mut tx = self.begin(image.as_deref()).await?;
        let outcome = insert_with_category(tx.as_mut(), &post, input.category_id).await;
        let created = self.settle(tx, outcome, image.as_deref()).await?;

        tracing::info!(post_id = %created.id, image = ?created.image, "Post created");
        Ok(created)
    }

    /// All posts ordered by id.
    pub async fn list(&self) -> Result<Vec<Post>, PostError> {
        if let Some(posts) = self.cached(POST_LIST_CACHE_KEY).await {
            return Ok(posts);
        }

        let mut tx = self.begin(None).await?;
        let outcome = tx.list_posts().await.map_err(PostError::from);
        let posts = self.settle(tx, outcome, None).await?;

        self.populate(POST_LIST_CACHE_KEY, &posts).await;
        Ok(posts)
    }

    /// Denormalized view of one post. Empty when the post does not exist.
    pub async fn find_by_id(&self, post_id: &str) -> Result<Vec<PostView>, PostError> {
        let key = post_cache_key(post_id);
        if let Some(key) = &key {
            if let Some(view) = self.cached(key).await {
                return Ok(view);
            }
        }

        let mut tx = self.begin(None).await?;
        let outcome = tx.find_post_view(post_id).await.map_err(PostError::from);
        let view = self.settle(tx, outcome, None).await?;

        if let Some(key) = &key {
            self.populate(key, &view).await;
        }
        Ok(view)
    }

    /// Posts in the category with the given title. Never cached.
    pub async fn find_by_category(&self, category_title: &str) -> Result<Vec<PostDetail>, PostError> {
        let mut tx = self.begin(None).await?;
        let outcome = tx
            .find_by_category(category_title)
            .await
            .map_err(PostError::from);
        self.settle(tx, outcome, None).await
    }

    /// Posts by the author with the given username. Never cached.
    pub async fn find_by_author(&self, username: &str) -> Result<Vec<PostDetail>, PostError> {
        let mut tx = self.begin(None).await?;
        let outcome = tx.find_by_author(username).await.map_err(PostError::from);
        self.settle(tx, outcome, None).await
    }

    /// Overwrite a post. The image column always takes the new upload's
    /// filename, or null when no upload was sent.
    pub async fn update(
        &self,
        post_id: &str,
        input: PostInput,
        upload: Option<ImageUpload>,
    ) -> Result<(), PostError> {
        let new_image = self.store_upload(upload.as_ref()).await?;

        let mut tx = self.begin(new_image.as_deref()).await?;
        let outcome = apply_update(tx.as_mut(), post_id, &input, new_image.as_deref()).await;
        let previous = self.settle(tx, outcome, new_image.as_deref()).await?;

        match previous {
            Some(old) if new_image.as_deref() != Some(old.as_str()) => {
                self.remove_file(&old).await;
            }
            _ => tracing::debug!(post_id, "Cover image unchanged or absent, nothing to remove"),
        }

        tracing::info!(post_id, image = ?new_image, "Post updated");
        Ok(())
    }

    /// Delete a post, then its cover image.
    pub async fn delete(&self, post_id: &str) -> Result<(), PostError> {
        let mut tx = self.begin(None).await?;
        let outcome = apply_delete(tx.as_mut(), post_id).await;
        let image = self.settle(tx, outcome, None).await?;

        if let Some(image) = image {
            self.remove_file(&image).await;
        }

        tracing::info!(post_id, "Post deleted");
        Ok(())
    }

    async fn store_upload(&self, upload: Option<&ImageUpload>) -> Result<Option<String>, PostError> {
        let Some(upload) = upload else {
            return Ok(None);
        };

        self.config.upload_policy.check(upload)?;
        let filename = self
            .files
            .save(upload)
            .await
            .map_err(|e| UploadError::Storage(e.to_string()))?;

        tracing::debug!(filename = %filename, original = %upload.file_name, "Stored upload");
        Ok(Some(filename))
    }

    async fn begin(&self, upload: Option<&str>) -> Result<Box<dyn PostTransaction>, PostError> {
        match self.store.begin().await {
            Ok(tx) => Ok(tx),
            Err(err) => {
                self.discard_upload(upload).await;
                Err(err.into())
            }
        }
    }

    /// Commit on success, roll back on failure. Either way a failed outcome
    /// removes the upload saved for this request.
    async fn settle<T>(
        &self,
        tx: Box<dyn PostTransaction>,
        outcome: Result<T, PostError>,
        upload: Option<&str>,
    ) -> Result<T, PostError> {
        match outcome {
            Ok(value) => match tx.commit().await {
                Ok(()) => Ok(value),
                Err(err) => {
                    tracing::error!(error = %err, "Commit failed");
                    self.discard_upload(upload).await;
                    Err(err.into())
                }
            },
            Err(err) => {
                tracing::warn!(error = %err, "Rolling back transaction");
                if let Err(rollback_err) = tx.rollback().await {
                    tracing::error!(error = %rollback_err, "Rollback failed");
                }
                self.discard_upload(upload).await;
                Err(err)
            }
        }
    }

    async fn discard_upload(&self, upload: Option<&str>) {
        if let Some(filename) = upload {
            self.remove_file(filename).await;
        }
    }

    async fn remove_file(&self, filename: &str) {
        match self.files.remove(filename).await {
            Ok(()) => tracing::debug!(filename, "Removed image file"),
            Err(err) => tracing::warn!(filename, error = %err, "Failed to remove image file"),
        }
    }

    async fn cached<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self.cache.get(key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                tracing::debug!(key, "Cache miss");
                return None;
            }
            Err(err) => {
                tracing::warn!(key, error = %err, "Cache lookup failed, reading from database");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => {
                tracing::debug!(key, "Using cached data");
                Some(value)
            }
            Err(err) => {
                tracing::warn!(key, error = %err, "Ignoring unreadable cache entry");
                None
            }
        }
    }

    async fn populate<T: Serialize>(&self, key: &str, value: &T) {
        let payload = match serde_json::to_string(value) {
            Ok(payload) => payload,
            Err(err) => {
                tracing::warn!(key, error = %err, "Could not serialize cache entry");
                return;
            }
        };

        if let Err(err) = self.cache.set(key, &payload, self.config.cache_ttl).await {
            tracing::warn!(key, error = %err, "Cache write failed");
        }
    }
}

async fn insert_with_category(
    tx: &mut dyn PostTransaction,
    post: &Post,
    category_id: i32,
) -> Result<Post, PostError> {
    let inserted = tx.insert_post(post).await?;
    tx.insert_post_category(&inserted.id, category_id).await?;
    Ok(inserted)
}

/// Returns the image the post had before the update.
async fn apply_update(
    tx: &mut dyn PostTransaction,
    post_id: &str,
    input: &PostInput,
    image: Option<&str>,
) -> Result<Option<String>, PostError> {
    let previous = tx
        .find_image(post_id)
        .await
        .map_err(|e| missing_post(e, post_id))?;
    tx.update_post(post_id, input, image)
        .await
        .map_err(|e| missing_post(e, post_id))?;
    tx.update_post_category(post_id, input.category_id).await?;
    Ok(previous)
}

/// Returns the image the deleted post had.
async fn apply_delete(tx: &mut dyn PostTransaction, post_id: &str) -> Result<Option<String>, PostError> {
    let image = tx
        .find_image(post_id)
        .await
        .map_err(|e| missing_post(e, post_id))?;
    tx.delete_post(post_id)
        .await
        .map_err(|e| missing_post(e, post_id))?;
    Ok(image)
}

fn missing_post(err: RepoError, post_id: &str) -> PostError {
    match err {
        RepoError::NotFound => PostError::NotFound {
            id: post_id.to_owned(),
        },
        other => PostError::Database(other),
    }
}

#[cfg(test)]
mod tests;
