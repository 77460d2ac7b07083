//! Application state - shared across all handlers.

use std::sync::Arc;

use quill_core::domain::UploadPolicy;
use quill_core::ports::{Cache, CacheError, FileStore, FileStoreError, PostStore};
use quill_core::{PostService, PostServiceConfig};
use quill_infra::database::{DatabaseConfig, InMemoryPostStore};
use quill_infra::{InMemoryCache, LocalFileStore, UuidIdGenerator};

#[cfg(feature = "postgres")]
use quill_infra::database::PostgresPostStore;
#[cfg(feature = "redis")]
use quill_infra::{RedisCache, RedisConfig};

use crate::background::spawn_cache_purge;
use crate::config::{AppConfig, CacheConfig};

/// Failures that prevent the server from starting.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("Post cache unavailable: {0}")]
    Cache(#[from] CacheError),

    #[error("Upload directory unusable: {0}")]
    Files(#[from] FileStoreError),
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub posts: Arc<PostService>,
    /// Largest cover image accepted, checked while the upload streams in.
    pub upload_max_bytes: usize,
}

impl AppState {
    /// Build the application state with appropriate implementations.
    pub async fn new(config: &AppConfig) -> Result<Self, StartupError> {
        let store = build_store(config.database.as_ref()).await;
        let cache = build_cache(&config.cache).await?;

        let files = LocalFileStore::new(config.upload.dir.clone());
        files.ensure_root().await?;
        tracing::info!(dir = %files.root().display(), "Upload directory ready");

        let post_config = PostServiceConfig {
            cache_ttl: config.cache.ttl,
            upload_policy: UploadPolicy::default().with_max_bytes(config.upload.max_bytes),
        };

        tracing::info!(cache_ttl_secs = config.cache.ttl.as_secs(), "Application state initialized");
        Ok(Self::from_parts(store, cache, Arc::new(files), post_config))
    }

    /// Assemble the state from already-built ports.
    pub fn from_parts(
        store: Arc<dyn PostStore>,
        cache: Arc<dyn Cache>,
        files: Arc<dyn FileStore>,
        post_config: PostServiceConfig,
    ) -> Self {
        let upload_max_bytes = post_config.upload_policy.max_bytes;
        let posts = PostService::new(store, cache, files, Arc::new(UuidIdGenerator), post_config);
        Self {
            posts: Arc::new(posts),
            upload_max_bytes,
        }
    }
}

async fn build_store(config: Option<&DatabaseConfig>) -> Arc<dyn PostStore> {
    #[cfg(feature = "postgres")]
    if let Some(config) = config {
        match quill_infra::database::connect(config).await {
            Ok(db) => return Arc::new(PostgresPostStore::new(db)),
            Err(e) => {
                tracing::error!(
                    "Failed to connect to database: {}. Using in-memory fallback.",
                    e
                );
            }
        }
    } else {
        tracing::warn!("DATABASE_URL not set. Running without database (in-memory mode).");
    }

    #[cfg(not(feature = "postgres"))]
    {
        let _ = config;
        tracing::info!("Running without postgres feature - using in-memory post store");
    }

    fallback_store().await
}

/// In-memory store with one author and one category so posts can be created.
async fn fallback_store() -> Arc<dyn PostStore> {
    let store = InMemoryPostStore::new();
    store.add_author(1, "admin").await;
    store.add_category(1, "general").await;
    tracing::warn!(
        author_id = 1,
        category_id = 1,
        "Posts are kept in memory and lost on restart"
    );
    Arc::new(store)
}

async fn build_cache(config: &CacheConfig) -> Result<Arc<dyn Cache>, StartupError> {
    #[cfg(feature = "redis")]
    if let Some(url) = &config.redis_url {
        let redis_config = RedisConfig {
            url: url.clone(),
            connect_timeout: config.connect_timeout,
            fallback_to_memory: config.fallback_to_memory,
        };
        match RedisCache::connect(&redis_config).await {
            Ok(cache) => return Ok(Arc::new(cache)),
            Err(e) if redis_config.fallback_to_memory => {
                tracing::warn!(error = %e, "Redis unavailable, falling back to in-memory cache");
            }
            Err(e) => return Err(e.into()),
        }
    }

    #[cfg(not(feature = "redis"))]
    if config.redis_url.is_some() {
        tracing::warn!("REDIS_URL is set but the redis feature is disabled; using in-memory cache");
    }

    let cache = Arc::new(InMemoryCache::new());
    spawn_cache_purge(cache.clone(), config.purge_interval);
    let cache: Arc<dyn Cache> = cache;
    Ok(cache)
}
