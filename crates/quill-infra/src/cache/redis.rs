//! Redis cache implementation backed by a connection manager.

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};

use quill_core::ports::{Cache, CacheError};

/// Redis connection configuration.
#[derive(Debug, Clone)]
pub struct RedisConfig {
    /// Redis URL (e.g., redis://localhost:6379)
    pub url: String,
    /// Connection timeout
    pub connect_timeout: Duration,
    /// Whether to fall back to the in-memory cache if Redis is unavailable
    pub fallback_to_memory: bool,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: "redis://127.0.0.1:6379".to_string(),
            connect_timeout: Duration::from_secs(5),
            fallback_to_memory: true,
        }
    }
}

/// Redis-backed cache. Values are plain strings written with `SET .. EX`.
pub struct RedisCache {
    conn: ConnectionManager,
}

impl RedisCache {
    pub async fn connect(config: &RedisConfig) -> Result<Self, CacheError> {
        let client =
            Client::open(config.url.as_str()).map_err(|e| CacheError::Connection(e.to_string()))?;

        let conn = tokio::time::timeout(config.connect_timeout, ConnectionManager::new(client))
            .await
            .map_err(|_| CacheError::Connection("Connection timed out".to_string()))?
            .map_err(|e| CacheError::Connection(e.to_string()))?;

        tracing::info!(url = %config.url, "Connected to Redis cache");
        Ok(Self { conn })
    }
}

/// Redis rejects `EX 0`; anything shorter than a second is rounded up.
fn expiry_seconds(ttl: Duration) -> u64 {
    ttl.as_secs().max(1)
}

#[async_trait]
impl Cache for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut conn = self.conn.clone();
        conn.get::<_, Option<String>>(key)
            .await
            .map_err(|e| CacheError::Operation(e.to_string()))
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        conn.set_ex::<_, _, ()>(key, value, expiry_seconds(ttl))
            .await
            .map_err(|e| CacheError::Operation(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_cache() -> Option<RedisCache> {
        let config = RedisConfig {
            url: std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6389".into()),
            connect_timeout: Duration::from_secs(1),
            fallback_to_memory: false,
        };
        RedisCache::connect(&config).await.ok()
    }

    #[test]
    fn expiry_is_at_least_one_second() {
        assert_eq!(expiry_seconds(Duration::from_millis(10)), 1);
        assert_eq!(expiry_seconds(Duration::from_secs(50_000)), 50_000);
    }

    #[tokio::test]
    async fn set_ex_then_get() {
        let Some(cache) = test_cache().await else {
            tracing::warn!("Redis not available, skipping test");
            return;
        };

        cache
            .set("quill_test_key", "[1,2]", Duration::from_secs(30))
            .await
            .unwrap();
        assert_eq!(
            cache.get("quill_test_key").await.unwrap(),
            Some("[1,2]".to_string())
        );
    }

    #[tokio::test]
    async fn entry_expires() {
        let Some(cache) = test_cache().await else {
            return;
        };

        cache
            .set("quill_test_ttl", "v", Duration::from_secs(1))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert_eq!(cache.get("quill_test_ttl").await.unwrap(), None);
    }
}
