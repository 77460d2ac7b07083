//! In-memory cache - used when Redis is not configured or unreachable.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tokio::time::Instant;

use quill_core::ports::{Cache, CacheError};

struct CacheEntry {
    value: String,
    expires_at: Instant,
}

impl CacheEntry {
    fn is_live(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// Process-local cache with a deadline per entry.
///
/// Expired entries read as absent and are dropped lazily, on the next read of
/// the same key or on [`InMemoryCache::purge_expired`]. Data is lost on restart.
#[derive(Default)]
pub struct InMemoryCache {
    store: RwLock<HashMap<String, CacheEntry>>,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every expired entry. Returns how many were removed.
    pub async fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut store = self.store.write().await;
        let before = store.len();
        store.retain(|_, entry| entry.is_live(now));
        before - store.len()
    }

    /// Number of stored entries, expired ones included.
    pub async fn len(&self) -> usize {
        self.store.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl Cache for InMemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let now = Instant::now();
        {
            let store = self.store.read().await;
            match store.get(key) {
                None => return Ok(None),
                Some(entry) if entry.is_live(now) => return Ok(Some(entry.value.clone())),
                Some(_) => {}
            }
        }

        let mut store = self.store.write().await;
        if store.get(key).is_some_and(|entry| !entry.is_live(now)) {
            store.remove(key);
        }
        Ok(None)
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        let entry = CacheEntry {
            value: value.to_owned(),
            expires_at: Instant::now() + ttl,
        };
        self.store.write().await.insert(key.to_owned(), entry);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn set_then_get() {
        let cache = InMemoryCache::new();
        cache
            .set("posts", "[]", Duration::from_secs(60))
            .await
            .unwrap();
        assert_eq!(cache.get("posts").await.unwrap(), Some("[]".to_string()));
        assert_eq!(cache.get("other").await.unwrap(), None);
    }

    #[tokio::test]
    async fn overwrite_resets_value_and_deadline() {
        let cache = InMemoryCache::new();
        cache.set("k", "old", Duration::from_secs(1)).await.unwrap();
        cache.set("k", "new", Duration::from_secs(60)).await.unwrap();
        assert_eq!(cache.get("k").await.unwrap(), Some("new".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn entries_expire_after_ttl() {
        let cache = InMemoryCache::new();
        cache.set("k", "v", Duration::from_secs(10)).await.unwrap();

        tokio::time::advance(Duration::from_secs(9)).await;
        assert_eq!(cache.get("k").await.unwrap(), Some("v".to_string()));

        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(cache.get("k").await.unwrap(), None);
        assert!(cache.is_empty().await);
    }

    #[tokio::test(start_paused = true)]
    async fn purge_drops_only_expired_entries() {
        let cache = InMemoryCache::new();
        cache.set("short", "1", Duration::from_secs(1)).await.unwrap();
        cache.set("long", "2", Duration::from_secs(100)).await.unwrap();

        tokio::time::advance(Duration::from_secs(5)).await;

        assert_eq!(cache.purge_expired().await, 1);
        assert_eq!(cache.len().await, 1);
        assert_eq!(cache.get("long").await.unwrap(), Some("2".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn purge_reclaims_many_distinct_keys() {
        let cache = InMemoryCache::new();
        for i in 0..1_000 {
            cache
                .set(&format!("post-{i}"), "[]", Duration::from_secs(30))
                .await
                .unwrap();
        }
        assert_eq!(cache.len().await, 1_000);

        tokio::time::advance(Duration::from_secs(31)).await;

        assert_eq!(cache.purge_expired().await, 1_000);
        assert!(cache.is_empty().await);
    }
}
