use async_trait::async_trait;
use std::time::Duration;

/// Cache trait - key/value store with per-entry expiry (Redis, in-memory).
#[async_trait]
pub trait Cache: Send + Sync {
    /// Get a live value. Expired entries read as absent.
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Store a value that expires after `ttl`.
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError>;
}

/// Cache operation errors.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Operation failed: {0}")]
    Operation(String),
}
