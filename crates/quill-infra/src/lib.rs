//! # Quill Infrastructure
//!
//! Concrete implementations of the ports defined in `quill-core`:
//! post stores, caches, file stores and id generation.
//!
//! ## Feature Flags
//!
//! - `full` (default) - All features enabled
//! - `minimal` - No external dependencies, in-memory only
//! - `postgres` - PostgreSQL post store via SeaORM
//! - `redis` - Redis-backed post cache

pub mod cache;
pub mod database;
pub mod files;
pub mod id;

// Re-exports - In-Memory
pub use cache::InMemoryCache;
pub use database::{DatabaseConfig, InMemoryPostStore};
pub use files::{InMemoryFileStore, LocalFileStore};
pub use id::UuidIdGenerator;

// Re-exports - PostgreSQL
#[cfg(feature = "postgres")]
pub use database::PostgresPostStore;

// Re-exports - Redis
#[cfg(feature = "redis")]
pub use cache::{RedisCache, RedisConfig};
