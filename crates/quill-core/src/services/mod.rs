//! Application services built on the ports.

pub mod posts;

pub use posts::{DEFAULT_CACHE_TTL, POST_LIST_CACHE_KEY, PostService, PostServiceConfig};
