//! Background tasks started alongside the HTTP server.

mod cache_purge;

pub use cache_purge::spawn_cache_purge;
