//! Post persistence - PostgreSQL via SeaORM, or process memory.

mod connection;
mod memory_store;

#[cfg(feature = "postgres")]
pub mod entity;
#[cfg(feature = "postgres")]
mod postgres_store;
#[cfg(feature = "postgres")]
mod queries;

pub use connection::DatabaseConfig;
pub use memory_store::InMemoryPostStore;

#[cfg(feature = "postgres")]
pub use connection::connect;
#[cfg(feature = "postgres")]
pub use postgres_store::{PostgresPostStore, PostgresTransaction};
