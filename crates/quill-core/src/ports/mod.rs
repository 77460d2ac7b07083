//! Ports - trait definitions for external dependencies.
//! These are the "interfaces" that infrastructure must implement.

mod cache;
mod files;
mod id;
mod store;

pub use cache::{Cache, CacheError};
pub use files::{FileStore, FileStoreError};
pub use id::IdGenerator;
pub use store::{PostStore, PostTransaction};
