//! File store implementations - local directory and in-memory.

mod local;
mod memory;

pub use local::LocalFileStore;
pub use memory::InMemoryFileStore;
