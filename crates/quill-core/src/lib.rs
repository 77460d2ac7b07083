//! # Quill Core
//!
//! The domain layer of the Quill blog service.
//! Domain types, the ports infrastructure must implement, and the post
//! service that orchestrates them. No infrastructure dependencies.

pub mod domain;
pub mod error;
pub mod ports;
pub mod services;

pub use error::{PostError, RepoError};
pub use services::{PostService, PostServiceConfig};
