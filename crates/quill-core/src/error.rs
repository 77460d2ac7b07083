//! Domain-level error types.

use thiserror::Error;

use crate::domain::UploadError;

/// Errors surfaced by the post service.
#[derive(Debug, Error)]
pub enum PostError {
    #[error(transparent)]
    Upload(#[from] UploadError),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Post not found: {id}")]
    NotFound { id: String },

    #[error(transparent)]
    Database(RepoError),
}

impl From<RepoError> for PostError {
    fn from(err: RepoError) -> Self {
        PostError::Database(err)
    }
}

/// Repository-level errors.
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Database connection failed: {0}")]
    Connection(String),

    #[error("Query execution failed: {0}")]
    Query(String),

    #[error("Entity not found")]
    NotFound,

    #[error("Constraint violation: {0}")]
    Constraint(String),
}
