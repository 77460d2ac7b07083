//! Error handling middleware - RFC 7807 compliant responses.

use std::fmt;

use actix_multipart::MultipartError;
use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use quill_core::error::PostError;
use quill_shared::{ErrorKind, ErrorResponse};

/// Application-level error type that converts to RFC 7807 responses.
#[derive(Debug)]
pub enum AppError {
    Upload(String),
    Validation(String),
    NotFound(String),
    Database(String),
    Internal(String),
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::Upload(_) => ErrorKind::Upload,
            AppError::Validation(_) => ErrorKind::Validation,
            AppError::NotFound(_) => ErrorKind::NotFound,
            AppError::Database(_) => ErrorKind::Database,
            AppError::Internal(_) => ErrorKind::Internal,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Upload(msg) => write!(f, "Upload failed: {}", msg),
            AppError::Validation(msg) => write!(f, "Validation failed: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::Database(msg) => write!(f, "Database error: {}", msg),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Upload(_) | AppError::Validation(_) | AppError::Database(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let error = match self {
            AppError::Upload(detail) => {
                ErrorResponse::new(400, "Upload Rejected").with_detail(detail)
            }
            AppError::Validation(detail) => {
                ErrorResponse::new(400, "Validation Failed").with_detail(detail)
            }
            AppError::NotFound(detail) => ErrorResponse::not_found(detail),
            AppError::Database(detail) => ErrorResponse::bad_request(detail),
            AppError::Internal(detail) => {
                // Log internal errors
                tracing::error!("Internal error: {}", detail);
                ErrorResponse::internal_error()
            }
        };

        HttpResponse::build(self.status_code()).json(error.with_kind(self.kind()))
    }
}

// Conversion from domain errors
impl From<PostError> for AppError {
    fn from(err: PostError) -> Self {
        match err {
            PostError::Upload(e) => AppError::Upload(e.to_string()),
            PostError::Validation(msg) => AppError::Validation(msg),
            PostError::NotFound { id } => AppError::NotFound(format!("post {} not found", id)),
            PostError::Database(e) => {
                tracing::error!(error = %e, "Database error");
                AppError::Database(e.to_string())
            }
        }
    }
}

impl From<MultipartError> for AppError {
    fn from(err: MultipartError) -> Self {
        AppError::Upload(format!("malformed multipart body: {}", err))
    }
}

/// Result type alias for handlers.
pub type AppResult<T> = Result<T, AppError>;
