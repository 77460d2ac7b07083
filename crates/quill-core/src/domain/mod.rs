//! Domain entities - the core business objects.

mod post;
mod upload;

pub use post::{Author, Category, Post, PostDetail, PostInput, PostView};
pub use upload::{DEFAULT_MAX_UPLOAD_BYTES, ImageUpload, UploadError, UploadPolicy};
