//! Cover image uploads and the rules they are checked against.

/// Default size limit for a cover image (5 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// An uploaded file as received from the client, before it is stored.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    pub fn new(file_name: impl Into<String>, content_type: Option<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type,
            bytes,
        }
    }

    /// Lowercased extension of the client-side file name, if any.
    pub fn extension(&self) -> Option<String> {
        let (stem, ext) = self.file_name.rsplit_once('.')?;
        if stem.is_empty() || ext.is_empty() {
            return None;
        }
        Some(ext.to_ascii_lowercase())
    }
}

/// Upload validation errors.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("Uploaded file `{file_name}` is empty")]
    Empty { file_name: String },

    #[error("Unsupported file `{file_name}`: please upload a .png/.jpg/.jpeg file")]
    UnsupportedType { file_name: String },

    #[error("File is too large ({size} bytes, limit is {limit} bytes)")]
    TooLarge { size: usize, limit: usize },

    #[error("Could not store uploaded file: {0}")]
    Storage(String),
}

/// Accepted image types and size limit.
#[derive(Debug, Clone)]
pub struct UploadPolicy {
    pub max_bytes: usize,
    pub allowed_extensions: Vec<String>,
    pub allowed_content_types: Vec<String>,
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self {
            max_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            allowed_extensions: ["png", "jpg", "jpeg"].map(String::from).to_vec(),
            allowed_content_types: ["image/png", "image/jpeg"].map(String::from).to_vec(),
        }
    }
}

impl UploadPolicy {
    pub fn with_max_bytes(mut self, max_bytes: usize) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    /// Check an upload against the policy.
    ///
    /// The content type is only checked when the client sent one.
    pub fn check(&self, upload: &ImageUpload) -> Result<(), UploadError> {
        if upload.bytes.is_empty() {
            return Err(UploadError::Empty {
                file_name: upload.file_name.clone(),
            });
        }

        if upload.bytes.len() > self.max_bytes {
            return Err(UploadError::TooLarge {
                size: upload.bytes.len(),
                limit: self.max_bytes,
            });
        }

        let extension_ok = upload
            .extension()
            .is_some_and(|ext| self.allowed_extensions.contains(&ext));
        let content_type_ok = upload.content_type.as_deref().is_none_or(|ct| {
            self.allowed_content_types
                .iter()
                .any(|allowed| allowed.eq_ignore_ascii_case(ct))
        });

        if !extension_ok || !content_type_ok {
            return Err(UploadError::UnsupportedType {
                file_name: upload.file_name.clone(),
            });
        }

        Ok(())
    }
}
