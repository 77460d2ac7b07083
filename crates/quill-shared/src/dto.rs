//! Data Transfer Objects - request/response types for the API.

use serde::{Deserialize, Serialize};

/// Multipart text field names accepted by the create and update endpoints.
pub const POST_FORM_FIELDS: [&str; 8] = [
    "post_title",
    "post_meta_title",
    "post_slug",
    "post_summary",
    "post_content",
    "post_published",
    "author_id",
    "category_id",
];

/// Name of the multipart file field carrying the cover image.
pub const IMAGE_FIELD: &str = "image";

/// Raw text fields of a post form, exactly as submitted.
///
/// Every field is optional here; presence and format are checked when the
/// form is turned into a typed post input.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PostForm {
    pub post_title: Option<String>,
    pub post_meta_title: Option<String>,
    pub post_slug: Option<String>,
    pub post_summary: Option<String>,
    pub post_content: Option<String>,
    pub post_published: Option<String>,
    pub author_id: Option<String>,
    pub category_id: Option<String>,
}

impl PostForm {
    /// Store a text field by its multipart name. Returns `false` for names
    /// that are not part of the form.
    pub fn set(&mut self, name: &str, value: String) -> bool {
        let slot = match name {
            "post_title" => &mut self.post_title,
            "post_meta_title" => &mut self.post_meta_title,
            "post_slug" => &mut self.post_slug,
            "post_summary" => &mut self.post_summary,
            "post_content" => &mut self.post_content,
            "post_published" => &mut self.post_published,
            "author_id" => &mut self.author_id,
            "category_id" => &mut self.category_id,
            _ => return false,
        };
        *slot = Some(value);
        true
    }
}

/// Parse the boolean spellings HTML forms and curl users send.
pub fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "on" | "yes" => Some(true),
        "false" | "0" | "off" | "no" => Some(false),
        _ => None,
    }
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: String,
}
