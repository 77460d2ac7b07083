use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Post entity - a row of the `post` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    #[serde(rename = "post_id")]
    pub id: String,
    pub title: String,
    pub meta_title: String,
    pub slug: String,
    pub summary: String,
    pub content: String,
    pub published: bool,
    pub published_at: DateTime<Utc>,
    pub author_id: i32,
    /// Cover image filename inside the upload directory.
    pub image: Option<String>,
}

impl Post {
    /// Build a fresh post from validated input, stamped with `now`.
    pub fn new(id: String, input: &PostInput, image: Option<String>, now: DateTime<Utc>) -> Self {
        Self {
            id,
            title: input.title.clone(),
            meta_title: input.meta_title.clone(),
            slug: input.slug.clone(),
            summary: input.summary.clone(),
            content: input.content.clone(),
            published: input.published,
            published_at: now,
            author_id: input.author_id,
            image,
        }
    }
}

/// Typed fields accepted by create and update.
#[derive(Debug, Clone, PartialEq)]
pub struct PostInput {
    pub title: String,
    pub meta_title: String,
    pub slug: String,
    pub summary: String,
    pub content: String,
    pub published: bool,
    pub author_id: i32,
    pub category_id: i32,
}

/// Denormalized single-post view with author and category inlined.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostView {
    pub post_id: String,
    pub title: String,
    pub meta_title: String,
    pub summary: String,
    pub slug: String,
    pub content: String,
    pub published: bool,
    pub published_at: DateTime<Utc>,
    #[serde(rename = "coverimg")]
    pub cover_image: Option<String>,
    /// Author username.
    pub author: String,
    /// Category title.
    pub category: String,
}

/// A post joined with its author and category, as returned by the
/// by-category and by-author listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostDetail {
    #[serde(flatten)]
    pub post: Post,
    pub author_username: String,
    pub category_id: i32,
    pub category_title: String,
}

/// Read-only author row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Author {
    pub id: i32,
    pub username: String,
}

/// Read-only category row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: i32,
    pub title: String,
}
