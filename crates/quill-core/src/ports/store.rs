//! Transactional post storage port.

use async_trait::async_trait;

use crate::domain::{Post, PostDetail, PostInput, PostView};
use crate::error::RepoError;

/// Entry point to the relational store: every interaction happens inside a
/// transaction obtained from [`PostStore::begin`].
#[async_trait]
pub trait PostStore: Send + Sync {
    async fn begin(&self) -> Result<Box<dyn PostTransaction>, RepoError>;
}

/// An open transaction. Dropping it without calling [`commit`] discards
/// its changes.
///
/// [`commit`]: PostTransaction::commit
#[async_trait]
pub trait PostTransaction: Send {
    /// Insert a post row and return it as stored.
    async fn insert_post(&mut self, post: &Post) -> Result<Post, RepoError>;

    /// Link a post to its category.
    async fn insert_post_category(&mut self, post_id: &str, category_id: i32)
    -> Result<(), RepoError>;

    /// Current cover image of a post. `Err(RepoError::NotFound)` when the
    /// post does not exist.
    async fn find_image(&mut self, post_id: &str) -> Result<Option<String>, RepoError>;

    /// Overwrite every editable column of a post, including its image.
    async fn update_post(
        &mut self,
        post_id: &str,
        input: &PostInput,
        image: Option<&str>,
    ) -> Result<(), RepoError>;

    /// Point the post's category link at another category.
    async fn update_post_category(&mut self, post_id: &str, category_id: i32)
    -> Result<(), RepoError>;

    /// Delete a post together with its category link.
    async fn delete_post(&mut self, post_id: &str) -> Result<(), RepoError>;

    /// All posts ordered by id.
    async fn list_posts(&mut self) -> Result<Vec<Post>, RepoError>;

    /// Denormalized view of one post (zero or one row).
    async fn find_post_view(&mut self, post_id: &str) -> Result<Vec<PostView>, RepoError>;

    /// Posts whose category has the given title.
    async fn find_by_category(&mut self, category_title: &str)
    -> Result<Vec<PostDetail>, RepoError>;

    /// Posts written by the given username.
    async fn find_by_author(&mut self, username: &str) -> Result<Vec<PostDetail>, RepoError>;

    async fn commit(self: Box<Self>) -> Result<(), RepoError>;

    async fn rollback(self: Box<Self>) -> Result<(), RepoError>;
}
