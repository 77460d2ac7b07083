//! In-memory post store - used when no database is configured.
//!
//! A transaction holds the store lock for its whole lifetime and works on a
//! copy of the tables, so transactions are fully serialized and a rollback
//! (or a dropped transaction) leaves no trace.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, OwnedMutexGuard};

use quill_core::domain::{Author, Category, Post, PostDetail, PostInput, PostView};
use quill_core::error::RepoError;
use quill_core::ports::{PostStore, PostTransaction};

#[derive(Debug, Clone, Default)]
struct Tables {
    authors: BTreeMap<i32, Author>,
    categories: BTreeMap<i32, Category>,
    posts: BTreeMap<String, Post>,
    /// post_id -> category_id
    post_categories: BTreeMap<String, i32>,
}

impl Tables {
    fn detail(&self, post: &Post) -> Option<PostDetail> {
        let category_id = *self.post_categories.get(&post.id)?;
        let category = self.categories.get(&category_id)?;
        let author = self.authors.get(&post.author_id)?;
        Some(PostDetail {
            post: post.clone(),
            author_username: author.username.clone(),
            category_id,
            category_title: category.title.clone(),
        })
    }

    fn details(&self) -> impl Iterator<Item = PostDetail> + '_ {
        self.posts.values().filter_map(|post| self.detail(post))
    }
}

/// Post store kept in process memory.
#[derive(Clone, Default)]
pub struct InMemoryPostStore {
    tables: Arc<Mutex<Tables>>,
}

impl InMemoryPostStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an author row.
    pub async fn add_author(&self, id: i32, username: impl Into<String>) {
        let username = username.into();
        self.tables
            .lock()
            .await
            .authors
            .insert(id, Author { id, username });
    }

    /// Seed a category row.
    pub async fn add_category(&self, id: i32, title: impl Into<String>) {
        let title = title.into();
        self.tables
            .lock()
            .await
            .categories
            .insert(id, Category { id, title });
    }

    /// Number of committed posts.
    #[cfg(test)]
    pub async fn post_count(&self) -> usize {
        self.tables.lock().await.posts.len()
    }
}

#[async_trait]
impl PostStore for InMemoryPostStore {
    async fn begin(&self) -> Result<Box<dyn PostTransaction>, RepoError> {
        let guard = self.tables.clone().lock_owned().await;
        let staged = guard.clone();
        Ok(Box::new(InMemoryTransaction { guard, staged }))
    }
}

struct InMemoryTransaction {
    guard: OwnedMutexGuard<Tables>,
    staged: Tables,
}

#[async_trait]
impl PostTransaction for InMemoryTransaction {
    async fn insert_post(&mut self, post: &Post) -> Result<Post, RepoError> {
        if self.staged.posts.contains_key(&post.id) {
            return Err(RepoError::Constraint(format!(
                "duplicate key value violates unique constraint \"post_pkey\": {}",
                post.id
            )));
        }
        if !self.staged.authors.contains_key(&post.author_id) {
            return Err(RepoError::Constraint(format!(
                "author {} does not exist",
                post.author_id
            )));
        }
        self.staged.posts.insert(post.id.clone(), post.clone());
        Ok(post.clone())
    }

    async fn insert_post_category(
        &mut self,
        post_id: &str,
        category_id: i32,
    ) -> Result<(), RepoError> {
        if !self.staged.posts.contains_key(post_id) {
            return Err(RepoError::Constraint(format!("post {post_id} does not exist")));
        }
        if !self.staged.categories.contains_key(&category_id) {
            return Err(RepoError::Constraint(format!(
                "category {category_id} does not exist"
            )));
        }
        if self.staged.post_categories.contains_key(post_id) {
            return Err(RepoError::Constraint(format!(
                "post {post_id} already has a category"
            )));
        }
        self.staged
            .post_categories
            .insert(post_id.to_owned(), category_id);
        Ok(())
    }

    async fn find_image(&mut self, post_id: &str) -> Result<Option<String>, RepoError> {
        self.staged
            .posts
            .get(post_id)
            .map(|post| post.image.clone())
            .ok_or(RepoError::NotFound)
    }

    async fn update_post(
        &mut self,
        post_id: &str,
        input: &PostInput,
        image: Option<&str>,
    ) -> Result<(), RepoError> {
        if !self.staged.authors.contains_key(&input.author_id) {
            return Err(RepoError::Constraint(format!(
                "author {} does not exist",
                input.author_id
            )));
        }
        let post = self
            .staged
            .posts
            .get_mut(post_id)
            .ok_or(RepoError::NotFound)?;

        post.title = input.title.clone();
        post.meta_title = input.meta_title.clone();
        post.slug = input.slug.clone();
        post.summary = input.summary.clone();
        post.content = input.content.clone();
        post.published = input.published;
        post.author_id = input.author_id;
        post.image = image.map(str::to_owned);
        Ok(())
    }

    async fn update_post_category(
        &mut self,
        post_id: &str,
        category_id: i32,
    ) -> Result<(), RepoError> {
        if !self.staged.categories.contains_key(&category_id) {
            return Err(RepoError::Constraint(format!(
                "category {category_id} does not exist"
            )));
        }
        if let Some(current) = self.staged.post_categories.get_mut(post_id) {
            *current = category_id;
        }
        Ok(())
    }

    async fn delete_post(&mut self, post_id: &str) -> Result<(), RepoError> {
        self.staged.posts.remove(post_id).ok_or(RepoError::NotFound)?;
        self.staged.post_categories.remove(post_id);
        Ok(())
    }

    async fn list_posts(&mut self) -> Result<Vec<Post>, RepoError> {
        Ok(self.staged.posts.values().cloned().collect())
    }

    async fn find_post_view(&mut self, post_id: &str) -> Result<Vec<PostView>, RepoError> {
        let view = self
            .staged
            .posts
            .get(post_id)
            .and_then(|post| self.staged.detail(post))
            .map(|detail| PostView {
                post_id: detail.post.id,
                title: detail.post.title,
                meta_title: detail.post.meta_title,
                summary: detail.post.summary,
                slug: detail.post.slug,
                content: detail.post.content,
                published: detail.post.published,
                published_at: detail.post.published_at,
                cover_image: detail.post.image,
                author: detail.author_username,
                category: detail.category_title,
            });
        Ok(view.into_iter().collect())
    }

    async fn find_by_category(
        &mut self,
        category_title: &str,
    ) -> Result<Vec<PostDetail>, RepoError> {
        Ok(self
            .staged
            .details()
            .filter(|detail| detail.category_title == category_title)
            .collect())
    }

    async fn find_by_author(&mut self, username: &str) -> Result<Vec<PostDetail>, RepoError> {
        Ok(self
            .staged
            .details()
            .filter(|detail| detail.author_username == username)
            .collect())
    }

    async fn commit(self: Box<Self>) -> Result<(), RepoError> {
        let Self { mut guard, staged } = *self;
        *guard = staged;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), RepoError> {
        Ok(())
    }
}
