use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use super::*;
use crate::domain::{ImageUpload, Post, PostDetail, PostInput, PostView};
use crate::error::{PostError, RepoError};
use crate::ports::{CacheError, FileStoreError};

const CATEGORIES: [(i32, &str); 2] = [(1, "rust"), (2, "life")];
const AUTHORS: [(i32, &str); 1] = [(1, "ada")];

#[derive(Clone, Default)]
struct Tables {
    posts: BTreeMap<String, Post>,
    links: BTreeMap<String, i32>,
}

impl Tables {
    fn detail(&self, post: &Post) -> Option<PostDetail> {
        let category_id = *self.links.get(&post.id)?;
        let (_, category_title) = CATEGORIES.iter().find(|(id, _)| *id == category_id)?;
        let (_, author) = AUTHORS.iter().find(|(id, _)| *id == post.author_id)?;
        Some(PostDetail {
            post: post.clone(),
            author_username: author.to_string(),
            category_id,
            category_title: category_title.to_string(),
        })
    }
}

#[derive(Default)]
struct FakeDb {
    committed: Tables,
    calls: Vec<&'static str>,
    fail_on: Option<&'static str>,
}

/// Store double that records every call and stages writes until commit.
#[derive(Clone, Default)]
struct FakeStore {
    db: Arc<Mutex<FakeDb>>,
}

impl FakeStore {
    fn record(&self, op: &'static str) -> Result<(), RepoError> {
        let mut db = self.db.lock().unwrap();
        db.calls.push(op);
        if db.fail_on == Some(op) {
            return Err(RepoError::Query(format!("{op} exploded")));
        }
        Ok(())
    }

    fn fail_on(&self, op: &'static str) {
        self.db.lock().unwrap().fail_on = Some(op);
    }

    fn calls(&self) -> Vec<&'static str> {
        self.db.lock().unwrap().calls.clone()
    }

    fn clear_calls(&self) {
        self.db.lock().unwrap().calls.clear();
    }

    fn count(&self, op: &str) -> usize {
        self.calls().iter().filter(|c| **c == op).count()
    }

    fn committed(&self) -> Tables {
        self.db.lock().unwrap().committed.clone()
    }
}

struct FakeTx {
    store: FakeStore,
    staged: Tables,
}

#[async_trait]
impl PostStore for FakeStore {
    async fn begin(&self) -> Result<Box<dyn PostTransaction>, RepoError> {
        self.record("begin")?;
        let staged = self.committed();
        Ok(Box::new(FakeTx {
            store: self.clone(),
            staged,
        }))
    }
}

#[async_trait]
impl PostTransaction for FakeTx {
    async fn insert_post(&mut self, post: &Post) -> Result<Post, RepoError> {
        self.store.record("insert_post")?;
        if self.staged.posts.contains_key(&post.id) {
            return Err(RepoError::Constraint("duplicate post_id".into()));
        }
        self.staged.posts.insert(post.id.clone(), post.clone());
        Ok(post.clone())
    }

    async fn insert_post_category(
        &mut self,
        post_id: &str,
        category_id: i32,
    ) -> Result<(), RepoError> {
        self.store.record("insert_post_category")?;
        if !CATEGORIES.iter().any(|(id, _)| *id == category_id) {
            return Err(RepoError::Constraint("unknown category".into()));
        }
        self.staged.links.insert(post_id.to_owned(), category_id);
        Ok(())
    }

    async fn find_image(&mut self, post_id: &str) -> Result<Option<String>, RepoError> {
        self.store.record("find_image")?;
        self.staged
            .posts
            .get(post_id)
            .map(|p| p.image.clone())
            .ok_or(RepoError::NotFound)
    }

    async fn update_post(
        &mut self,
        post_id: &str,
        input: &PostInput,
        image: Option<&str>,
    ) -> Result<(), RepoError> {
        self.store.record("update_post")?;
        let post = self.staged.posts.get_mut(post_id).ok_or(RepoError::NotFound)?;
        post.title = input.title.clone();
        post.content = input.content.clone();
        post.image = image.map(str::to_owned);
        Ok(())
    }

    async fn update_post_category(
        &mut self,
        post_id: &str,
        category_id: i32,
    ) -> Result<(), RepoError> {
        self.store.record("update_post_category")?;
        self.staged.links.insert(post_id.to_owned(), category_id);
        Ok(())
    }

    async fn delete_post(&mut self, post_id: &str) -> Result<(), RepoError> {
        self.store.record("delete_post")?;
        self.staged.links.remove(post_id);
        self.staged
            .posts
            .remove(post_id)
            .map(|_| ())
            .ok_or(RepoError::NotFound)
    }

    async fn list_posts(&mut self) -> Result<Vec<Post>, RepoError> {
        self.store.record("list_posts")?;
        Ok(self.staged.posts.values().cloned().collect())
    }

    async fn find_post_view(&mut self, post_id: &str) -> Result<Vec<PostView>, RepoError> {
        self.store.record("find_post_view")?;
        Ok(self
            .staged
            .posts
            .get(post_id)
            .and_then(|p| self.staged.detail(p))
            .map(|d| PostView {
                post_id: d.post.id.clone(),
                title: d.post.title.clone(),
                meta_title: d.post.meta_title.clone(),
                summary: d.post.summary.clone(),
                slug: d.post.slug.clone(),
                content: d.post.content.clone(),
                published: d.post.published,
                published_at: d.post.published_at,
                cover_image: d.post.image.clone(),
                author: d.author_username,
                category: d.category_title,
            })
            .into_iter()
            .collect())
    }

    async fn find_by_category(
        &mut self,
        category_title: &str,
    ) -> Result<Vec<PostDetail>, RepoError> {
        self.store.record("find_by_category")?;
        Ok(self
            .staged
            .posts
            .values()
            .filter_map(|p| self.staged.detail(p))
            .filter(|d| d.category_title == category_title)
            .collect())
    }

    async fn find_by_author(&mut self, username: &str) -> Result<Vec<PostDetail>, RepoError> {
        self.store.record("find_by_author")?;
        Ok(self
            .staged
            .posts
            .values()
            .filter_map(|p| self.staged.detail(p))
            .filter(|d| d.author_username == username)
            .collect())
    }

    async fn commit(self: Box<Self>) -> Result<(), RepoError> {
        self.store.record("commit")?;
        let FakeTx { store, staged } = *self;
        store.db.lock().unwrap().committed = staged;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), RepoError> {
        self.store.record("rollback")
    }
}

#[derive(Default)]
struct FakeCache {
    entries: Mutex<HashMap<String, (String, Duration)>>,
    gets: AtomicU32,
}

impl FakeCache {
    fn entry(&self, key: &str) -> Option<(String, Duration)> {
        self.entries.lock().unwrap().get(key).cloned()
    }
}

#[async_trait]
impl Cache for FakeCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        Ok(self.entry(key).map(|(value, _)| value))
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_owned(), (value.to_owned(), ttl));
        Ok(())
    }
}

#[derive(Default)]
struct FakeFiles {
    saved: Mutex<Vec<String>>,
    removed: Mutex<Vec<String>>,
}

impl FakeFiles {
    fn saved(&self) -> Vec<String> {
        self.saved.lock().unwrap().clone()
    }

    fn removed(&self) -> Vec<String> {
        self.removed.lock().unwrap().clone()
    }
}

#[async_trait]
impl FileStore for FakeFiles {
    async fn save(&self, upload: &ImageUpload) -> Result<String, FileStoreError> {
        self.saved.lock().unwrap().push(upload.file_name.clone());
        Ok(upload.file_name.clone())
    }

    async fn remove(&self, filename: &str) -> Result<(), FileStoreError> {
        self.removed.lock().unwrap().push(filename.to_owned());
        Ok(())
    }
}

#[derive(Default)]
struct SequentialIds(AtomicU32);

impl IdGenerator for SequentialIds {
    fn next_id(&self) -> String {
        format!("post-{:04}", self.0.fetch_add(1, Ordering::SeqCst) + 1)
    }
}

struct Harness {
    service: PostService,
    store: FakeStore,
    cache: Arc<FakeCache>,
    files: Arc<FakeFiles>,
}

fn harness() -> Harness {
    let store = FakeStore::default();
    let cache = Arc::new(FakeCache::default());
    let files = Arc::new(FakeFiles::default());
    let service = PostService::new(
        Arc::new(store.clone()),
        cache.clone(),
        files.clone(),
        Arc::new(SequentialIds::default()),
        PostServiceConfig::default(),
    );
    Harness {
        service,
        store,
        cache,
        files,
    }
}

fn input(title: &str) -> PostInput {
    PostInput {
        title: title.to_string(),
        meta_title: format!("{title} meta"),
        slug: title.to_lowercase(),
        summary: "summary".to_string(),
        content: "content".to_string(),
        published: true,
        author_id: 1,
        category_id: 1,
    }
}

fn png(name: &str) -> ImageUpload {
    ImageUpload::new(name, Some("image/png".to_string()), vec![0x89, 0x50, 0x4e, 0x47])
}

#[tokio::test]
async fn create_assigns_unique_ids() {
    let h = harness();

    let first = h.service.create(input("One"), None).await.unwrap();
    let second = h.service.create(input("Two"), None).await.unwrap();

    assert_ne!(first.id, second.id);
    assert_eq!(h.store.committed().posts.len(), 2);
    assert_eq!(h.store.committed().links.get(&first.id), Some(&1));
}

#[tokio::test]
async fn create_is_atomic_when_category_insert_fails() {
    let h = harness();
    let mut bad = input("Orphan");
    bad.category_id = 99;

    let err = h.service.create(bad, Some(png("a.png"))).await.unwrap_err();

    assert!(matches!(err, PostError::Database(RepoError::Constraint(_))));
    assert!(h.store.committed().posts.is_empty());
    assert_eq!(h.store.count("rollback"), 1);
    assert_eq!(h.store.count("commit"), 0);
    assert_eq!(h.files.removed(), vec!["a.png".to_string()]);
}

#[tokio::test]
async fn create_rejects_bad_upload_before_touching_store() {
    let h = harness();
    let gif = ImageUpload::new("cover.gif", Some("image/gif".into()), vec![1, 2, 3]);

    let err = h.service.create(input("T"), Some(gif)).await.unwrap_err();

    assert!(matches!(err, PostError::Upload(_)));
    assert!(h.store.calls().is_empty());
    assert!(h.files.saved().is_empty());
}

#[tokio::test]
async fn create_removes_upload_when_begin_fails() {
    let h = harness();
    h.store.fail_on("begin");

    let err = h.service.create(input("T"), Some(png("a.png"))).await.unwrap_err();

    assert!(matches!(err, PostError::Database(RepoError::Query(_))));
    assert_eq!(h.files.removed(), vec!["a.png".to_string()]);
}

#[tokio::test]
async fn find_by_id_cache_hit_skips_store() {
    let h = harness();
    let post = h.service.create(input("Cached"), None).await.unwrap();

    let first = h.service.find_by_id(&post.id).await.unwrap();
    h.store.clear_calls();
    let second = h.service.find_by_id(&post.id).await.unwrap();

    assert_eq!(first, second);
    assert!(h.store.calls().is_empty());
}

#[tokio::test]
async fn find_by_id_miss_queries_once_and_populates_cache() {
    let h = harness();
    let post = h.service.create(input("Fresh"), Some(png("a.png"))).await.unwrap();
    h.store.clear_calls();

    let view = h.service.find_by_id(&post.id).await.unwrap();

    assert_eq!(h.store.calls(), vec!["begin", "find_post_view", "commit"]);
    assert_eq!(view.len(), 1);
    assert_eq!(view[0].author, "ada");
    assert_eq!(view[0].category, "rust");
    assert_eq!(view[0].cover_image.as_deref(), Some("a.png"));

    let (payload, ttl) = h.cache.entry(&post.id).expect("cache populated");
    assert_eq!(ttl, DEFAULT_CACHE_TTL);
    let cached: Vec<PostView> = serde_json::from_str(&payload).unwrap();
    assert_eq!(cached, view);
}

#[tokio::test]
async fn list_is_cached_under_posts_key_and_tolerates_staleness() {
    let h = harness();
    h.service.create(input("A"), None).await.unwrap();

    let before = h.service.list().await.unwrap();
    assert!(h.cache.entry(POST_LIST_CACHE_KEY).is_some());

    h.service.create(input("B"), None).await.unwrap();
    let stale = h.service.list().await.unwrap();

    assert_eq!(before, stale);
    assert_eq!(h.store.committed().posts.len(), 2);
}

#[tokio::test]
async fn lookup_of_listing_key_as_post_id_leaves_listing_cache_alone() {
    let h = harness();
    h.service.create(input("A"), None).await.unwrap();
    let listed = h.service.list().await.unwrap();
    let (before, _) = h.cache.entry(POST_LIST_CACHE_KEY).unwrap();

    let view = h.service.find_by_id(POST_LIST_CACHE_KEY).await.unwrap();
    h.store.clear_calls();
    let again = h.service.find_by_id(POST_LIST_CACHE_KEY).await.unwrap();

    assert!(view.is_empty());
    assert!(again.is_empty());
    assert_eq!(h.store.count("find_post_view"), 1);
    let (after, _) = h.cache.entry(POST_LIST_CACHE_KEY).unwrap();
    assert_eq!(before, after);
    assert_eq!(h.service.list().await.unwrap(), listed);
}

#[tokio::test]
async fn unreadable_cache_entry_falls_back_to_store() {
    let h = harness();
    h.cache
        .set(POST_LIST_CACHE_KEY, "not json", DEFAULT_CACHE_TTL)
        .await
        .unwrap();
    h.service.create(input("A"), None).await.unwrap();
    h.store.clear_calls();

    let posts = h.service.list().await.unwrap();

    assert_eq!(posts.len(), 1);
    assert_eq!(h.store.count("list_posts"), 1);
}

#[tokio::test]
async fn category_and_author_lookups_bypass_cache() {
    let h = harness();
    h.service.create(input("A"), None).await.unwrap();
    let mut other = input("B");
    other.category_id = 2;
    h.service.create(other, None).await.unwrap();
    h.store.clear_calls();
    let gets_before = h.cache.gets.load(Ordering::SeqCst);

    let rust = h.service.find_by_category("rust").await.unwrap();
    let rust_again = h.service.find_by_category("rust").await.unwrap();
    let by_ada = h.service.find_by_author("ada").await.unwrap();

    assert_eq!(rust.len(), 1);
    assert_eq!(rust, rust_again);
    assert_eq!(by_ada.len(), 2);
    assert_eq!(h.store.count("begin"), 3);
    assert_eq!(h.cache.gets.load(Ordering::SeqCst), gets_before);
}

#[tokio::test]
async fn update_with_same_image_removes_nothing() {
    let h = harness();
    let post = h.service.create(input("T"), Some(png("a.png"))).await.unwrap();

    h.service
        .update(&post.id, input("T2"), Some(png("a.png")))
        .await
        .unwrap();

    assert!(h.files.removed().is_empty());
}

#[tokio::test]
async fn update_with_new_image_removes_old_exactly_once() {
    let h = harness();
    let post = h.service.create(input("T"), Some(png("a.png"))).await.unwrap();

    h.service
        .update(&post.id, input("T2"), Some(png("b.png")))
        .await
        .unwrap();

    assert_eq!(h.files.removed(), vec!["a.png".to_string()]);
    let committed = h.store.committed();
    let stored = &committed.posts[&post.id];
    assert_eq!(stored.image.as_deref(), Some("b.png"));
    assert_eq!(stored.title, "T2");
}

#[tokio::test]
async fn update_without_upload_clears_image_and_removes_old() {
    let h = harness();
    let post = h.service.create(input("T"), Some(png("a.png"))).await.unwrap();

    h.service.update(&post.id, input("T"), None).await.unwrap();

    assert_eq!(h.store.committed().posts[&post.id].image, None);
    assert_eq!(h.files.removed(), vec!["a.png".to_string()]);
}

#[tokio::test]
async fn update_failure_rolls_back_and_removes_new_upload_only() {
    let h = harness();
    let post = h.service.create(input("T"), Some(png("a.png"))).await.unwrap();
    h.store.fail_on("update_post_category");

    let err = h
        .service
        .update(&post.id, input("T2"), Some(png("b.png")))
        .await
        .unwrap_err();

    assert!(matches!(err, PostError::Database(_)));
    assert_eq!(h.store.count("rollback"), 1);
    assert_eq!(h.files.removed(), vec!["b.png".to_string()]);
    let committed = h.store.committed();
    let stored = &committed.posts[&post.id];
    assert_eq!(stored.title, "T");
    assert_eq!(stored.image.as_deref(), Some("a.png"));
}

#[tokio::test]
async fn update_of_missing_post_is_not_found() {
    let h = harness();

    let err = h
        .service
        .update("nope", input("T"), Some(png("b.png")))
        .await
        .unwrap_err();

    assert!(matches!(err, PostError::NotFound { ref id } if id == "nope"));
    assert_eq!(h.store.count("rollback"), 1);
    assert_eq!(h.files.removed(), vec!["b.png".to_string()]);
}

#[tokio::test]
async fn delete_removes_row_then_image_once() {
    let h = harness();
    let post = h.service.create(input("T"), Some(png("a.png"))).await.unwrap();

    h.service.delete(&post.id).await.unwrap();

    assert!(h.store.committed().posts.is_empty());
    assert!(h.store.committed().links.is_empty());
    assert_eq!(h.files.removed(), vec!["a.png".to_string()]);
    assert!(h.service.find_by_id(&post.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn delete_failure_rolls_back_and_keeps_file() {
    let h = harness();
    let post = h.service.create(input("T"), Some(png("a.png"))).await.unwrap();
    h.store.fail_on("delete_post");

    let err = h.service.delete(&post.id).await.unwrap_err();

    assert!(matches!(err, PostError::Database(RepoError::Query(_))));
    assert_eq!(h.store.count("rollback"), 1);
    assert!(h.files.removed().is_empty());
    assert!(h.store.committed().posts.contains_key(&post.id));
}

#[tokio::test]
async fn delete_of_missing_post_is_not_found() {
    let h = harness();

    let err = h.service.delete("ghost").await.unwrap_err();

    assert!(matches!(err, PostError::NotFound { .. }));
    assert!(h.files.removed().is_empty());
}

#[tokio::test]
async fn create_update_delete_lifecycle() {
    let h = harness();

    let created = h.service.create(input("T"), Some(png("a.png"))).await.unwrap();
    assert_eq!(created.title, "T");
    assert_eq!(created.image.as_deref(), Some("a.png"));

    h.service
        .update(&created.id, input("T"), Some(png("b.png")))
        .await
        .unwrap();
    assert_eq!(h.files.removed(), vec!["a.png".to_string()]);
    let view = h.service.find_by_id(&created.id).await.unwrap();
    assert_eq!(view[0].cover_image.as_deref(), Some("b.png"));

    h.service.delete(&created.id).await.unwrap();
    assert_eq!(
        h.files.removed(),
        vec!["a.png".to_string(), "b.png".to_string()]
    );
    assert!(h.store.committed().posts.is_empty());
}
