//! Raw SQL for the joined read models.

/// One post with author username and category title inlined.
pub const POST_VIEW_BY_ID: &str = r#"
SELECT po.post_id, po.title, po.meta_title, po.summary, po.slug, po.content,
       po.published, po.published_at, po.image AS coverimg,
       ar.username AS author, cat.title AS category
FROM post po
JOIN authors ar ON po.author_id = ar.id
JOIN post_category pc ON pc.post_id = po.post_id
JOIN category cat ON cat.id = pc.category_id
WHERE po.post_id = $1
"#;

/// Posts in a category, filtered by the category title.
pub const POSTS_BY_CATEGORY_TITLE: &str = r#"
SELECT po.post_id, po.title, po.meta_title, po.slug, po.summary, po.content,
       po.published, po.published_at, po.author_id, po.image,
       ar.username AS author_username, cat.id AS category_id, cat.title AS category_title
FROM post po
JOIN authors ar ON po.author_id = ar.id
JOIN post_category pc ON pc.post_id = po.post_id
JOIN category cat ON cat.id = pc.category_id
WHERE cat.title = $1
ORDER BY po.post_id
"#;

/// Posts by an author, filtered by username.
pub const POSTS_BY_AUTHOR_USERNAME: &str = r#"
SELECT po.post_id, po.title, po.meta_title, po.slug, po.summary, po.content,
       po.published, po.published_at, po.author_id, po.image,
       ar.username AS author_username, cat.id AS category_id, cat.title AS category_title
FROM post po
JOIN authors ar ON po.author_id = ar.id
JOIN post_category pc ON pc.post_id = po.post_id
JOIN category cat ON cat.id = pc.category_id
WHERE ar.username = $1
ORDER BY po.post_id
"#;
