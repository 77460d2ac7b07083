//! PostgreSQL post store on SeaORM transactions.

use async_trait::async_trait;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ActiveValue, ColumnTrait, DatabaseTransaction, DbBackend, DbConn, DbErr,
    EntityTrait, FromQueryResult, QueryFilter, QueryOrder, Set, SqlErr, Statement,
    TransactionTrait,
};

use quill_core::domain::{Post, PostDetail, PostInput, PostView};
use quill_core::error::RepoError;
use quill_core::ports::{PostStore, PostTransaction};

use super::entity::{post, post_category};
use super::queries;

/// Post store over a SeaORM connection pool.
pub struct PostgresPostStore {
    db: DbConn,
}

impl PostgresPostStore {
    pub fn new(db: DbConn) -> Self {
        Self { db }
    }
}

#[async_trait]
impl PostStore for PostgresPostStore {
    async fn begin(&self) -> Result<Box<dyn PostTransaction>, RepoError> {
        let txn = self.db.begin().await.map_err(repo_error)?;
        Ok(Box::new(PostgresTransaction { txn }))
    }
}

/// An open database transaction. Dropping it rolls back.
pub struct PostgresTransaction {
    txn: DatabaseTransaction,
}

#[derive(Debug, FromQueryResult)]
struct PostViewRow {
    post_id: String,
    title: String,
    meta_title: String,
    summary: String,
    slug: String,
    content: String,
    published: bool,
    published_at: DateTimeWithTimeZone,
    coverimg: Option<String>,
    author: String,
    category: String,
}

impl From<PostViewRow> for PostView {
    fn from(row: PostViewRow) -> Self {
        Self {
            post_id: row.post_id,
            title: row.title,
            meta_title: row.meta_title,
            summary: row.summary,
            slug: row.slug,
            content: row.content,
            published: row.published,
            published_at: row.published_at.into(),
            cover_image: row.coverimg,
            author: row.author,
            category: row.category,
        }
    }
}

#[derive(Debug, FromQueryResult)]
struct PostDetailRow {
    post_id: String,
    title: String,
    meta_title: String,
    slug: String,
    summary: String,
    content: String,
    published: bool,
    published_at: DateTimeWithTimeZone,
    author_id: i32,
    image: Option<String>,
    author_username: String,
    category_id: i32,
    category_title: String,
}

impl From<PostDetailRow> for PostDetail {
    fn from(row: PostDetailRow) -> Self {
        Self {
            post: Post {
                id: row.post_id,
                title: row.title,
                meta_title: row.meta_title,
                slug: row.slug,
                summary: row.summary,
                content: row.content,
                published: row.published,
                published_at: row.published_at.into(),
                author_id: row.author_id,
                image: row.image,
            },
            author_username: row.author_username,
            category_id: row.category_id,
            category_title: row.category_title,
        }
    }
}

impl PostgresTransaction {
    async fn details(&self, sql: &str, filter: &str) -> Result<Vec<PostDetail>, RepoError> {
        let stmt = Statement::from_sql_and_values(DbBackend::Postgres, sql, [filter.into()]);
        let rows = PostDetailRow::find_by_statement(stmt)
            .all(&self.txn)
            .await
            .map_err(repo_error)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }
}

#[async_trait]
impl PostTransaction for PostgresTransaction {
    async fn insert_post(&mut self, post: &Post) -> Result<Post, RepoError> {
        let model = post::ActiveModel::from(post.clone())
            .insert(&self.txn)
            .await
            .map_err(repo_error)?;
        Ok(model.into())
    }

    async fn insert_post_category(
        &mut self,
        post_id: &str,
        category_id: i32,
    ) -> Result<(), RepoError> {
        post_category::ActiveModel {
            post_id: Set(post_id.to_owned()),
            category_id: Set(category_id),
        }
        .insert(&self.txn)
        .await
        .map_err(repo_error)?;
        Ok(())
    }

    async fn find_image(&mut self, post_id: &str) -> Result<Option<String>, RepoError> {
        post::Entity::find_by_id(post_id.to_owned())
            .one(&self.txn)
            .await
            .map_err(repo_error)?
            .map(|model| model.image)
            .ok_or(RepoError::NotFound)
    }

    async fn update_post(
        &mut self,
        post_id: &str,
        input: &PostInput,
        image: Option<&str>,
    ) -> Result<(), RepoError> {
        let model = post::ActiveModel {
            post_id: ActiveValue::Unchanged(post_id.to_owned()),
            title: Set(input.title.clone()),
            meta_title: Set(input.meta_title.clone()),
            slug: Set(input.slug.clone()),
            summary: Set(input.summary.clone()),
            content: Set(input.content.clone()),
            published: Set(input.published),
            author_id: Set(input.author_id),
            image: Set(image.map(str::to_owned)),
            ..Default::default()
        };
        model.update(&self.txn).await.map_err(repo_error)?;
        Ok(())
    }

    async fn update_post_category(
        &mut self,
        post_id: &str,
        category_id: i32,
    ) -> Result<(), RepoError> {
        post_category::Entity::update_many()
            .col_expr(post_category::Column::CategoryId, Expr::value(category_id))
            .filter(post_category::Column::PostId.eq(post_id))
            .exec(&self.txn)
            .await
            .map_err(repo_error)?;
        Ok(())
    }

    async fn delete_post(&mut self, post_id: &str) -> Result<(), RepoError> {
        let result = post::Entity::delete_by_id(post_id.to_owned())
            .exec(&self.txn)
            .await
            .map_err(repo_error)?;

        if result.rows_affected == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }

    async fn list_posts(&mut self) -> Result<Vec<Post>, RepoError> {
        let models = post::Entity::find()
            .order_by_asc(post::Column::PostId)
            .all(&self.txn)
            .await
            .map_err(repo_error)?;
        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn find_post_view(&mut self, post_id: &str) -> Result<Vec<PostView>, RepoError> {
        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            queries::POST_VIEW_BY_ID,
            [post_id.into()],
        );
        let rows = PostViewRow::find_by_statement(stmt)
            .all(&self.txn)
            .await
            .map_err(repo_error)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn find_by_category(
        &mut self,
        category_title: &str,
    ) -> Result<Vec<PostDetail>, RepoError> {
        self.details(queries::POSTS_BY_CATEGORY_TITLE, category_title)
            .await
    }

    async fn find_by_author(&mut self, username: &str) -> Result<Vec<PostDetail>, RepoError> {
        self.details(queries::POSTS_BY_AUTHOR_USERNAME, username)
            .await
    }

    async fn commit(self: Box<Self>) -> Result<(), RepoError> {
        let Self { txn } = *self;
        txn.commit().await.map_err(repo_error)
    }

    async fn rollback(self: Box<Self>) -> Result<(), RepoError> {
        let Self { txn } = *self;
        txn.rollback().await.map_err(repo_error)
    }
}

fn repo_error(err: DbErr) -> RepoError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(msg)) => return RepoError::Constraint(msg),
        Some(SqlErr::ForeignKeyConstraintViolation(msg)) => return RepoError::Constraint(msg),
        _ => {}
    }

    match err {
        DbErr::RecordNotFound(_) | DbErr::RecordNotUpdated => RepoError::NotFound,
        DbErr::Conn(e) => RepoError::Connection(e.to_string()),
        other => RepoError::Query(other.to_string()),
    }
}
