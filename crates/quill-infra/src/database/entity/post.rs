//! Post entity for SeaORM.

use sea_orm::Set;
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "post")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub post_id: String,
    pub title: String,
    pub meta_title: String,
    pub slug: String,
    pub summary: String,
    #[sea_orm(column_type = "Text")]
    pub content: String,
    pub published: bool,
    pub published_at: DateTimeWithTimeZone,
    pub author_id: i32,
    pub image: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::author::Entity",
        from = "Column::AuthorId",
        to = "super::author::Column::Id",
        on_update = "Cascade",
        on_delete = "Restrict"
    )]
    Author,
    #[sea_orm(has_one = "super::post_category::Entity")]
    PostCategory,
}

impl Related<super::author::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Author.def()
    }
}

impl Related<super::post_category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PostCategory.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Conversion from SeaORM Model to Domain Post.
impl From<Model> for quill_core::domain::Post {
    fn from(model: Model) -> Self {
        Self {
            id: model.post_id,
            title: model.title,
            meta_title: model.meta_title,
            slug: model.slug,
            summary: model.summary,
            content: model.content,
            published: model.published,
            published_at: model.published_at.into(),
            author_id: model.author_id,
            image: model.image,
        }
    }
}

/// Conversion from Domain Post to SeaORM ActiveModel.
impl From<quill_core::domain::Post> for ActiveModel {
    fn from(post: quill_core::domain::Post) -> Self {
        Self {
            post_id: Set(post.id),
            title: Set(post.title),
            meta_title: Set(post.meta_title),
            slug: Set(post.slug),
            summary: Set(post.summary),
            content: Set(post.content),
            published: Set(post.published),
            published_at: Set(post.published_at.into()),
            author_id: Set(post.author_id),
            image: Set(post.image),
        }
    }
}
