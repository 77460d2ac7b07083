//! SeaORM entities mirroring the tables created by `quill-migration`.

pub mod author;
pub mod category;
pub mod post;
pub mod post_category;
