//! Post endpoints - multipart create/update, cached reads, delete.

use std::str::FromStr;

use actix_multipart::{Field, Multipart};
use actix_web::{HttpResponse, web};
use futures::TryStreamExt;
use quill_core::domain::{ImageUpload, PostInput, UploadError};
use quill_core::error::PostError;
use quill_shared::PostForm;
use quill_shared::dto::{IMAGE_FIELD, parse_flag};

use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

/// Largest accepted text field.
const MAX_TEXT_FIELD_BYTES: usize = 1024 * 1024;

/// A post form as received: raw text fields plus the optional cover image.
struct Submission {
    form: PostForm,
    image: Option<ImageUpload>,
}

async fn read_submission(mut payload: Multipart, max_image_bytes: usize) -> AppResult<Submission> {
    let mut form = PostForm::default();
    let mut image = None;

    while let Some(mut field) = payload.try_next().await? {
        let name = field.name().unwrap_or_default().to_owned();

        if name == IMAGE_FIELD {
            let file_name = field
                .content_disposition()
                .and_then(|cd| cd.get_filename())
                .unwrap_or_default()
                .to_owned();
            let content_type = field.content_type().map(|mime| mime.essence_str().to_owned());
            let bytes = collect(&mut field, max_image_bytes, |size| {
                PostError::from(UploadError::TooLarge {
                    size,
                    limit: max_image_bytes,
                })
                .into()
            })
            .await?;

            // Browsers send an empty, unnamed part when no file was chosen.
            if file_name.is_empty() && bytes.is_empty() {
                continue;
            }
            image = Some(ImageUpload::new(file_name, content_type, bytes));
            continue;
        }

        let bytes = collect(&mut field, MAX_TEXT_FIELD_BYTES, |_| {
            PostError::Validation(format!("{name} is too long")).into()
        })
        .await?;
        let value = String::from_utf8(bytes)
            .map_err(|_| PostError::Validation(format!("{name} is not valid UTF-8")))?;

        if !form.set(&name, value) {
            tracing::debug!(field = %name, "Ignoring unknown form field");
        }
    }

    Ok(Submission { form, image })
}

/// Read a whole field, failing once more than `limit` bytes arrive.
async fn collect(
    field: &mut Field,
    limit: usize,
    too_large: impl FnOnce(usize) -> AppError,
) -> AppResult<Vec<u8>> {
    let mut bytes = Vec::new();
    while let Some(chunk) = field.try_next().await? {
        if bytes.len() + chunk.len() > limit {
            return Err(too_large(bytes.len() + chunk.len()));
        }
        bytes.extend_from_slice(&chunk);
    }
    Ok(bytes)
}

/// Turn raw form fields into a typed post input, reporting every bad field.
fn parse_post_form(form: PostForm) -> Result<PostInput, PostError> {
    let mut errors = Vec::new();

    let title = required(form.post_title, "post_title", &mut errors);
    let meta_title = required(form.post_meta_title, "post_meta_title", &mut errors);
    let slug = required(form.post_slug, "post_slug", &mut errors);
    let summary = required(form.post_summary, "post_summary", &mut errors);
    let content = required(form.post_content, "post_content", &mut errors);

    let published = required(form.post_published, "post_published", &mut errors)
        .and_then(|raw| {
            let flag = parse_flag(&raw);
            if flag.is_none() {
                errors.push("post_published must be true or false".to_string());
            }
            flag
        });
    let author_id: Option<i32> = integer(form.author_id, "author_id", &mut errors);
    let category_id: Option<i32> = integer(form.category_id, "category_id", &mut errors);

    match (title, meta_title, slug, summary, content, published, author_id, category_id) {
        (
            Some(title),
            Some(meta_title),
            Some(slug),
            Some(summary),
            Some(content),
            Some(published),
            Some(author_id),
            Some(category_id),
        ) if errors.is_empty() => Ok(PostInput {
            title,
            meta_title,
            slug,
            summary,
            content,
            published,
            author_id,
            category_id,
        }),
        _ => Err(PostError::Validation(errors.join("; "))),
    }
}

fn required(value: Option<String>, name: &str, errors: &mut Vec<String>) -> Option<String> {
    if value.is_none() {
        errors.push(format!("{name} is required"));
    }
    value
}

fn integer<T: FromStr>(value: Option<String>, name: &str, errors: &mut Vec<String>) -> Option<T> {
    let raw = required(value, name, errors)?;
    let parsed = raw.trim().parse().ok();
    if parsed.is_none() {
        errors.push(format!("{name} must be an integer"));
    }
    parsed
}

/// POST /upload
pub async fn create_post(state: web::Data<AppState>, payload: Multipart) -> AppResult<HttpResponse> {
    let submission = read_submission(payload, state.upload_max_bytes).await?;
    let input = parse_post_form(submission.form)?;

    let post = state.posts.create(input, submission.image).await?;
    Ok(HttpResponse::Ok().json(post))
}

/// GET /posts
pub async fn list_posts(state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let posts = state.posts.list().await?;
    Ok(HttpResponse::Ok().json(posts))
}

/// GET /post/{id}
pub async fn get_post(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let views = state.posts.find_by_id(&path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(views))
}

/// GET /posts/category/{category}
pub async fn posts_by_category(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let posts = state.posts.find_by_category(&path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(posts))
}

/// GET /posts/author/{author}
pub async fn posts_by_author(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let posts = state.posts.find_by_author(&path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(posts))
}

/// PUT /post/{id}
pub async fn update_post(
    state: web::Data<AppState>,
    path: web::Path<String>,
    payload: Multipart,
) -> AppResult<HttpResponse> {
    let submission = read_submission(payload, state.upload_max_bytes).await?;
    let input = parse_post_form(submission.form)?;

    state
        .posts
        .update(&path.into_inner(), input, submission.image)
        .await?;
    Ok(HttpResponse::Ok().json("post updated"))
}

/// DELETE /post/{id}
pub async fn delete_post(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    state.posts.delete(&path.into_inner()).await?;
    Ok(HttpResponse::Ok().json("post deleted"))
}
