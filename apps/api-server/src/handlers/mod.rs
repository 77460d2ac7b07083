//! HTTP handlers and route configuration.

mod health;
mod posts;

use actix_web::web;

/// Configure all application routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health::health_check))
        .route("/upload", web::post().to(posts::create_post))
        .route("/posts", web::get().to(posts::list_posts))
        .route("/posts/category/{category}", web::get().to(posts::posts_by_category))
        .route("/posts/author/{author}", web::get().to(posts::posts_by_author))
        .service(
            web::resource("/post/{id}")
                .route(web::get().to(posts::get_post))
                .route(web::put().to(posts::update_post))
                .route(web::delete().to(posts::delete_post)),
        );
}
