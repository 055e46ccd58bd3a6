/// HTTP handlers for content-service
///
/// - Posts: create, read, like, feed and profile listings
/// - Comments: comments and replies nested under a post
pub mod comments;
pub mod posts;

use crate::services::PostService;
use actix_web::{web, HttpResponse};

pub use comments::{
    add_comment, add_reply, delete_comment, delete_reply, get_comment_likes, get_replies,
    get_reply_likes, toggle_comment_like, toggle_reply_like,
};
pub use posts::{create_post, get_feed, get_likes, get_post, get_profile_posts, toggle_like};

/// Route table shared by `main` and the integration tests.
pub fn configure(cfg: &mut web::ServiceConfig) {
    error_types::configure_extractors(cfg);
    cfg.route("/health", web::get().to(health)).service(
        web::scope("/api/v1")
            .route("/profile/{handle}/posts", web::get().to(get_profile_posts))
            .service(
                web::scope("/post")
                    .route("/create", web::post().to(create_post))
                    .route("/feed", web::get().to(get_feed))
                    .route("/{post_id}", web::get().to(get_post))
                    .route("/{post_id}/like", web::patch().to(toggle_like))
                    .route("/{post_id}/likes", web::get().to(get_likes))
                    .route("/{post_id}/comment", web::post().to(add_comment))
                    .route(
                        "/{post_id}/comment/{comment_id}",
                        web::delete().to(delete_comment),
                    )
                    .route(
                        "/{post_id}/comment/{comment_id}/like",
                        web::patch().to(toggle_comment_like),
                    )
                    .route(
                        "/{post_id}/comment/{comment_id}/likes",
                        web::get().to(get_comment_likes),
                    )
                    .service(
                        web::resource("/{post_id}/comment/{comment_id}/replies")
                            .route(web::post().to(add_reply))
                            .route(web::get().to(get_replies)),
                    )
                    .route(
                        "/{post_id}/comment/{comment_id}/replies/{reply_id}",
                        web::delete().to(delete_reply),
                    )
                    .route(
                        "/{post_id}/comment/{comment_id}/replies/{reply_id}/like",
                        web::patch().to(toggle_reply_like),
                    )
                    .route(
                        "/{post_id}/comment/{comment_id}/replies/{reply_id}/likes",
                        web::get().to(get_reply_likes),
                    ),
            ),
    );
}

async fn health(service: web::Data<PostService>) -> HttpResponse {
    match service.health_check().await {
        Ok(()) => HttpResponse::Ok().json(serde_json::json!({ "status": "healthy" })),
        Err(e) => HttpResponse::ServiceUnavailable().json(serde_json::json!({
            "status": "unhealthy",
            "message": e.to_string(),
        })),
    }
}
