/// HTTP handlers for the follow graph
pub mod follow;

use actix_web::{web, HttpResponse};

pub use follow::{follow, follow_stats, is_following, unfollow};

/// Route table shared by `main` and the integration tests.
pub fn configure(cfg: &mut web::ServiceConfig) {
    error_types::configure_extractors(cfg);
    cfg.route("/health", web::get().to(health)).service(
        web::scope("/api/v1")
            .route("/follow", web::post().to(follow))
            .route("/unfollow", web::delete().to(unfollow))
            .route("/isfollowing/{handle}", web::get().to(is_following))
            .route("/follow-stats/{handle}", web::get().to(follow_stats)),
    );
}

async fn health(service: web::Data<crate::FollowService>) -> HttpResponse {
    match service.health_check().await {
        Ok(()) => HttpResponse::Ok().json(serde_json::json!({ "status": "healthy" })),
        Err(e) => HttpResponse::ServiceUnavailable().json(serde_json::json!({
            "status": "unhealthy",
            "message": e.to_string(),
        })),
    }
}
