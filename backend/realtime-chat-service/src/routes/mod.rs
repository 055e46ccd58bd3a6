pub mod messages;
pub mod wsroute;

use crate::state::AppState;
use actix_web::{web, HttpResponse};

/// Route table shared by `main` and the integration tests.
pub fn configure(cfg: &mut web::ServiceConfig) {
    error_types::configure_extractors(cfg);
    cfg.route("/health", web::get().to(health))
        .service(wsroute::ws_handler)
        .service(
            web::scope("/api/v1/message")
                .route("/send/{handle}", web::post().to(messages::send_message))
                .route("/peers", web::get().to(messages::list_peers))
                .route("/history/{handle}", web::get().to(messages::get_history))
                .route("/last", web::get().to(messages::list_last_messages)),
        );
}

async fn health(state: web::Data<AppState>) -> HttpResponse {
    match state.conversations.health_check().await {
        Ok(()) => HttpResponse::Ok().json(serde_json::json!({ "status": "healthy" })),
        Err(e) => HttpResponse::ServiceUnavailable().json(serde_json::json!({
            "status": "unhealthy",
            "message": e.to_string(),
        })),
    }
}
