use crate::state::AppState;
use actix_middleware::UserId;
use actix_web::{web, HttpResponse};
use db_pool::PageQuery;
use error_types::ServiceError;
use s3_utils::{MediaInput, MediaUpload};
use serde::Deserialize;

const DEFAULT_HISTORY_PAGE: i64 = 1;
const DEFAULT_HISTORY_LIMIT: i64 = 20;

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub text: Option<String>,
    /// Reference to an image that is already stored
    pub image_ref: Option<String>,
    /// Inline image to upload
    pub upload: Option<MediaUpload>,
}

pub async fn send_message(
    state: web::Data<AppState>,
    user_id: UserId,
    handle: web::Path<String>,
    req: web::Json<SendMessageRequest>,
) -> Result<HttpResponse, ServiceError> {
    let req = req.into_inner();
    let image = MediaInput::from_parts(req.image_ref, req.upload);
    let message = state
        .conversations
        .append_message(user_id.0, &handle, req.text, image)
        .await?;
    Ok(HttpResponse::Created().json(message))
}

pub async fn list_peers(
    state: web::Data<AppState>,
    user_id: UserId,
) -> Result<HttpResponse, ServiceError> {
    let peers = state.conversations.list_peers(user_id.0).await?;
    Ok(HttpResponse::Ok().json(peers))
}

pub async fn get_history(
    state: web::Data<AppState>,
    user_id: UserId,
    handle: web::Path<String>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse, ServiceError> {
    let page = query.resolve(DEFAULT_HISTORY_PAGE, DEFAULT_HISTORY_LIMIT)?;
    let messages = state
        .conversations
        .get_history(user_id.0, &handle, page)
        .await?;
    Ok(HttpResponse::Ok().json(messages))
}

pub async fn list_last_messages(
    state: web::Data<AppState>,
    user_id: UserId,
) -> Result<HttpResponse, ServiceError> {
    let inbox = state
        .conversations
        .list_peers_with_last_message(user_id.0)
        .await?;
    Ok(HttpResponse::Ok().json(inbox))
}
