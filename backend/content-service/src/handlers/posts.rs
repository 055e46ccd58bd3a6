/// Post handlers - HTTP endpoints for the post root, likes, feed and profiles
use crate::services::{FeedAssembler, PostService};
use actix_middleware::UserId;
use actix_web::{web, HttpResponse};
use error_types::ServiceError;
use s3_utils::{MediaInput, MediaUpload};
use serde::Deserialize;
use uuid::Uuid;

type HandlerResult = Result<HttpResponse, ServiceError>;

#[derive(Debug, Deserialize)]
pub struct CreatePostRequest {
    pub caption: Option<String>,
    /// Reference to media that is already stored
    pub media_ref: Option<String>,
    /// Inline media to upload
    pub upload: Option<MediaUpload>,
}

/// Create a new post
pub async fn create_post(
    service: web::Data<PostService>,
    user_id: UserId,
    req: web::Json<CreatePostRequest>,
) -> HandlerResult {
    let req = req.into_inner();
    let media = MediaInput::from_parts(req.media_ref, req.upload);
    let post = service.create_post(user_id.0, req.caption, media).await?;
    Ok(HttpResponse::Created().json(post))
}

pub async fn get_post(service: web::Data<PostService>, post_id: web::Path<Uuid>) -> HandlerResult {
    let post = service.get_post(post_id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(post))
}

pub async fn toggle_like(
    service: web::Data<PostService>,
    user_id: UserId,
    post_id: web::Path<Uuid>,
) -> HandlerResult {
    let toggle = service.toggle_like(post_id.into_inner(), user_id.0).await?;
    Ok(HttpResponse::Ok().json(toggle))
}

pub async fn get_likes(service: web::Data<PostService>, post_id: web::Path<Uuid>) -> HandlerResult {
    let likers = service.get_post_likes(post_id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(likers))
}

/// Posts from everyone the caller follows plus their own, newest first
pub async fn get_feed(feed: web::Data<FeedAssembler>, user_id: UserId) -> HandlerResult {
    let posts = feed.build_feed(user_id.0).await?;
    Ok(HttpResponse::Ok().json(posts))
}

pub async fn get_profile_posts(
    service: web::Data<PostService>,
    handle: web::Path<String>,
) -> HandlerResult {
    let posts = service.get_profile_posts(&handle).await?;
    Ok(HttpResponse::Ok().json(posts))
}
