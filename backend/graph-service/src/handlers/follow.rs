use crate::services::FollowService;
use actix_middleware::UserId;
use actix_web::{web, HttpResponse};
use error_types::ServiceError;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct FollowRequest {
    pub handle: String,
}

pub async fn follow(
    service: web::Data<FollowService>,
    user_id: UserId,
    req: web::Json<FollowRequest>,
) -> Result<HttpResponse, ServiceError> {
    let outcome = service.follow(user_id.0, &req.handle).await?;
    Ok(HttpResponse::Ok().json(outcome))
}

pub async fn unfollow(
    service: web::Data<FollowService>,
    user_id: UserId,
    req: web::Json<FollowRequest>,
) -> Result<HttpResponse, ServiceError> {
    let followee = service.unfollow(user_id.0, &req.handle).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "unfollowed": followee })))
}

pub async fn is_following(
    service: web::Data<FollowService>,
    user_id: UserId,
    handle: web::Path<String>,
) -> Result<HttpResponse, ServiceError> {
    let following = service.is_following(user_id.0, &handle).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "is_following": following })))
}

pub async fn follow_stats(
    service: web::Data<FollowService>,
    handle: web::Path<String>,
) -> Result<HttpResponse, ServiceError> {
    let stats = service.follow_stats(&handle).await?;
    Ok(HttpResponse::Ok().json(stats))
}
