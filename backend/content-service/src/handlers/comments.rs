/// Comment and reply handlers
use crate::services::PostService;
use actix_middleware::UserId;
use actix_web::{web, HttpResponse};
use db_pool::PageQuery;
use error_types::ServiceError;
use serde::Deserialize;
use uuid::Uuid;

type HandlerResult = Result<HttpResponse, ServiceError>;

const DEFAULT_REPLIES_PAGE: i64 = 1;
const DEFAULT_REPLIES_LIMIT: i64 = 3;

#[derive(Debug, Deserialize)]
pub struct TextRequest {
    pub text: String,
}

pub async fn add_comment(
    service: web::Data<PostService>,
    user_id: UserId,
    post_id: web::Path<Uuid>,
    req: web::Json<TextRequest>,
) -> HandlerResult {
    let comment = service
        .add_comment(post_id.into_inner(), user_id.0, &req.text)
        .await?;
    Ok(HttpResponse::Created().json(comment))
}

pub async fn delete_comment(
    service: web::Data<PostService>,
    user_id: UserId,
    path: web::Path<(Uuid, Uuid)>,
) -> HandlerResult {
    let (post_id, comment_id) = path.into_inner();
    service.delete_comment(post_id, comment_id, user_id.0).await?;
    Ok(HttpResponse::NoContent().finish())
}

pub async fn toggle_comment_like(
    service: web::Data<PostService>,
    user_id: UserId,
    path: web::Path<(Uuid, Uuid)>,
) -> HandlerResult {
    let (post_id, comment_id) = path.into_inner();
    let toggle = service
        .toggle_comment_like(post_id, comment_id, user_id.0)
        .await?;
    Ok(HttpResponse::Ok().json(toggle))
}

pub async fn get_comment_likes(
    service: web::Data<PostService>,
    path: web::Path<(Uuid, Uuid)>,
) -> HandlerResult {
    let (post_id, comment_id) = path.into_inner();
    let likers = service.get_comment_likes(post_id, comment_id).await?;
    Ok(HttpResponse::Ok().json(likers))
}

pub async fn add_reply(
    service: web::Data<PostService>,
    user_id: UserId,
    path: web::Path<(Uuid, Uuid)>,
    req: web::Json<TextRequest>,
) -> HandlerResult {
    let (post_id, comment_id) = path.into_inner();
    let reply = service
        .add_reply(post_id, comment_id, user_id.0, &req.text)
        .await?;
    Ok(HttpResponse::Created().json(reply))
}

pub async fn get_replies(
    service: web::Data<PostService>,
    path: web::Path<(Uuid, Uuid)>,
    query: web::Query<PageQuery>,
) -> HandlerResult {
    let (post_id, comment_id) = path.into_inner();
    let page = query.resolve(DEFAULT_REPLIES_PAGE, DEFAULT_REPLIES_LIMIT)?;
    let replies = service.get_replies_page(post_id, comment_id, page).await?;
    Ok(HttpResponse::Ok().json(replies))
}

pub async fn delete_reply(
    service: web::Data<PostService>,
    user_id: UserId,
    path: web::Path<(Uuid, Uuid, Uuid)>,
) -> HandlerResult {
    let (post_id, comment_id, reply_id) = path.into_inner();
    service
        .delete_reply(post_id, comment_id, reply_id, user_id.0)
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

pub async fn toggle_reply_like(
    service: web::Data<PostService>,
    user_id: UserId,
    path: web::Path<(Uuid, Uuid, Uuid)>,
) -> HandlerResult {
    let (post_id, comment_id, reply_id) = path.into_inner();
    let toggle = service
        .toggle_reply_like(post_id, comment_id, reply_id, user_id.0)
        .await?;
    Ok(HttpResponse::Ok().json(toggle))
}

pub async fn get_reply_likes(
    service: web::Data<PostService>,
    path: web::Path<(Uuid, Uuid, Uuid)>,
) -> HandlerResult {
    let (post_id, comment_id, reply_id) = path.into_inner();
    let likers = service
        .get_reply_likes(post_id, comment_id, reply_id)
        .await?;
    Ok(HttpResponse::Ok().json(likers))
}
