use actix_middleware::{CallerIdentityMiddleware, USER_ID_HEADER};
use actix_web::{http::StatusCode, test, web, App};
use graph_service::{handlers, FollowService, InMemoryFollowGraphStore};
use identity_client::{Identity, InMemoryIdentityDirectory};
use serde_json::{json, Value};
use std::sync::Arc;

async fn seeded() -> (web::Data<FollowService>, Identity, Identity) {
    let directory = InMemoryIdentityDirectory::new();
    let alice = directory.register("alice", "Alice").await.unwrap();
    let bob = directory.register("bob", "Bob").await.unwrap();
    let service = FollowService::new(
        Arc::new(InMemoryFollowGraphStore::new()),
        Arc::new(directory),
    );
    (web::Data::new(service), alice, bob)
}

macro_rules! app {
    ($service:expr) => {
        test::init_service(
            App::new()
                .app_data($service.clone())
                .wrap(CallerIdentityMiddleware)
                .configure(handlers::configure),
        )
        .await
    };
}

#[actix_rt::test]
async fn follow_flow_over_http() {
    let (service, alice, bob) = seeded().await;
    let app = app!(service);

    let req = test::TestRequest::post()
        .uri("/api/v1/follow")
        .insert_header((USER_ID_HEADER, alice.id.to_string()))
        .set_json(json!({ "handle": "bob" }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["already_following"], false);
    assert_eq!(body["followee"]["id"], bob.id.to_string());

    let req = test::TestRequest::post()
        .uri("/api/v1/follow")
        .insert_header((USER_ID_HEADER, alice.id.to_string()))
        .set_json(json!({ "handle": "bob" }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["already_following"], true);

    let req = test::TestRequest::get()
        .uri("/api/v1/isfollowing/bob")
        .insert_header((USER_ID_HEADER, alice.id.to_string()))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["is_following"], true);

    let req = test::TestRequest::get()
        .uri("/api/v1/follow-stats/bob")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["followers"], 1);
    assert_eq!(body["following"], 0);

    let req = test::TestRequest::delete()
        .uri("/api/v1/unfollow")
        .insert_header((USER_ID_HEADER, alice.id.to_string()))
        .set_json(json!({ "handle": "bob" }))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::OK);

    let req = test::TestRequest::delete()
        .uri("/api/v1/unfollow")
        .insert_header((USER_ID_HEADER, alice.id.to_string()))
        .set_json(json!({ "handle": "bob" }))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[actix_rt::test]
async fn self_follow_is_a_validation_error() {
    let (service, alice, _) = seeded().await;
    let app = app!(service);

    let req = test::TestRequest::post()
        .uri("/api/v1/follow")
        .insert_header((USER_ID_HEADER, alice.id.to_string()))
        .set_json(json!({ "handle": "alice" }))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["error_type"], "validation_error");
    assert_eq!(body["retryable"], false);
}

#[actix_rt::test]
async fn follow_requires_caller_identity() {
    let (service, _, _) = seeded().await;
    let app = app!(service);

    let req = test::TestRequest::post()
        .uri("/api/v1/follow")
        .set_json(json!({ "handle": "bob" }))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[actix_rt::test]
async fn health_reports_healthy() {
    let (service, _, _) = seeded().await;
    let app = app!(service);

    let req = test::TestRequest::get().uri("/health").to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::OK);
}

#[actix_rt::test]
async fn follow_without_handle_field_is_a_validation_error() {
    let (service, alice, _) = seeded().await;
    let app = app!(service);

    let req = test::TestRequest::post()
        .uri("/api/v1/follow")
        .insert_header((USER_ID_HEADER, alice.id.to_string()))
        .set_json(json!({ "user": "bob" }))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["error_type"], "validation_error");
}
