//! Trusted caller identity
//!
//! Authentication happens at the gateway, which forwards the verified account
//! id in `X-User-Id`. This middleware parses it once per request; handlers take
//! [`UserId`] as an argument to require it.

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error, HttpMessage,
};
use error_types::ServiceError;
use futures::future::{ready, Ready};
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use uuid::Uuid;

pub const USER_ID_HEADER: &str = "x-user-id";

/// Account id of the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserId(pub Uuid);

/// Parses `X-User-Id` into request extensions.
///
/// Requests without the header pass through untouched so public routes keep
/// working; a header that is present but malformed is rejected with 401.
pub struct CallerIdentityMiddleware;

impl<S, B> Transform<S, ServiceRequest> for CallerIdentityMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = CallerIdentityMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(CallerIdentityMiddlewareService {
            service: Rc::new(service),
        }))
    }
}

pub struct CallerIdentityMiddlewareService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for CallerIdentityMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();

        Box::pin(async move {
            if let Some(header) = req.headers().get(USER_ID_HEADER) {
                let user_id = header
                    .to_str()
                    .ok()
                    .and_then(|raw| Uuid::parse_str(raw.trim()).ok())
                    .ok_or_else(|| {
                        tracing::warn!(path = %req.path(), "Rejected malformed caller id header");
                        ServiceError::Unauthenticated("malformed X-User-Id header".into())
                    })?;

                req.extensions_mut().insert(UserId(user_id));
            }

            service.call(req).await
        })
    }
}

impl actix_web::FromRequest for UserId {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(
        req: &actix_web::HttpRequest,
        _payload: &mut actix_web::dev::Payload,
    ) -> Self::Future {
        match req.extensions().get::<UserId>() {
            Some(user_id) => ready(Ok(*user_id)),
            None => ready(Err(ServiceError::Unauthenticated(
                "missing X-User-Id header".into(),
            )
            .into())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{http::StatusCode, test, web, App, HttpResponse};

    async fn whoami(user: UserId) -> HttpResponse {
        HttpResponse::Ok().body(user.0.to_string())
    }

    async fn public() -> HttpResponse {
        HttpResponse::Ok().finish()
    }

    #[actix_rt::test]
    async fn test_valid_header_is_extracted() {
        let app = test::init_service(
            App::new()
                .wrap(CallerIdentityMiddleware)
                .route("/me", web::get().to(whoami)),
        )
        .await;

        let id = Uuid::new_v4();
        let req = test::TestRequest::get()
            .uri("/me")
            .insert_header((USER_ID_HEADER, id.to_string()))
            .to_request();
        let body = test::call_and_read_body(&app, req).await;
        assert_eq!(body, id.to_string());
    }

    #[actix_rt::test]
    async fn test_missing_header_is_unauthorized() {
        let app = test::init_service(
            App::new()
                .wrap(CallerIdentityMiddleware)
                .route("/me", web::get().to(whoami))
                .route("/public", web::get().to(public)),
        )
        .await;

        let req = test::TestRequest::get().uri("/me").to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

        let req = test::TestRequest::get().uri("/public").to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[actix_rt::test]
    async fn test_malformed_header_is_rejected() {
        let app = test::init_service(
            App::new()
                .wrap(CallerIdentityMiddleware)
                .route("/public", web::get().to(public)),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/public")
            .insert_header((USER_ID_HEADER, "not-a-uuid"))
            .to_request();
        let res = test::try_call_service(&app, req).await;
        let status = match res {
            Ok(res) => res.status(),
            Err(err) => err.as_response_error().status_code(),
        };
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}
