use actix_web::{http::StatusCode, web, HttpResponse, ResponseError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Service-level error shared by every backend service.
///
/// Each variant is one failure kind; the HTTP status, stable code and retry
/// flag are derived from the kind alone.
///
/// ```ignore
/// let post = store.find(post_id).await?
///     .ok_or_else(|| ServiceError::NotFound(format!("post {post_id}")))?;
/// ```
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ServiceError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Not authorized: {0}")]
    Authorization(String),

    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    #[error("Dependency failure: {0}")]
    Dependency(String),

    #[error("Conflict: {0}")]
    Conflict(String),
}

pub type Result<T> = std::result::Result<T, ServiceError>;

impl ServiceError {
    pub fn status_code(&self) -> u16 {
        match self {
            ServiceError::Validation(_) => 400,
            ServiceError::Unauthenticated(_) => 401,
            ServiceError::Authorization(_) => 403,
            ServiceError::NotFound(_) => 404,
            ServiceError::Conflict(_) => 409,
            ServiceError::Dependency(_) => 503,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            ServiceError::Validation(_) => error_codes::VALIDATION_ERROR,
            ServiceError::NotFound(_) => error_codes::NOT_FOUND,
            ServiceError::Authorization(_) => error_codes::FORBIDDEN,
            ServiceError::Unauthenticated(_) => error_codes::UNAUTHENTICATED,
            ServiceError::Dependency(_) => error_codes::DEPENDENCY_UNAVAILABLE,
            ServiceError::Conflict(_) => error_codes::CONFLICT,
        }
    }

    pub fn error_type(&self) -> &'static str {
        match self {
            ServiceError::Validation(_) => error_types::VALIDATION_ERROR,
            ServiceError::NotFound(_) => error_types::NOT_FOUND_ERROR,
            ServiceError::Authorization(_) => error_types::AUTHORIZATION_ERROR,
            ServiceError::Unauthenticated(_) => error_types::AUTHENTICATION_ERROR,
            ServiceError::Dependency(_) => error_types::DEPENDENCY_ERROR,
            ServiceError::Conflict(_) => error_types::CONFLICT_ERROR,
        }
    }

    /// Only dependency failures are worth retrying unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ServiceError::Dependency(_))
    }

    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            error: self.error_type().to_string(),
            message: self.to_string(),
            status: self.status_code(),
            error_type: self.error_type().to_string(),
            code: self.error_code().to_string(),
            retryable: self.is_retryable(),
            details: None,
            trace_id: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

impl ResponseError for ServiceError {
    fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(ServiceError::status_code(self))
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(ResponseError::status_code(self)).json(self.to_response())
    }
}

impl From<sqlx::Error> for ServiceError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => ServiceError::NotFound("row not found".to_string()),
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                ServiceError::Conflict(db_err.message().to_string())
            }
            _ => ServiceError::Dependency(format!("database: {err}")),
        }
    }
}

impl From<resilience::TimeoutError> for ServiceError {
    fn from(err: resilience::TimeoutError) -> Self {
        ServiceError::Dependency(err.to_string())
    }
}

impl From<serde_json::Error> for ServiceError {
    fn from(err: serde_json::Error) -> Self {
        ServiceError::Dependency(format!("stored document is malformed: {err}"))
    }
}

/// Uniform error body returned by every service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error name, mirrors `error_type`
    pub error: String,

    /// Human-readable message
    pub message: String,

    /// HTTP status code
    pub status: u16,

    /// Failure kind, one of the [`error_types`] constants
    pub error_type: String,

    /// Stable machine code, one of the [`error_codes`] constants
    pub code: String,

    /// Whether repeating the same request may succeed
    pub retryable: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,

    /// Correlation id of the failed request
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,

    /// RFC 3339 timestamp
    pub timestamp: String,
}

impl ErrorResponse {
    pub fn with_details(mut self, details: String) -> Self {
        self.details = Some(details);
        self
    }

    pub fn with_trace_id(mut self, trace_id: String) -> Self {
        self.trace_id = Some(trace_id);
        self
    }
}

/// Install path, query and JSON extractor configs whose rejections are
/// [`ServiceError::Validation`], so malformed ids and bodies get the same
/// body as every other failure.
pub fn configure_extractors(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::PathConfig::default().error_handler(|err, _req| {
        ServiceError::Validation(format!("invalid path parameter: {err}")).into()
    }))
    .app_data(web::QueryConfig::default().error_handler(|err, _req| {
        ServiceError::Validation(format!("invalid query string: {err}")).into()
    }))
    .app_data(web::JsonConfig::default().error_handler(|err, _req| {
        ServiceError::Validation(format!("invalid JSON body: {err}")).into()
    }));
}

pub mod error_codes {
    pub const VALIDATION_ERROR: &str = "VALIDATION_ERROR";
    pub const NOT_FOUND: &str = "NOT_FOUND";
    pub const FORBIDDEN: &str = "FORBIDDEN";
    pub const UNAUTHENTICATED: &str = "UNAUTHENTICATED";
    pub const DEPENDENCY_UNAVAILABLE: &str = "DEPENDENCY_UNAVAILABLE";
    pub const CONFLICT: &str = "CONFLICT";
}

pub mod error_types {
    pub const VALIDATION_ERROR: &str = "validation_error";
    pub const NOT_FOUND_ERROR: &str = "not_found_error";
    pub const AUTHORIZATION_ERROR: &str = "authorization_error";
    pub const AUTHENTICATION_ERROR: &str = "authentication_error";
    pub const DEPENDENCY_ERROR: &str = "dependency_error";
    pub const CONFLICT_ERROR: &str = "conflict_error";
}
