//! # Actix Middleware Library
//!
//! Request-scoped middleware shared by the HTTP services
//!
//! ## Modules
//! - `caller_identity`: trusted caller id forwarded by the gateway
//! - `correlation_id`: request correlation ids for log stitching

pub mod caller_identity;
pub mod correlation_id;

pub use caller_identity::{CallerIdentityMiddleware, UserId, USER_ID_HEADER};
pub use correlation_id::{get_correlation_id, CorrelationId, CorrelationIdMiddleware};
