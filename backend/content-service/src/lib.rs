/// Content Service Library
///
/// Owns the post aggregate: a post with its likes, comments and replies is
/// stored and versioned as one unit, and every write is a compare-and-swap
/// against that version. Also assembles the home feed from the follow graph.
///
/// # Modules
///
/// - `models`: the post aggregate and its hydrated views
/// - `db`: `PostStore` and its PostgreSQL and in-memory implementations
/// - `services`: post operations, mention parsing and feed assembly
/// - `handlers`: HTTP endpoints
pub mod config;
pub mod db;
pub mod handlers;
pub mod logging;
pub mod models;
pub mod services;

pub use db::{InMemoryPostStore, PgPostStore, PostStore};
pub use models::{Comment, Post, PostView, Reply};
pub use services::{FeedAssembler, PostService};
