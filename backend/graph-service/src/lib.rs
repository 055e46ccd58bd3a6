pub mod config;
pub mod domain;
pub mod handlers;
pub mod logging;
pub mod repository;
pub mod services;

pub use domain::edge::{FollowEdge, FollowOutcome, FollowStats};
pub use repository::{FollowGraphStore, InMemoryFollowGraphStore, PostgresFollowGraphStore};
pub use services::FollowService;
