mod memory_repository;
mod postgres_repository;
mod r#trait;

pub use memory_repository::InMemoryFollowGraphStore;
pub use postgres_repository::PostgresFollowGraphStore;
pub use r#trait::FollowGraphStore;
