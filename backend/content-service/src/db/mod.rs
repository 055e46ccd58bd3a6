/// Post storage
///
/// - `PostStore`: the seam services depend on
/// - `post_repo`: PostgreSQL implementation (one row per aggregate)
/// - `memory`: in-memory implementation for tests and dev runs
mod memory;
mod post_repo;

pub use memory::InMemoryPostStore;
pub use post_repo::PgPostStore;

use crate::models::Post;
use async_trait::async_trait;
use error_types::Result;
use uuid::Uuid;

#[async_trait]
pub trait PostStore: Send + Sync {
    async fn insert(&self, post: &Post) -> Result<()>;

    async fn find(&self, post_id: Uuid) -> Result<Option<Post>>;

    /// Every post by any of `author_ids`, newest first
    async fn find_by_authors(&self, author_ids: &[Uuid]) -> Result<Vec<Post>>;

    /// Overwrite the stored aggregate if its version is still `expected_version`.
    ///
    /// Returns `false` when another writer got there first; the caller re-reads
    /// and retries. On success the stored version becomes `post.version`.
    async fn replace_if_version(&self, post: &Post, expected_version: i64) -> Result<bool>;

    async fn health_check(&self) -> Result<()> {
        Ok(())
    }
}
