use crate::domain::edge::{FollowEdge, FollowStats};
use error_types::Result;
use std::collections::HashSet;
use uuid::Uuid;

/// Storage for directed follow edges.
///
/// The store does not reject self-edges; that rule belongs to the service.
#[async_trait::async_trait]
pub trait FollowGraphStore: Send + Sync {
    /// Insert an edge. `ConflictError` if it already exists.
    async fn create_follow(&self, follower_id: Uuid, followee_id: Uuid) -> Result<FollowEdge>;

    /// Remove an edge. `NotFoundError` if there was none.
    async fn delete_follow(&self, follower_id: Uuid, followee_id: Uuid) -> Result<()>;

    async fn is_following(&self, follower_id: Uuid, followee_id: Uuid) -> Result<bool>;

    /// Everyone `user_id` follows
    async fn list_followees(&self, user_id: Uuid) -> Result<HashSet<Uuid>>;

    async fn count_followers(&self, user_id: Uuid) -> Result<i64>;

    async fn count_followees(&self, user_id: Uuid) -> Result<i64>;

    async fn follow_stats(&self, user_id: Uuid) -> Result<FollowStats> {
        let followers = self.count_followers(user_id).await?;
        let following = self.count_followees(user_id).await?;
        Ok(FollowStats {
            user_id,
            followers,
            following,
        })
    }

    /// Health check (optional)
    async fn health_check(&self) -> Result<()> {
        Ok(())
    }
}
