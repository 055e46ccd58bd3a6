use crate::domain::edge::{FollowOutcome, FollowStats};
use crate::repository::FollowGraphStore;
use error_types::{Result, ServiceError};
use identity_client::{Identity, IdentityDirectory};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

/// Follow / unfollow by handle on top of the follow graph
#[derive(Clone)]
pub struct FollowService {
    graph: Arc<dyn FollowGraphStore>,
    directory: Arc<dyn IdentityDirectory>,
}

impl FollowService {
    pub fn new(graph: Arc<dyn FollowGraphStore>, directory: Arc<dyn IdentityDirectory>) -> Self {
        Self { graph, directory }
    }

    async fn resolve(&self, handle: &str) -> Result<Identity> {
        self.directory
            .resolve_by_handle(handle)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("user @{handle}")))
    }

    /// Follow the account behind `handle`.
    ///
    /// Following someone twice is not an error; the outcome reports it.
    pub async fn follow(&self, follower_id: Uuid, handle: &str) -> Result<FollowOutcome> {
        let followee = self.resolve(handle).await?;
        if followee.id == follower_id {
            return Err(ServiceError::Validation("cannot follow yourself".into()));
        }

        match self.graph.create_follow(follower_id, followee.id).await {
            Ok(_) => {
                info!(%follower_id, followee_id = %followee.id, "User followed");
                Ok(FollowOutcome {
                    followee,
                    already_following: false,
                })
            }
            Err(ServiceError::Conflict(_)) => {
                debug!(%follower_id, followee_id = %followee.id, "Follow already exists");
                Ok(FollowOutcome {
                    followee,
                    already_following: true,
                })
            }
            Err(e) => Err(e),
        }
    }

    pub async fn unfollow(&self, follower_id: Uuid, handle: &str) -> Result<Identity> {
        let followee = self.resolve(handle).await?;
        self.graph.delete_follow(follower_id, followee.id).await?;

        info!(%follower_id, followee_id = %followee.id, "User unfollowed");
        Ok(followee)
    }

    /// Whether `viewer_id` follows `handle`; always false on one's own profile.
    pub async fn is_following(&self, viewer_id: Uuid, handle: &str) -> Result<bool> {
        let target = self.resolve(handle).await?;
        if target.id == viewer_id {
            return Ok(false);
        }
        self.graph.is_following(viewer_id, target.id).await
    }

    pub async fn follow_stats(&self, handle: &str) -> Result<FollowStats> {
        let target = self.resolve(handle).await?;
        self.graph.follow_stats(target.id).await
    }

    pub async fn health_check(&self) -> Result<()> {
        self.graph.health_check().await
    }
}
