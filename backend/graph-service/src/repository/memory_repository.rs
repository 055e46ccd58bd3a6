use super::FollowGraphStore;
use crate::domain::edge::FollowEdge;
use error_types::{Result, ServiceError};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Process-local follow graph for tests and `STORAGE_BACKEND=memory` runs.
#[derive(Clone, Default)]
pub struct InMemoryFollowGraphStore {
    edges: Arc<RwLock<HashMap<(Uuid, Uuid), FollowEdge>>>,
}

impl InMemoryFollowGraphStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl FollowGraphStore for InMemoryFollowGraphStore {
    async fn create_follow(&self, follower_id: Uuid, followee_id: Uuid) -> Result<FollowEdge> {
        let mut edges = self.edges.write().await;
        if edges.contains_key(&(follower_id, followee_id)) {
            return Err(ServiceError::Conflict(format!(
                "{follower_id} already follows {followee_id}"
            )));
        }

        let edge = FollowEdge::new(follower_id, followee_id);
        edges.insert((follower_id, followee_id), edge.clone());
        Ok(edge)
    }

    async fn delete_follow(&self, follower_id: Uuid, followee_id: Uuid) -> Result<()> {
        self.edges
            .write()
            .await
            .remove(&(follower_id, followee_id))
            .map(|_| ())
            .ok_or_else(|| {
                ServiceError::NotFound(format!("{follower_id} does not follow {followee_id}"))
            })
    }

    async fn is_following(&self, follower_id: Uuid, followee_id: Uuid) -> Result<bool> {
        Ok(self
            .edges
            .read()
            .await
            .contains_key(&(follower_id, followee_id)))
    }

    async fn list_followees(&self, user_id: Uuid) -> Result<HashSet<Uuid>> {
        Ok(self
            .edges
            .read()
            .await
            .keys()
            .filter(|(follower, _)| *follower == user_id)
            .map(|(_, followee)| *followee)
            .collect())
    }

    async fn count_followers(&self, user_id: Uuid) -> Result<i64> {
        let edges = self.edges.read().await;
        Ok(edges.keys().filter(|(_, followee)| *followee == user_id).count() as i64)
    }

    async fn count_followees(&self, user_id: Uuid) -> Result<i64> {
        let edges = self.edges.read().await;
        Ok(edges.keys().filter(|(follower, _)| *follower == user_id).count() as i64)
    }
}
