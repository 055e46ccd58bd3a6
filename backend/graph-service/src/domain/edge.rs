use chrono::{DateTime, Utc};
use identity_client::Identity;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Directed follow relationship, unique per ordered pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FollowEdge {
    pub follower_id: Uuid,
    pub followee_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl FollowEdge {
    pub fn new(follower_id: Uuid, followee_id: Uuid) -> Self {
        Self {
            follower_id,
            followee_id,
            created_at: Utc::now(),
        }
    }
}

/// Result of a follow request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FollowOutcome {
    pub followee: Identity,
    pub already_following: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FollowStats {
    pub user_id: Uuid,
    pub followers: i64,
    pub following: i64,
}
