use super::FollowGraphStore;
use crate::domain::edge::FollowEdge;
use chrono::{DateTime, Utc};
use error_types::{Result, ServiceError};
use resilience::with_timeout;
use sqlx::PgPool;
use std::collections::HashSet;
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

/// PostgreSQL follow graph (source of truth)
#[derive(Clone)]
pub struct PostgresFollowGraphStore {
    pool: PgPool,
    timeout: Duration,
}

impl PostgresFollowGraphStore {
    pub fn new(pool: PgPool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }
}

#[async_trait::async_trait]
impl FollowGraphStore for PostgresFollowGraphStore {
    async fn create_follow(&self, follower_id: Uuid, followee_id: Uuid) -> Result<FollowEdge> {
        let created_at: Option<DateTime<Utc>> = with_timeout(
            self.timeout,
            sqlx::query_scalar(
                r#"
                INSERT INTO follows (follower_id, followee_id, created_at)
                VALUES ($1, $2, NOW())
                ON CONFLICT (follower_id, followee_id) DO NOTHING
                RETURNING created_at
                "#,
            )
            .bind(follower_id)
            .bind(followee_id)
            .fetch_optional(&self.pool),
        )
        .await??;

        let created_at = created_at.ok_or_else(|| {
            ServiceError::Conflict(format!("{follower_id} already follows {followee_id}"))
        })?;

        debug!(%follower_id, %followee_id, "Created follow edge");
        Ok(FollowEdge {
            follower_id,
            followee_id,
            created_at,
        })
    }

    async fn delete_follow(&self, follower_id: Uuid, followee_id: Uuid) -> Result<()> {
        let result = with_timeout(
            self.timeout,
            sqlx::query("DELETE FROM follows WHERE follower_id = $1 AND followee_id = $2")
                .bind(follower_id)
                .bind(followee_id)
                .execute(&self.pool),
        )
        .await??;

        if result.rows_affected() == 0 {
            return Err(ServiceError::NotFound(format!(
                "{follower_id} does not follow {followee_id}"
            )));
        }

        debug!(%follower_id, %followee_id, "Deleted follow edge");
        Ok(())
    }

    async fn is_following(&self, follower_id: Uuid, followee_id: Uuid) -> Result<bool> {
        let exists: bool = with_timeout(
            self.timeout,
            sqlx::query_scalar(
                "SELECT EXISTS(SELECT 1 FROM follows WHERE follower_id = $1 AND followee_id = $2)",
            )
            .bind(follower_id)
            .bind(followee_id)
            .fetch_one(&self.pool),
        )
        .await??;

        Ok(exists)
    }

    async fn list_followees(&self, user_id: Uuid) -> Result<HashSet<Uuid>> {
        let ids: Vec<Uuid> = with_timeout(
            self.timeout,
            sqlx::query_scalar("SELECT followee_id FROM follows WHERE follower_id = $1")
                .bind(user_id)
                .fetch_all(&self.pool),
        )
        .await??;

        Ok(ids.into_iter().collect())
    }

    async fn count_followers(&self, user_id: Uuid) -> Result<i64> {
        let count: i64 = with_timeout(
            self.timeout,
            sqlx::query_scalar("SELECT COUNT(*) FROM follows WHERE followee_id = $1")
                .bind(user_id)
                .fetch_one(&self.pool),
        )
        .await??;

        Ok(count)
    }

    async fn count_followees(&self, user_id: Uuid) -> Result<i64> {
        let count: i64 = with_timeout(
            self.timeout,
            sqlx::query_scalar("SELECT COUNT(*) FROM follows WHERE follower_id = $1")
                .bind(user_id)
                .fetch_one(&self.pool),
        )
        .await??;

        Ok(count)
    }

    async fn health_check(&self) -> Result<()> {
        with_timeout(self.timeout, sqlx::query("SELECT 1").execute(&self.pool)).await??;
        Ok(())
    }
}
