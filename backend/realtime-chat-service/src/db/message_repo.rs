use super::MessageStore;
use crate::models::Message;
use async_trait::async_trait;
use error_types::{Result, ServiceError};
use resilience::with_timeout;
use sqlx::PgPool;
use std::collections::HashSet;
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

/// PostgreSQL message store
///
/// `seq` records write order and breaks ties between equal timestamps.
#[derive(Clone)]
pub struct PgMessageStore {
    pool: PgPool,
    timeout: Duration,
}

impl PgMessageStore {
    pub fn new(pool: PgPool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }
}

const MESSAGE_COLUMNS: &str = "id, sender_id, receiver_id, text, image_ref, created_at";

#[async_trait]
impl MessageStore for PgMessageStore {
    async fn insert(&self, message: &Message) -> Result<()> {
        with_timeout(
            self.timeout,
            sqlx::query(
                r#"
                INSERT INTO messages (id, sender_id, receiver_id, text, image_ref, created_at)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(message.id)
            .bind(message.sender_id)
            .bind(message.receiver_id)
            .bind(&message.text)
            .bind(&message.image_ref)
            .bind(message.created_at)
            .execute(&self.pool),
        )
        .await??;

        debug!(message_id = %message.id, "Inserted message");
        Ok(())
    }

    async fn page_between(
        &self,
        a: Uuid,
        b: Uuid,
        skip: usize,
        limit: usize,
    ) -> Result<Vec<Message>> {
        let skip = i64::try_from(skip)
            .map_err(|_| ServiceError::Validation(format!("offset {skip} is out of range")))?;
        let limit = i64::try_from(limit)
            .map_err(|_| ServiceError::Validation(format!("limit {limit} is out of range")))?;

        let messages = with_timeout(
            self.timeout,
            sqlx::query_as::<_, Message>(&format!(
                r#"
                SELECT {MESSAGE_COLUMNS} FROM messages
                WHERE (sender_id = $1 AND receiver_id = $2)
                   OR (sender_id = $2 AND receiver_id = $1)
                ORDER BY created_at DESC, seq DESC
                OFFSET $3 LIMIT $4
                "#
            ))
            .bind(a)
            .bind(b)
            .bind(skip)
            .bind(limit)
            .fetch_all(&self.pool),
        )
        .await??;

        Ok(messages)
    }

    async fn messages_involving(&self, user_id: Uuid) -> Result<Vec<Message>> {
        let messages = with_timeout(
            self.timeout,
            sqlx::query_as::<_, Message>(&format!(
                r#"
                SELECT {MESSAGE_COLUMNS} FROM messages
                WHERE sender_id = $1 OR receiver_id = $1
                ORDER BY created_at DESC, seq DESC
                "#
            ))
            .bind(user_id)
            .fetch_all(&self.pool),
        )
        .await??;

        Ok(messages)
    }

    async fn peer_ids(&self, user_id: Uuid) -> Result<HashSet<Uuid>> {
        let peers: Vec<Uuid> = with_timeout(
            self.timeout,
            sqlx::query_scalar(
                r#"
                SELECT DISTINCT CASE WHEN sender_id = $1 THEN receiver_id ELSE sender_id END
                FROM messages
                WHERE (sender_id = $1 OR receiver_id = $1)
                  AND sender_id <> receiver_id
                "#,
            )
            .bind(user_id)
            .fetch_all(&self.pool),
        )
        .await??;

        Ok(peers.into_iter().collect())
    }

    async fn last_message_per_peer(&self, user_id: Uuid) -> Result<Vec<Message>> {
        let messages = with_timeout(
            self.timeout,
            sqlx::query_as::<_, Message>(&format!(
                r#"
                SELECT DISTINCT ON (peer_id) {MESSAGE_COLUMNS}
                FROM (
                    SELECT m.*,
                           CASE WHEN m.sender_id = $1 THEN m.receiver_id ELSE m.sender_id END AS peer_id
                    FROM messages m
                    WHERE (m.sender_id = $1 OR m.receiver_id = $1)
                      AND m.sender_id <> m.receiver_id
                ) involving
                ORDER BY peer_id, created_at DESC, seq DESC
                "#
            ))
            .bind(user_id)
            .fetch_all(&self.pool),
        )
        .await??;

        Ok(messages)
    }

    async fn health_check(&self) -> Result<()> {
        with_timeout(self.timeout, sqlx::query("SELECT 1").execute(&self.pool)).await??;
        Ok(())
    }
}
