use crate::{normalize_handle, Identity, IdentityDirectory};
use async_trait::async_trait;
use error_types::Result;
use resilience::with_timeout;
use sqlx::PgPool;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

/// Directory backed by the shared `users` table.
#[derive(Clone)]
pub struct PgIdentityDirectory {
    pool: PgPool,
    timeout: Duration,
}

impl PgIdentityDirectory {
    pub fn new(pool: PgPool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }
}

#[async_trait]
impl IdentityDirectory for PgIdentityDirectory {
    async fn resolve_by_handle(&self, handle: &str) -> Result<Option<Identity>> {
        let handle = normalize_handle(handle);
        let identity = with_timeout(
            self.timeout,
            sqlx::query_as::<_, Identity>(
                "SELECT id, handle, display_name, avatar_ref FROM users WHERE LOWER(handle) = $1",
            )
            .bind(&handle)
            .fetch_optional(&self.pool),
        )
        .await??;

        debug!(handle = %handle, found = identity.is_some(), "Resolved handle");
        Ok(identity)
    }

    async fn resolve_by_id(&self, id: Uuid) -> Result<Option<Identity>> {
        let identity = with_timeout(
            self.timeout,
            sqlx::query_as::<_, Identity>(
                "SELECT id, handle, display_name, avatar_ref FROM users WHERE id = $1",
            )
            .bind(id)
            .fetch_optional(&self.pool),
        )
        .await??;

        Ok(identity)
    }

    async fn resolve_handles(&self, handles: &[String]) -> Result<Vec<Identity>> {
        if handles.is_empty() {
            return Ok(Vec::new());
        }

        let normalized: Vec<String> = handles.iter().map(|h| normalize_handle(h)).collect();
        let rows = with_timeout(
            self.timeout,
            sqlx::query_as::<_, Identity>(
                "SELECT id, handle, display_name, avatar_ref FROM users WHERE LOWER(handle) = ANY($1)",
            )
            .bind(&normalized)
            .fetch_all(&self.pool),
        )
        .await??;

        let mut by_handle: HashMap<String, Identity> = rows
            .into_iter()
            .map(|identity| (identity.handle.to_lowercase(), identity))
            .collect();

        debug!(requested = handles.len(), resolved = by_handle.len(), "Resolved handles");

        Ok(normalized
            .iter()
            .filter_map(|handle| by_handle.remove(handle))
            .collect())
    }

    async fn resolve_ids(&self, ids: &[Uuid]) -> Result<HashMap<Uuid, Identity>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = with_timeout(
            self.timeout,
            sqlx::query_as::<_, Identity>(
                "SELECT id, handle, display_name, avatar_ref FROM users WHERE id = ANY($1)",
            )
            .bind(ids)
            .fetch_all(&self.pool),
        )
        .await??;

        Ok(rows.into_iter().map(|identity| (identity.id, identity)).collect())
    }
}
