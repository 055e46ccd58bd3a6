//! Identity directory client
//!
//! Resolves handles and ids to display-ready identities. Every service that
//! shows an author, follower or chat peer goes through [`IdentityDirectory`].

mod memory;
mod postgres;

pub use memory::InMemoryIdentityDirectory;
pub use postgres::PgIdentityDirectory;

use async_trait::async_trait;
use error_types::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Minimal public profile of an account.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::FromRow)]
pub struct Identity {
    pub id: Uuid,
    pub handle: String,
    pub display_name: String,
    pub avatar_ref: Option<String>,
}

impl Identity {
    /// Stand-in for an id the directory no longer knows.
    pub fn unknown(id: Uuid) -> Self {
        Self {
            id,
            handle: String::new(),
            display_name: String::new(),
            avatar_ref: None,
        }
    }
}

/// Handles are unique case-insensitively and stored lowercased.
pub fn normalize_handle(handle: &str) -> String {
    handle.trim().trim_start_matches('@').to_lowercase()
}

#[async_trait]
pub trait IdentityDirectory: Send + Sync {
    async fn resolve_by_handle(&self, handle: &str) -> Result<Option<Identity>>;

    async fn resolve_by_id(&self, id: Uuid) -> Result<Option<Identity>>;

    /// Resolve several handles at once, silently dropping unknown ones.
    /// Output order follows input order.
    async fn resolve_handles(&self, handles: &[String]) -> Result<Vec<Identity>> {
        let mut found = Vec::with_capacity(handles.len());
        for handle in handles {
            if let Some(identity) = self.resolve_by_handle(handle).await? {
                found.push(identity);
            }
        }
        Ok(found)
    }

    /// Resolve several ids at once; unknown ids are absent from the map.
    async fn resolve_ids(&self, ids: &[Uuid]) -> Result<HashMap<Uuid, Identity>> {
        let mut found = HashMap::with_capacity(ids.len());
        for id in ids {
            if let Some(identity) = self.resolve_by_id(*id).await? {
                found.insert(*id, identity);
            }
        }
        Ok(found)
    }
}

/// Apply the `users` read-model migrations.
///
/// Services share one database, so missing versions from sibling services are
/// ignored.
pub async fn run_migrations(pool: &sqlx::PgPool) -> std::result::Result<(), sqlx::migrate::MigrateError> {
    let mut migrator = sqlx::migrate!("./migrations");
    migrator.set_ignore_missing(true);
    migrator.run(pool).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_handle() {
        assert_eq!(normalize_handle("Alice"), "alice");
        assert_eq!(normalize_handle("@Bob.Smith "), "bob.smith");
        assert_eq!(normalize_handle("carol_1"), "carol_1");
    }

    #[test]
    fn test_identity_serialization() {
        let identity = Identity {
            id: Uuid::nil(),
            handle: "alice".into(),
            display_name: "Alice".into(),
            avatar_ref: None,
        };
        let json = serde_json::to_value(&identity).unwrap();
        assert_eq!(json["handle"], "alice");
        assert!(json["avatar_ref"].is_null());
    }
}
