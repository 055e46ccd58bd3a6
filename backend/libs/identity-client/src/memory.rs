use crate::{normalize_handle, Identity, IdentityDirectory};
use async_trait::async_trait;
use error_types::{Result, ServiceError};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Process-local directory for tests and `STORAGE_BACKEND=memory` runs.
#[derive(Clone, Default)]
pub struct InMemoryIdentityDirectory {
    identities: Arc<RwLock<HashMap<Uuid, Identity>>>,
}

impl InMemoryIdentityDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new identity under `handle`.
    pub async fn register(&self, handle: &str, display_name: &str) -> Result<Identity> {
        let handle = normalize_handle(handle);
        if handle.is_empty() {
            return Err(ServiceError::Validation("handle must not be empty".into()));
        }

        let mut identities = self.identities.write().await;
        if identities.values().any(|existing| existing.handle == handle) {
            return Err(ServiceError::Conflict(format!("handle {handle} is taken")));
        }

        let identity = Identity {
            id: Uuid::new_v4(),
            handle,
            display_name: display_name.to_string(),
            avatar_ref: None,
        };
        identities.insert(identity.id, identity.clone());
        Ok(identity)
    }
}

#[async_trait]
impl IdentityDirectory for InMemoryIdentityDirectory {
    async fn resolve_by_handle(&self, handle: &str) -> Result<Option<Identity>> {
        let handle = normalize_handle(handle);
        let identities = self.identities.read().await;
        Ok(identities
            .values()
            .find(|identity| identity.handle == handle)
            .cloned())
    }

    async fn resolve_by_id(&self, id: Uuid) -> Result<Option<Identity>> {
        Ok(self.identities.read().await.get(&id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_register_and_resolve() {
        let directory = InMemoryIdentityDirectory::new();
        let alice = directory.register("Alice", "Alice A.").await.unwrap();

        assert_eq!(alice.handle, "alice");
        assert_eq!(
            directory.resolve_by_handle("ALICE").await.unwrap(),
            Some(alice.clone())
        );
        assert_eq!(directory.resolve_by_id(alice.id).await.unwrap(), Some(alice));
        assert!(directory.resolve_by_handle("nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_handle_rejected() {
        let directory = InMemoryIdentityDirectory::new();
        directory.register("alice", "Alice").await.unwrap();

        let err = directory.register("ALICE", "Other").await.unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_batch_resolution_drops_unknown() {
        let directory = InMemoryIdentityDirectory::new();
        let alice = directory.register("alice", "Alice").await.unwrap();
        let bob = directory.register("bob", "Bob").await.unwrap();

        let handles = vec!["bob".to_string(), "ghost".to_string(), "alice".to_string()];
        let resolved = directory.resolve_handles(&handles).await.unwrap();
        assert_eq!(resolved, vec![bob.clone(), alice.clone()]);

        let ids = directory
            .resolve_ids(&[alice.id, Uuid::new_v4()])
            .await
            .unwrap();
        assert_eq!(ids.len(), 1);
        assert_eq!(ids.get(&alice.id), Some(&alice));
    }
}
