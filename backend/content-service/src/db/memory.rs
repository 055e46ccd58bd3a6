use super::PostStore;
use crate::models::Post;
use async_trait::async_trait;
use error_types::{Result, ServiceError};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Process-local post store for tests and `STORAGE_BACKEND=memory` runs.
#[derive(Clone, Default)]
pub struct InMemoryPostStore {
    posts: Arc<RwLock<HashMap<Uuid, Post>>>,
}

impl InMemoryPostStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PostStore for InMemoryPostStore {
    async fn insert(&self, post: &Post) -> Result<()> {
        let mut posts = self.posts.write().await;
        if posts.contains_key(&post.id) {
            return Err(ServiceError::Conflict(format!("post {} exists", post.id)));
        }
        posts.insert(post.id, post.clone());
        Ok(())
    }

    async fn find(&self, post_id: Uuid) -> Result<Option<Post>> {
        Ok(self.posts.read().await.get(&post_id).cloned())
    }

    async fn find_by_authors(&self, author_ids: &[Uuid]) -> Result<Vec<Post>> {
        let posts = self.posts.read().await;
        let mut found: Vec<Post> = posts
            .values()
            .filter(|p| author_ids.contains(&p.author_id))
            .cloned()
            .collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(found)
    }

    async fn replace_if_version(&self, post: &Post, expected_version: i64) -> Result<bool> {
        let mut posts = self.posts.write().await;
        match posts.get_mut(&post.id) {
            Some(stored) if stored.version == expected_version => {
                *stored = post.clone();
                Ok(true)
            }
            Some(_) => Ok(false),
            None => Err(ServiceError::NotFound(format!("post {}", post.id))),
        }
    }
}
