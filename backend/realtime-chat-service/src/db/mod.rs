/// Message storage
///
/// Conversations are never stored; a conversation is every message whose
/// sender and receiver are the same unordered pair.
mod memory;
mod message_repo;

pub use memory::InMemoryMessageStore;
pub use message_repo::PgMessageStore;

use crate::models::Message;
use async_trait::async_trait;
use error_types::Result;
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

#[async_trait]
pub trait MessageStore: Send + Sync {
    async fn insert(&self, message: &Message) -> Result<()>;

    /// Messages between `a` and `b`, newest first, after skipping `skip`
    async fn page_between(&self, a: Uuid, b: Uuid, skip: usize, limit: usize)
        -> Result<Vec<Message>>;

    /// Every message sent or received by `user_id`
    async fn messages_involving(&self, user_id: Uuid) -> Result<Vec<Message>>;

    /// Distinct other accounts `user_id` has exchanged messages with
    async fn peer_ids(&self, user_id: Uuid) -> Result<HashSet<Uuid>> {
        let messages = self.messages_involving(user_id).await?;
        Ok(messages.iter().filter_map(|m| m.peer_of(user_id)).collect())
    }

    /// The newest message per peer, in no particular order. Notes to self
    /// are not part of any peer's thread.
    async fn last_message_per_peer(&self, user_id: Uuid) -> Result<Vec<Message>> {
        let mut latest: HashMap<Uuid, Message> = HashMap::new();
        for message in self.messages_involving(user_id).await? {
            let Some(peer) = message.peer_of(user_id) else {
                continue;
            };
            match latest.get(&peer) {
                Some(current) if current.created_at >= message.created_at => {}
                _ => {
                    latest.insert(peer, message);
                }
            }
        }
        Ok(latest.into_values().collect())
    }

    async fn health_check(&self) -> Result<()> {
        Ok(())
    }
}
