use super::MessageStore;
use crate::models::Message;
use async_trait::async_trait;
use error_types::{Result, ServiceError};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Process-local message log for tests and `STORAGE_BACKEND=memory` runs.
///
/// Kept in write order so ties on `created_at` resolve to the later write.
#[derive(Clone, Default)]
pub struct InMemoryMessageStore {
    messages: Arc<RwLock<Vec<Message>>>,
}

impl InMemoryMessageStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn newest_first(mut messages: Vec<Message>) -> Vec<Message> {
    messages.reverse();
    messages.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    messages
}

#[async_trait]
impl MessageStore for InMemoryMessageStore {
    async fn insert(&self, message: &Message) -> Result<()> {
        let mut messages = self.messages.write().await;
        if messages.iter().any(|m| m.id == message.id) {
            return Err(ServiceError::Conflict(format!("message {} exists", message.id)));
        }
        messages.push(message.clone());
        Ok(())
    }

    async fn page_between(
        &self,
        a: Uuid,
        b: Uuid,
        skip: usize,
        limit: usize,
    ) -> Result<Vec<Message>> {
        let between: Vec<Message> = self
            .messages
            .read()
            .await
            .iter()
            .filter(|m| m.is_between(a, b))
            .cloned()
            .collect();

        Ok(newest_first(between)
            .into_iter()
            .skip(skip)
            .take(limit)
            .collect())
    }

    async fn messages_involving(&self, user_id: Uuid) -> Result<Vec<Message>> {
        let involving = self
            .messages
            .read()
            .await
            .iter()
            .filter(|m| m.involves(user_id))
            .cloned()
            .collect();
        Ok(newest_first(involving))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn message(from: Uuid, to: Uuid, text: &str, age_secs: i64) -> Message {
        let mut message = Message::new(from, to, Some(text.into()), None).unwrap();
        message.created_at = Utc::now() - Duration::seconds(age_secs);
        message
    }

    #[tokio::test]
    async fn test_page_between_is_newest_first() {
        let store = InMemoryMessageStore::new();
        let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());

        store.insert(&message(a, b, "one", 30)).await.unwrap();
        store.insert(&message(b, a, "two", 20)).await.unwrap();
        store.insert(&message(a, c, "elsewhere", 15)).await.unwrap();
        store.insert(&message(a, b, "three", 10)).await.unwrap();

        let page = store.page_between(a, b, 0, 2).await.unwrap();
        let texts: Vec<&str> = page.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["three", "two"]);

        let page = store.page_between(b, a, 2, 2).await.unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].text, "one");
    }

    #[tokio::test]
    async fn test_last_message_per_peer() {
        let store = InMemoryMessageStore::new();
        let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());

        store.insert(&message(a, b, "old b", 30)).await.unwrap();
        store.insert(&message(c, a, "c", 25)).await.unwrap();
        store.insert(&message(b, a, "new b", 5)).await.unwrap();

        let mut latest = store.last_message_per_peer(a).await.unwrap();
        latest.sort_by(|x, y| y.created_at.cmp(&x.created_at));

        assert_eq!(latest.len(), 2);
        assert_eq!(latest[0].text, "new b");
        assert_eq!(latest[1].text, "c");
        assert_eq!(store.peer_ids(a).await.unwrap().len(), 2);
    }
}
