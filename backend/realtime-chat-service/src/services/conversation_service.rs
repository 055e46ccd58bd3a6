/// Conversation service - direct messages between two accounts
///
/// Messages are persisted first; delivery to the receiver's live sockets runs
/// afterwards on its own task and never affects the result of the send.
use crate::db::MessageStore;
use crate::models::{Message, PeerWithLastMessage, ReceiveMessagePayload};
use crate::websocket::message_types::WsOutboundEvent;
use crate::websocket::ConnectionRegistry;
use db_pool::Pagination;
use error_types::{Result, ServiceError};
use identity_client::{Identity, IdentityDirectory};
use s3_utils::{MediaInput, ObjectStore};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

#[derive(Clone)]
pub struct ConversationService {
    messages: Arc<dyn MessageStore>,
    directory: Arc<dyn IdentityDirectory>,
    media: Arc<dyn ObjectStore>,
    registry: ConnectionRegistry,
}

impl ConversationService {
    pub fn new(
        messages: Arc<dyn MessageStore>,
        directory: Arc<dyn IdentityDirectory>,
        media: Arc<dyn ObjectStore>,
        registry: ConnectionRegistry,
    ) -> Self {
        Self {
            messages,
            directory,
            media,
            registry,
        }
    }

    async fn resolve_peer(&self, handle: &str) -> Result<Identity> {
        self.directory
            .resolve_by_handle(handle)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("user @{handle}")))
    }

    /// Store a message for the account behind `receiver_handle` and push it to
    /// their live connections.
    pub async fn append_message(
        &self,
        sender_id: Uuid,
        receiver_handle: &str,
        text: Option<String>,
        image: Option<MediaInput>,
    ) -> Result<Message> {
        let has_text = text.as_deref().is_some_and(|t| !t.trim().is_empty());
        if !has_text && image.is_none() {
            return Err(ServiceError::Validation(
                "a message needs text or an image".into(),
            ));
        }

        let receiver = self.resolve_peer(receiver_handle).await?;

        let image_ref = match image {
            Some(input) => input.resolve(self.media.as_ref()).await?,
            None => None,
        };

        let message = Message::new(sender_id, receiver.id, text, image_ref)?;
        self.messages.insert(&message).await?;

        info!(
            message_id = %message.id,
            %sender_id,
            receiver_id = %receiver.id,
            has_image = message.image_ref.is_some(),
            "Message stored"
        );

        self.fan_out(&message);
        Ok(message)
    }

    fn fan_out(&self, message: &Message) {
        let frame = match WsOutboundEvent::ReceiveMessage(ReceiveMessagePayload::from(message))
            .to_json()
        {
            Ok(frame) => frame,
            Err(e) => {
                warn!(message_id = %message.id, error = %e, "Failed to encode realtime frame");
                return;
            }
        };

        let registry = self.registry.clone();
        let receiver_id = message.receiver_id;
        let message_id = message.id;
        tokio::spawn(async move {
            let delivered = registry.push(receiver_id, frame).await;
            debug!(%message_id, %receiver_id, delivered, "Realtime push finished");
        });
    }

    /// One page of the conversation with `peer_handle`, oldest first.
    ///
    /// Page 1 holds the newest messages.
    pub async fn get_history(
        &self,
        user_id: Uuid,
        peer_handle: &str,
        page: Pagination,
    ) -> Result<Vec<Message>> {
        let peer = self.resolve_peer(peer_handle).await?;

        let mut messages = self
            .messages
            .page_between(user_id, peer.id, page.offset(), page.page_size)
            .await?;
        messages.reverse();
        Ok(messages)
    }

    /// Everyone else `user_id` has exchanged messages with, ordered by handle.
    ///
    /// Accounts the directory no longer knows are left out, and so is
    /// `user_id` itself when they have written notes to themselves.
    pub async fn list_peers(&self, user_id: Uuid) -> Result<Vec<Identity>> {
        let ids: Vec<Uuid> = self.messages.peer_ids(user_id).await?.into_iter().collect();
        let resolved = self.directory.resolve_ids(&ids).await?;

        let mut peers: Vec<Identity> = resolved.into_values().collect();
        peers.sort_by(|a, b| a.handle.cmp(&b.handle));
        Ok(peers)
    }

    /// The inbox: each peer with the newest message, most recent first
    pub async fn list_peers_with_last_message(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<PeerWithLastMessage>> {
        let latest = self.messages.last_message_per_peer(user_id).await?;
        let ids: Vec<Uuid> = latest.iter().filter_map(|m| m.peer_of(user_id)).collect();
        let profiles = self.directory.resolve_ids(&ids).await?;

        let mut inbox: Vec<PeerWithLastMessage> = latest
            .into_iter()
            .filter_map(|message| {
                let peer = profiles.get(&message.peer_of(user_id)?)?.clone();
                Some(PeerWithLastMessage {
                    peer,
                    last_message: message,
                })
            })
            .collect();
        inbox.sort_by(|a, b| b.last_message.created_at.cmp(&a.last_message.created_at));

        Ok(inbox)
    }

    pub async fn health_check(&self) -> Result<()> {
        self.messages.health_check().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::InMemoryMessageStore;
    use chrono::{Duration, Utc};
    use identity_client::InMemoryIdentityDirectory;
    use s3_utils::{InMemoryObjectStore, MediaUpload};

    struct Fixture {
        service: ConversationService,
        store: InMemoryMessageStore,
        registry: ConnectionRegistry,
        alice: Identity,
        bob: Identity,
        carol: Identity,
    }

    async fn fixture() -> Fixture {
        let directory = InMemoryIdentityDirectory::new();
        let alice = directory.register("alice", "Alice").await.unwrap();
        let bob = directory.register("bob", "Bob").await.unwrap();
        let carol = directory.register("carol", "Carol").await.unwrap();

        let store = InMemoryMessageStore::new();
        let registry = ConnectionRegistry::new();
        let service = ConversationService::new(
            Arc::new(store.clone()),
            Arc::new(directory),
            Arc::new(InMemoryObjectStore::new()),
            registry.clone(),
        );

        Fixture {
            service,
            store,
            registry,
            alice,
            bob,
            carol,
        }
    }

    fn page(page: i64, size: i64) -> Pagination {
        Pagination::new(page, size).unwrap()
    }

    #[tokio::test]
    async fn test_append_validation_and_unknown_handle() {
        let f = fixture().await;

        let err = f
            .service
            .append_message(f.alice.id, "bob", Some("   ".into()), None)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));

        let err = f
            .service
            .append_message(f.alice.id, "nobody", Some("hi".into()), None)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_image_only_message_has_empty_text() {
        let f = fixture().await;
        let upload = MediaUpload {
            filename: "cat.png".into(),
            data: "AQID".into(),
        };

        let message = f
            .service
            .append_message(f.alice.id, "bob", None, Some(MediaInput::Upload(upload)))
            .await
            .unwrap();
        assert_eq!(message.text, "");
        assert_eq!(message.image_ref.as_deref(), Some("memory://cat.png"));
    }

    #[tokio::test]
    async fn test_appended_message_is_last_in_history() {
        let f = fixture().await;
        for text in ["one", "two", "three"] {
            f.service
                .append_message(f.alice.id, "bob", Some(text.into()), None)
                .await
                .unwrap();
        }
        let sent = f
            .service
            .append_message(f.bob.id, "alice", Some("four".into()), None)
            .await
            .unwrap();

        let history = f
            .service
            .get_history(f.alice.id, "bob", page(1, 20))
            .await
            .unwrap();
        let texts: Vec<&str> = history.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["one", "two", "three", "four"]);
        assert_eq!(history.last().unwrap().id, sent.id);

        let older = f
            .service
            .get_history(f.bob.id, "alice", page(2, 3))
            .await
            .unwrap();
        assert_eq!(older.len(), 1);
        assert_eq!(older[0].text, "one");
    }

    #[tokio::test]
    async fn test_receiver_connections_get_the_payload() {
        let f = fixture().await;
        let (_, mut bob_socket) = f.registry.join(f.bob.id).await;
        let (_, mut alice_socket) = f.registry.join(f.alice.id).await;

        f.service
            .append_message(f.alice.id, "bob", Some("ping".into()), None)
            .await
            .unwrap();

        let frame = tokio::time::timeout(std::time::Duration::from_secs(1), bob_socket.recv())
            .await
            .unwrap()
            .unwrap();
        let json: serde_json::Value = serde_json::from_str(&frame).unwrap();
        assert_eq!(json["type"], "receiveMessage");
        assert_eq!(json["senderId"], f.alice.id.to_string());
        assert_eq!(json["text"], "ping");
        assert_eq!(json["image"], "");

        assert!(alice_socket.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_send_succeeds_without_live_connections() {
        let f = fixture().await;
        let message = f
            .service
            .append_message(f.alice.id, "bob", Some("offline".into()), None)
            .await
            .unwrap();
        assert_eq!(message.receiver_id, f.bob.id);
    }

    #[tokio::test]
    async fn test_peers_with_last_message() {
        let f = fixture().await;
        let now = Utc::now();
        for (from, to, text, age_mins) in [
            (f.alice.id, f.bob.id, "old bob", 30),
            (f.carol.id, f.alice.id, "carol", 20),
            (f.bob.id, f.alice.id, "new bob", 10),
            (f.alice.id, Uuid::new_v4(), "ghost", 5),
        ] {
            let mut message = Message::new(from, to, Some(text.into()), None).unwrap();
            message.created_at = now - Duration::minutes(age_mins);
            f.store.insert(&message).await.unwrap();
        }

        let inbox = f
            .service
            .list_peers_with_last_message(f.alice.id)
            .await
            .unwrap();
        assert_eq!(inbox.len(), 2);
        assert_eq!(inbox[0].peer.handle, "bob");
        assert_eq!(inbox[0].last_message.text, "new bob");
        assert_eq!(inbox[1].peer.handle, "carol");

        let peers = f.service.list_peers(f.alice.id).await.unwrap();
        let handles: Vec<&str> = peers.iter().map(|p| p.handle.as_str()).collect();
        assert_eq!(handles, vec!["bob", "carol"]);
    }

    #[tokio::test]
    async fn test_notes_to_self_are_history_but_not_peers() {
        let f = fixture().await;
        f.service
            .append_message(f.alice.id, "alice", Some("note to self".into()), None)
            .await
            .unwrap();

        let history = f
            .service
            .get_history(f.alice.id, "alice", page(1, 20))
            .await
            .unwrap();
        assert_eq!(history.len(), 1);

        assert!(f.service.list_peers(f.alice.id).await.unwrap().is_empty());
        assert!(f
            .service
            .list_peers_with_last_message(f.alice.id)
            .await
            .unwrap()
            .is_empty());

        f.service
            .append_message(f.alice.id, "bob", Some("hi bob".into()), None)
            .await
            .unwrap();
        let peers = f.service.list_peers(f.alice.id).await.unwrap();
        assert_eq!(peers.len(), 1);
        assert_eq!(peers[0].handle, "bob");
    }
}
