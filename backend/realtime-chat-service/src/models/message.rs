use chrono::{DateTime, Utc};
use error_types::{Result, ServiceError};
use identity_client::Identity;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A direct message between two accounts. Immutable once stored.
///
/// `text` is empty rather than absent for image-only messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Message {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
    pub text: String,
    pub image_ref: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub fn new(
        sender_id: Uuid,
        receiver_id: Uuid,
        text: Option<String>,
        image_ref: Option<String>,
    ) -> Result<Self> {
        let text = text.map(|t| t.trim().to_string()).unwrap_or_default();
        let image_ref = image_ref
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty());

        if text.is_empty() && image_ref.is_none() {
            return Err(ServiceError::Validation(
                "a message needs text or an image".into(),
            ));
        }

        Ok(Self {
            id: Uuid::new_v4(),
            sender_id,
            receiver_id,
            text,
            image_ref,
            created_at: Utc::now(),
        })
    }

    /// The other party from `user_id`'s point of view. A note to self has none.
    pub fn peer_of(&self, user_id: Uuid) -> Option<Uuid> {
        let peer = if self.sender_id == user_id {
            self.receiver_id
        } else {
            self.sender_id
        };
        (peer != user_id).then_some(peer)
    }

    pub fn involves(&self, user_id: Uuid) -> bool {
        self.sender_id == user_id || self.receiver_id == user_id
    }

    pub fn is_between(&self, a: Uuid, b: Uuid) -> bool {
        (self.sender_id == a && self.receiver_id == b)
            || (self.sender_id == b && self.receiver_id == a)
    }
}

/// Realtime push body. Absent text or image is sent as an empty string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiveMessagePayload {
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
    pub text: String,
    pub image: String,
    pub created_at: DateTime<Utc>,
}

impl From<&Message> for ReceiveMessagePayload {
    fn from(message: &Message) -> Self {
        Self {
            sender_id: message.sender_id,
            receiver_id: message.receiver_id,
            text: message.text.clone(),
            image: message.image_ref.clone().unwrap_or_default(),
            created_at: message.created_at,
        }
    }
}

/// One row of the inbox: a peer and the latest message exchanged with them
#[derive(Debug, Clone, Serialize)]
pub struct PeerWithLastMessage {
    pub peer: Identity,
    pub last_message: Message,
}
