use crate::models::ReceiveMessagePayload;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Frames a client sends over the socket
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum WsInboundEvent {
    /// Start receiving messages addressed to `user_id`
    #[serde(rename_all = "camelCase")]
    Join { user_id: Uuid },
    Leave,
}

/// Frames the server sends over the socket
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum WsOutboundEvent {
    #[serde(rename_all = "camelCase")]
    Joined { user_id: Uuid },
    ReceiveMessage(ReceiveMessagePayload),
    Error { message: String },
}

impl WsOutboundEvent {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
