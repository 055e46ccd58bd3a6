use crate::{services::ConversationService, websocket::ConnectionRegistry};
use std::time::Duration;

#[derive(Clone)]
pub struct AppState {
    pub conversations: ConversationService,
    pub registry: ConnectionRegistry,
    /// How long a socket may go without a pong
    pub ws_client_timeout: Duration,
}
