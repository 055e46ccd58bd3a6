/// Realtime Chat Service Library
///
/// Direct messages between two accounts: persisted history, an inbox view,
/// and best-effort delivery to the receiver's open WebSocket connections.
///
/// # Modules
///
/// - `models`: the message record and its realtime payload
/// - `db`: `MessageStore` and its PostgreSQL and in-memory implementations
/// - `services`: `ConversationService`
/// - `websocket`: the connection registry and socket frame types
/// - `routes`: HTTP and WebSocket endpoints
pub mod config;
pub mod db;
pub mod logging;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod websocket;

pub use db::{InMemoryMessageStore, MessageStore, PgMessageStore};
pub use models::{Message, PeerWithLastMessage, ReceiveMessagePayload};
pub use services::ConversationService;
pub use state::AppState;
pub use websocket::ConnectionRegistry;
