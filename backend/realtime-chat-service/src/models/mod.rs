pub mod message;

pub use message::{Message, PeerWithLastMessage, ReceiveMessagePayload};
