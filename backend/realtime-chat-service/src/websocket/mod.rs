use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{
    mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender},
    RwLock,
};
use uuid::Uuid;

pub mod message_types;

/// Identifies one live socket among the sockets of the same account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

struct Connection {
    id: ConnectionId,
    sender: UnboundedSender<String>,
}

/// Routing table from account id to its live connections.
///
/// Starts empty and holds no message state; a push to an account with no
/// connections is dropped.
#[derive(Default, Clone)]
pub struct ConnectionRegistry {
    // user_id -> live connections
    inner: Arc<RwLock<HashMap<Uuid, Vec<Connection>>>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection for `user_id`.
    ///
    /// Everything pushed to `user_id` until [`leave`](Self::leave) arrives on
    /// the returned receiver.
    pub async fn join(&self, user_id: Uuid) -> (ConnectionId, UnboundedReceiver<String>) {
        let connection_id = ConnectionId::new();
        let rx = self.join_as(user_id, connection_id).await;
        (connection_id, rx)
    }

    /// Register a connection under an id the caller chose before awaiting.
    pub async fn join_as(
        &self,
        user_id: Uuid,
        connection_id: ConnectionId,
    ) -> UnboundedReceiver<String> {
        let (tx, rx) = unbounded_channel();

        let mut guard = self.inner.write().await;
        let connections = guard.entry(user_id).or_default();
        connections.push(Connection {
            id: connection_id,
            sender: tx,
        });

        tracing::debug!(
            %user_id,
            ?connection_id,
            connections = connections.len(),
            "Connection joined"
        );

        rx
    }

    /// Drop one connection. Must be called when its socket closes.
    pub async fn leave(&self, user_id: Uuid, connection_id: ConnectionId) {
        let mut guard = self.inner.write().await;

        if let Some(connections) = guard.get_mut(&user_id) {
            connections.retain(|c| c.id != connection_id);
            tracing::debug!(
                %user_id,
                ?connection_id,
                remaining = connections.len(),
                "Connection left"
            );

            if connections.is_empty() {
                guard.remove(&user_id);
            }
        }
    }

    /// Push `msg` to every live connection of `user_id`.
    ///
    /// Returns how many connections accepted it. Closed receivers are pruned.
    pub async fn push(&self, user_id: Uuid, msg: String) -> usize {
        let mut guard = self.inner.write().await;
        let Some(connections) = guard.get_mut(&user_id) else {
            return 0;
        };

        let before = connections.len();
        connections.retain(|c| c.sender.send(msg.clone()).is_ok());
        let delivered = connections.len();

        if before != delivered {
            tracing::debug!(
                %user_id,
                pruned = before - delivered,
                "Dropped closed connections during push"
            );
        }
        if connections.is_empty() {
            guard.remove(&user_id);
        }

        delivered
    }
}
