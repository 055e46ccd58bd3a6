use crate::state::AppState;
use crate::websocket::message_types::{WsInboundEvent, WsOutboundEvent};
use crate::websocket::{ConnectionId, ConnectionRegistry};
use actix::{Actor, ActorContext, Addr, AsyncContext, Handler, Message as ActixMessage, StreamHandler};
use actix_middleware::UserId;
use actix_web::{get, web, Error, HttpRequest, HttpResponse};
use actix_web_actors::ws;
use std::time::{Duration, Instant};
use tokio::sync::oneshot::{self, error::TryRecvError};
use uuid::Uuid;

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(5);

// Frame pushed through the registry for this socket
#[derive(ActixMessage)]
#[rtype(result = "()")]
struct Deliver {
    connection_id: ConnectionId,
    frame: String,
}

// Registry confirmed the join
#[derive(ActixMessage)]
#[rtype(result = "()")]
struct Joined {
    connection_id: ConnectionId,
}

/// Registration held by a session from the `join` frame onwards.
///
/// Recorded before the registry is awaited, so a second `join` or an early
/// `leave` sees it. Dropping it closes `cancel`, which makes the forwarder
/// leave the registry.
struct Subscription {
    user_id: Uuid,
    connection_id: ConnectionId,
    _cancel: oneshot::Sender<()>,
}

/// One client socket.
///
/// The socket receives nothing until the client sends `join`; after that every
/// message addressed to the joined account is forwarded as a text frame.
pub struct WsSession {
    registry: ConnectionRegistry,
    /// Account from `X-User-Id` at upgrade time, if the gateway set one
    caller: Option<Uuid>,
    subscription: Option<Subscription>,
    client_timeout: Duration,
    hb: Instant,
}

impl WsSession {
    pub fn new(registry: ConnectionRegistry, caller: Option<Uuid>, client_timeout: Duration) -> Self {
        Self {
            registry,
            caller,
            subscription: None,
            client_timeout,
            hb: Instant::now(),
        }
    }

    fn joined_as(&self) -> Option<Uuid> {
        self.subscription.as_ref().map(|s| s.user_id)
    }

    fn is_current(&self, connection_id: ConnectionId) -> bool {
        self.subscription
            .as_ref()
            .is_some_and(|s| s.connection_id == connection_id)
    }

    fn hb(&self, ctx: &mut ws::WebsocketContext<Self>) {
        ctx.run_interval(HEARTBEAT_INTERVAL, |act, ctx| {
            if Instant::now().duration_since(act.hb) > act.client_timeout {
                tracing::warn!(joined = ?act.joined_as(), "WebSocket heartbeat failed, disconnecting");
                ctx.stop();
                return;
            }
            ctx.ping(b"");
        });
    }

    fn send_event(ctx: &mut ws::WebsocketContext<Self>, event: &WsOutboundEvent) {
        match event.to_json() {
            Ok(frame) => ctx.text(frame),
            Err(e) => tracing::error!(error = %e, "Failed to encode WebSocket frame"),
        }
    }

    fn join(&mut self, user_id: Uuid, ctx: &mut ws::WebsocketContext<Self>) {
        if let Some(caller) = self.caller {
            if caller != user_id {
                tracing::warn!(%caller, %user_id, "Rejected join for another account");
                Self::send_event(
                    ctx,
                    &WsOutboundEvent::Error {
                        message: "cannot join as another account".into(),
                    },
                );
                return;
            }
        }

        if let Some(current) = self.joined_as() {
            Self::send_event(
                ctx,
                &WsOutboundEvent::Error {
                    message: format!("already joined as {current}"),
                },
            );
            return;
        }

        let connection_id = ConnectionId::new();
        let (cancel, cancelled) = oneshot::channel();
        self.subscription = Some(Subscription {
            user_id,
            connection_id,
            _cancel: cancel,
        });

        actix::spawn(forward(
            self.registry.clone(),
            user_id,
            connection_id,
            ctx.address(),
            cancelled,
        ));
    }

    fn leave(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            tracing::debug!(user_id = %subscription.user_id, "WebSocket left");
        }
    }
}

/// Register with the router and pump pushed frames into the actor until the
/// session drops its subscription.
async fn forward(
    registry: ConnectionRegistry,
    user_id: Uuid,
    connection_id: ConnectionId,
    addr: Addr<WsSession>,
    mut cancelled: oneshot::Receiver<()>,
) {
    let mut rx = registry.join_as(user_id, connection_id).await;

    // a leave or a closed socket while registering skips straight to cleanup
    if matches!(cancelled.try_recv(), Err(TryRecvError::Empty)) {
        addr.do_send(Joined { connection_id });

        loop {
            tokio::select! {
                _ = &mut cancelled => break,
                frame = rx.recv() => match frame {
                    Some(frame) => addr.do_send(Deliver { connection_id, frame }),
                    None => break,
                },
            }
        }
    }

    registry.leave(user_id, connection_id).await;
}

impl Actor for WsSession {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        tracing::info!(caller = ?self.caller, "WebSocket session started");
        self.hb(ctx);
    }

    fn stopped(&mut self, _ctx: &mut Self::Context) {
        tracing::info!(joined = ?self.joined_as(), "WebSocket session stopped");
        self.leave();
    }
}

impl Handler<Deliver> for WsSession {
    type Result = ();

    fn handle(&mut self, msg: Deliver, ctx: &mut Self::Context) {
        if self.is_current(msg.connection_id) {
            ctx.text(msg.frame);
        }
    }
}

impl Handler<Joined> for WsSession {
    type Result = ();

    fn handle(&mut self, msg: Joined, ctx: &mut Self::Context) {
        // stale when the client left (and maybe re-joined) while registering
        let Some(user_id) = self
            .subscription
            .as_ref()
            .filter(|s| s.connection_id == msg.connection_id)
            .map(|s| s.user_id)
        else {
            return;
        };
        tracing::debug!(%user_id, "WebSocket joined");
        Self::send_event(ctx, &WsOutboundEvent::Joined { user_id });
    }
}

impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for WsSession {
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        match msg {
            Ok(ws::Message::Ping(msg)) => {
                self.hb = Instant::now();
                ctx.pong(&msg);
            }
            Ok(ws::Message::Pong(_)) => {
                self.hb = Instant::now();
            }
            Ok(ws::Message::Text(text)) => match serde_json::from_str::<WsInboundEvent>(&text) {
                Ok(WsInboundEvent::Join { user_id }) => self.join(user_id, ctx),
                Ok(WsInboundEvent::Leave) => self.leave(),
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to parse WS message");
                    Self::send_event(
                        ctx,
                        &WsOutboundEvent::Error {
                            message: format!("unrecognised frame: {e}"),
                        },
                    );
                }
            },
            Ok(ws::Message::Binary(_)) => {
                tracing::warn!("Binary WebSocket messages not supported");
            }
            Ok(ws::Message::Close(reason)) => {
                tracing::info!(?reason, "WebSocket close message received");
                ctx.close(reason);
                ctx.stop();
            }
            Err(e) => {
                tracing::warn!(error = %e, "WebSocket protocol error");
                ctx.stop();
            }
            _ => {}
        }
    }
}

#[get("/ws")]
pub async fn ws_handler(
    req: HttpRequest,
    stream: web::Payload,
    state: web::Data<AppState>,
    caller: Option<UserId>,
) -> Result<HttpResponse, Error> {
    let session = WsSession::new(
        state.registry.clone(),
        caller.map(|c| c.0),
        state.ws_client_timeout,
    );
    ws::start(session, &req, stream)
}
