use actix_middleware::{CallerIdentityMiddleware, USER_ID_HEADER};
use actix_web::{dev::ServerHandle, http::StatusCode, web, App, HttpServer};
use awc::{error::WsProtocolError, ws, Client};
use futures::{Sink, SinkExt, Stream, StreamExt};
use identity_client::{Identity, InMemoryIdentityDirectory};
use realtime_chat_service::{routes, AppState, ConnectionRegistry, ConversationService, InMemoryMessageStore};
use s3_utils::InMemoryObjectStore;
use serde_json::{json, Value};
use std::net::{SocketAddr, TcpListener};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

const FRAME_WAIT: Duration = Duration::from_secs(5);

struct Server {
    addr: SocketAddr,
    handle: ServerHandle,
    registry: ConnectionRegistry,
    alice: Identity,
    bob: Identity,
}

async fn start_server() -> Server {
    let directory = InMemoryIdentityDirectory::new();
    let alice = directory.register("alice", "Alice").await.unwrap();
    let bob = directory.register("bob", "Bob").await.unwrap();

    let registry = ConnectionRegistry::new();
    let state = web::Data::new(AppState {
        conversations: ConversationService::new(
            Arc::new(InMemoryMessageStore::new()),
            Arc::new(directory),
            Arc::new(InMemoryObjectStore::new()),
            registry.clone(),
        ),
        registry: registry.clone(),
        ws_client_timeout: Duration::from_secs(30),
    });

    let listener = TcpListener::bind("127.0.0.1:0").expect("bind test listener");
    let addr = listener.local_addr().unwrap();
    let server = HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(CallerIdentityMiddleware)
            .configure(routes::configure)
    })
    .workers(1)
    .listen(listener)
    .expect("listen")
    .run();

    let handle = server.handle();
    actix_rt::spawn(server);

    Server {
        addr,
        handle,
        registry,
        alice,
        bob,
    }
}

async fn connect(
    server: &Server,
    caller: Option<&Identity>,
) -> impl Stream<Item = Result<ws::Frame, WsProtocolError>>
       + Sink<ws::Message, Error = WsProtocolError>
       + Unpin {
    let mut request = Client::new().ws(format!("http://{}/ws", server.addr));
    if let Some(identity) = caller {
        request = request.set_header(USER_ID_HEADER, identity.id.to_string());
    }
    let (_resp, socket) = request.connect().await.expect("connect websocket client");
    socket
}

async fn send_event<S>(socket: &mut S, event: Value)
where
    S: Sink<ws::Message, Error = WsProtocolError> + Unpin,
{
    socket
        .send(ws::Message::Text(event.to_string().into()))
        .await
        .expect("send frame");
}

/// Next JSON text frame, skipping heartbeats
async fn next_event<S>(socket: &mut S) -> Value
where
    S: Stream<Item = Result<ws::Frame, WsProtocolError>> + Unpin,
{
    loop {
        let frame = timeout(FRAME_WAIT, socket.next())
            .await
            .expect("frame before timeout")
            .expect("socket open")
            .expect("valid frame");
        match frame {
            ws::Frame::Text(bytes) => return serde_json::from_slice(&bytes).expect("json frame"),
            ws::Frame::Ping(_) | ws::Frame::Pong(_) => continue,
            other => panic!("unexpected frame: {other:?}"),
        }
    }
}

async fn send_message(server: &Server, from: &Identity, to_handle: &str, text: &str) {
    let res = Client::new()
        .post(format!(
            "http://{}/api/v1/message/send/{to_handle}",
            server.addr
        ))
        .insert_header((USER_ID_HEADER, from.id.to_string()))
        .send_json(&json!({ "text": text }))
        .await
        .expect("send request");
    assert_eq!(res.status(), StatusCode::CREATED);
}

#[actix_rt::test]
async fn joined_socket_receives_sent_messages() {
    let server = start_server().await;
    let mut socket = connect(&server, Some(&server.bob)).await;

    send_event(&mut socket, json!({ "type": "join", "userId": server.bob.id })).await;
    let joined = next_event(&mut socket).await;
    assert_eq!(joined["type"], "joined");
    assert_eq!(joined["userId"], server.bob.id.to_string());

    send_message(&server, &server.alice, "bob", "hello over the socket").await;

    let pushed = next_event(&mut socket).await;
    assert_eq!(pushed["type"], "receiveMessage");
    assert_eq!(pushed["senderId"], server.alice.id.to_string());
    assert_eq!(pushed["receiverId"], server.bob.id.to_string());
    assert_eq!(pushed["text"], "hello over the socket");
    assert_eq!(pushed["image"], "");

    server.handle.stop(true).await;
}

#[actix_rt::test]
async fn join_as_another_account_is_rejected() {
    let server = start_server().await;
    let mut socket = connect(&server, Some(&server.bob)).await;

    send_event(&mut socket, json!({ "type": "join", "userId": server.alice.id })).await;
    let rejected = next_event(&mut socket).await;
    assert_eq!(rejected["type"], "error");
    assert_eq!(rejected["message"], "cannot join as another account");

    assert_eq!(server.registry.push(server.alice.id, "{}".into()).await, 0);

    server.handle.stop(true).await;
}

#[actix_rt::test]
async fn second_join_on_one_socket_registers_once() {
    let server = start_server().await;
    let mut socket = connect(&server, None).await;

    let join = json!({ "type": "join", "userId": server.bob.id });
    send_event(&mut socket, join.clone()).await;
    send_event(&mut socket, join).await;

    // the rejection is immediate, the ack waits on the registry
    let mut kinds = vec![
        next_event(&mut socket).await["type"].as_str().unwrap().to_string(),
        next_event(&mut socket).await["type"].as_str().unwrap().to_string(),
    ];
    kinds.sort();
    assert_eq!(kinds, vec!["error", "joined"]);

    assert_eq!(
        server
            .registry
            .push(server.bob.id, json!({ "type": "marker" }).to_string())
            .await,
        1
    );
    assert_eq!(next_event(&mut socket).await["type"], "marker");

    server.handle.stop(true).await;
}

#[actix_rt::test]
async fn leave_stops_delivery() {
    let server = start_server().await;
    let mut socket = connect(&server, Some(&server.bob)).await;

    send_event(&mut socket, json!({ "type": "join", "userId": server.bob.id })).await;
    assert_eq!(next_event(&mut socket).await["type"], "joined");

    send_event(&mut socket, json!({ "type": "leave" })).await;

    let mut registered = true;
    for _ in 0..50 {
        if server.registry.push(server.bob.id, "{}".into()).await == 0 {
            registered = false;
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert!(!registered, "socket still registered after leave");

    // drain anything pushed while the leave was in flight
    while let Ok(Some(Ok(frame))) = timeout(Duration::from_millis(100), socket.next()).await {
        assert!(!matches!(frame, ws::Frame::Close(_)));
    }

    send_message(&server, &server.alice, "bob", "nobody listening").await;
    let late = timeout(Duration::from_millis(300), next_event(&mut socket)).await;
    assert!(late.is_err(), "frame delivered after leave: {late:?}");

    server.handle.stop(true).await;
}

#[actix_rt::test]
async fn leave_right_after_join_never_subscribes() {
    let server = start_server().await;
    let mut socket = connect(&server, Some(&server.bob)).await;

    send_event(&mut socket, json!({ "type": "join", "userId": server.bob.id })).await;
    send_event(&mut socket, json!({ "type": "leave" })).await;

    let mut registered = true;
    for _ in 0..50 {
        tokio::time::sleep(Duration::from_millis(20)).await;
        if server.registry.push(server.bob.id, "{}".into()).await == 0 {
            registered = false;
            break;
        }
    }
    assert!(!registered, "socket still registered after an early leave");

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(server.registry.push(server.bob.id, "{}".into()).await, 0);

    server.handle.stop(true).await;
}
