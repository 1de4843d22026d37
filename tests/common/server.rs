//! Test server and socket client
//!
//! Spawns the real router on `127.0.0.1:0` and talks to it over
//! `tokio-tungstenite`, so tests exercise the handshake, the session loop
//! and the wire format together.

use std::net::SocketAddr;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use sqlx::SqlitePool;
use teamhub::backend::auth::users::User;
use teamhub::backend::routes::create_router;
use teamhub::backend::server::AppState;
use teamhub::shared::ServerEvent;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use uuid::Uuid;

use super::auth_helpers::{generate_test_token, test_keys};
use super::database::create_test_pool;

pub const EVENT_TIMEOUT: Duration = Duration::from_secs(2);
pub const QUIET_PERIOD: Duration = Duration::from_millis(200);

pub struct TestServer {
    pub addr: SocketAddr,
    pub pool: SqlitePool,
    pub state: AppState,
}

impl TestServer {
    pub async fn start() -> Self {
        let pool = create_test_pool().await;
        let state = AppState::new(pool.clone(), test_keys());
        let app = create_router(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("Listener has no address");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("Test server failed");
        });

        Self { addr, pool, state }
    }

    pub fn socket_url(&self, token: Option<&str>) -> String {
        match token {
            Some(token) => format!("ws://{}/socket?token={}", self.addr, token),
            None => format!("ws://{}/socket", self.addr),
        }
    }

    /// Connect as `user` and wait for the `connected` event
    pub async fn connect(&self, user: &User) -> WsClient {
        let token = generate_test_token(user.id, &user.email);
        let (stream, _) = connect_async(self.socket_url(Some(&token)))
            .await
            .expect("Socket handshake failed");
        let mut client = WsClient::from_stream(user.id, stream);
        client
            .recv_until(|e| matches!(e, ServerEvent::Connected { .. }))
            .await;
        client
    }
}

pub struct WsClient {
    pub user_id: Uuid,
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
    next_ack: u64,
}

impl WsClient {
    pub fn from_stream(user_id: Uuid, stream: WebSocketStream<MaybeTlsStream<TcpStream>>) -> Self {
        Self {
            user_id,
            stream,
            next_ack: 1,
        }
    }

    /// Send an event without an ack id
    pub async fn emit(&mut self, event: &str, data: Value) {
        let frame = json!({ "event": event, "data": data });
        self.send_raw(&frame.to_string()).await;
    }

    /// Send an event and wait for the matching ack
    pub async fn request(&mut self, event: &str, data: Value) -> teamhub::shared::Ack {
        let ack_id = self.next_ack;
        self.next_ack += 1;
        let frame = json!({ "event": event, "data": data, "ackId": ack_id });
        self.send_raw(&frame.to_string()).await;

        match self
            .recv_until(|e| matches!(e, ServerEvent::Ack(ack) if ack.ack_id == Some(ack_id)))
            .await
        {
            ServerEvent::Ack(ack) => ack,
            _ => unreachable!(),
        }
    }

    pub async fn send_raw(&mut self, text: &str) {
        self.stream
            .send(Message::text(text.to_string()))
            .await
            .expect("Failed to send frame");
    }

    /// Next server event, failing the test after `EVENT_TIMEOUT`
    pub async fn next_event(&mut self) -> ServerEvent {
        tokio::time::timeout(EVENT_TIMEOUT, self.read_event())
            .await
            .expect("Timed out waiting for server event")
            .expect("Socket closed while waiting for event")
    }

    /// Skip events until one matches
    pub async fn recv_until(&mut self, predicate: impl Fn(&ServerEvent) -> bool) -> ServerEvent {
        loop {
            let event = self.next_event().await;
            if predicate(&event) {
                return event;
            }
        }
    }

    /// Collect every event that arrives within `QUIET_PERIOD`
    pub async fn drain(&mut self) -> Vec<ServerEvent> {
        let mut events = Vec::new();
        while let Ok(Some(event)) = tokio::time::timeout(QUIET_PERIOD, self.read_event()).await {
            events.push(event);
        }
        events
    }

    pub async fn close(mut self) {
        let _ = self.stream.close(None).await;
        // wait for the server to finish the close handshake
        while let Ok(Some(_)) = tokio::time::timeout(EVENT_TIMEOUT, self.stream.next()).await {}
    }

    async fn read_event(&mut self) -> Option<ServerEvent> {
        while let Some(frame) = self.stream.next().await {
            match frame.ok()? {
                Message::Text(text) => {
                    return Some(
                        serde_json::from_str(text.as_str()).expect("Server sent an unknown event"),
                    )
                }
                Message::Close(_) => return None,
                _ => continue,
            }
        }
        None
    }
}

/// Status changes for `user` among `events`
pub fn status_changes(events: &[ServerEvent], user: Uuid) -> Vec<String> {
    events
        .iter()
        .filter_map(|event| match event {
            ServerEvent::UserStatusChanged { user_id, status } if *user_id == user => {
                Some(status.clone())
            }
            _ => None,
        })
        .collect()
}
