use std::net::SocketAddr;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use roomcast_core::net::messages::{ClientEvent, ServerEvent};
use roomcast_core::net::protocol::{decode_server_event, encode_client_event};

use roomcast_server::build_app;
use roomcast_server::config::ServerConfig;

pub type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

pub struct TestServer {
    pub addr: SocketAddr,
    _shutdown: tokio::task::JoinHandle<()>,
}

impl TestServer {
    pub async fn new() -> Self {
        Self::from_config(ServerConfig::default()).await
    }

    pub async fn from_config(config: ServerConfig) -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (app, _state) = build_app(config);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        // Give the server a moment to start accepting
        tokio::time::sleep(Duration::from_millis(20)).await;

        Self {
            addr,
            _shutdown: handle,
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn ws_url(&self) -> String {
        format!("ws://{}/ws", self.addr)
    }

    pub async fn health(&self) -> serde_json::Value {
        reqwest::get(format!("{}/health", self.base_url()))
            .await
            .unwrap()
            .json()
            .await
            .unwrap()
    }

    /// Poll `/health` until `pick` returns `expected` (5s timeout). Joins
    /// and disconnects have no acknowledgment, so tests sync on this.
    pub async fn wait_for(&self, pick: fn(&serde_json::Value) -> u64, expected: u64) {
        let deadline = Duration::from_secs(5);
        tokio::time::timeout(deadline, async {
            loop {
                if pick(&self.health().await) == expected {
                    return;
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap_or_else(|_| panic!("Timed out waiting for health value {expected}"));
    }

    pub async fn wait_for_members(&self, expected: u64) {
        self.wait_for(|h| h["room"]["members"].as_u64().unwrap(), expected)
            .await;
    }

    pub async fn wait_for_connections(&self, expected: u64) {
        self.wait_for(|h| h["connections"]["registered"].as_u64().unwrap(), expected)
            .await;
    }
}

/// Connect a WebSocket client to the given URL.
pub async fn ws_connect(url: &str) -> WsStream {
    let (stream, _) = tokio_tungstenite::connect_async(url).await.unwrap();
    stream
}

/// Send a raw text frame.
pub async fn ws_send_text(stream: &mut WsStream, text: &str) {
    stream
        .send(Message::Text(text.to_string().into()))
        .await
        .unwrap();
}

/// Send a `joinRoom` event.
pub async fn ws_join(stream: &mut WsStream, name: &str) {
    let encoded = encode_client_event(&ClientEvent::JoinRoom(name.to_string())).unwrap();
    ws_send_text(stream, &encoded).await;
}

/// Read the next text frame (5s timeout).
pub async fn ws_read_text(stream: &mut WsStream) -> String {
    let deadline = Duration::from_secs(5);
    tokio::time::timeout(deadline, async {
        loop {
            match stream.next().await {
                Some(Ok(Message::Text(text))) => return text.as_str().to_string(),
                Some(Ok(Message::Close(_))) => panic!("WebSocket closed unexpectedly"),
                Some(Err(e)) => panic!("WebSocket error: {e}"),
                None => panic!("WebSocket stream ended"),
                _ => continue,
            }
        }
    })
    .await
    .expect("Timed out waiting for WebSocket message")
}

/// Try to read a text frame, returning None on timeout.
pub async fn ws_try_read_text(stream: &mut WsStream, timeout_ms: u64) -> Option<String> {
    let deadline = Duration::from_millis(timeout_ms);
    tokio::time::timeout(deadline, async {
        loop {
            match stream.next().await {
                Some(Ok(Message::Text(text))) => return text.as_str().to_string(),
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => {
                    panic!("WebSocket error or closed")
                },
                _ => continue,
            }
        }
    })
    .await
    .ok()
}

/// Read the next `roomNotice` and return its display name.
pub async fn ws_read_notice(stream: &mut WsStream) -> String {
    let text = ws_read_text(stream).await;
    match decode_server_event(&text).unwrap() {
        ServerEvent::RoomNotice(name) => name,
    }
}

/// Join and wait until the server counts `members_after` room members.
pub async fn join_and_settle(
    server: &TestServer,
    stream: &mut WsStream,
    name: &str,
    members_after: u64,
) {
    ws_join(stream, name).await;
    server.wait_for_members(members_after).await;
}
