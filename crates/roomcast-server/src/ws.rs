use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;

use roomcast_core::net::messages::ServerEvent;
use roomcast_core::net::protocol::{decode_client_event, encode_server_event};
use roomcast_core::session::Inbound;

use crate::gateway::Session;
use crate::outbox::ChannelOutbox;
use crate::state::{AppState, ConnectionGuard};

pub async fn ws_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    ws: WebSocketUpgrade,
) -> Response {
    // CORS does not apply to upgrades. Requests without an Origin header
    // (non-browser clients) pass.
    if let Some(origin) = headers.get(header::ORIGIN)
        && origin.as_bytes() != state.config.cors.allowed_origin.as_bytes()
    {
        tracing::warn!(origin = ?origin, "Refusing WS upgrade from foreign origin");
        return StatusCode::FORBIDDEN.into_response();
    }

    let max_ws = state.config.limits.max_ws_connections;
    let Some(guard) = ConnectionGuard::try_acquire(Arc::clone(&state.ws_connection_count), max_ws)
    else {
        tracing::warn!(max = max_ws, "WS connection limit reached");
        return StatusCode::SERVICE_UNAVAILABLE.into_response();
    };

    ws.on_upgrade(move |socket| handle_socket(socket, state, guard))
}

async fn handle_socket(socket: WebSocket, state: AppState, _guard: ConnectionGuard) {
    let (ws_sender, mut ws_receiver) = socket.split();

    let (outbox, rx) = ChannelOutbox::channel(state.config.limits.outbox_buffer);
    let mut session = match state.gateway.accept(outbox).await {
        Ok(s) => s,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to register connection");
            return;
        },
    };

    spawn_writer(ws_sender, rx);

    let rate = state.config.limits.ws_rate_limit_per_sec;
    read_loop(&mut ws_receiver, &mut session, rate).await;

    // Unregistering drops the outbox, which ends the writer task.
    session.disconnect().await;
}

fn spawn_writer(
    mut ws_sender: SplitSink<WebSocket, Message>,
    mut rx: mpsc::Receiver<ServerEvent>,
) {
    tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let text = match encode_server_event(&event) {
                Ok(t) => t,
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to encode outbound event");
                    continue;
                },
            };
            if ws_sender.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
    });
}

/// Inbound frame budget for one connection (token bucket refilled at
/// `per_sec`). The bucket always holds at least one whole token, so any
/// positive rate admits frames.
struct FrameBudget {
    tokens: f64,
    capacity: f64,
    per_sec: f64,
    last_refill: tokio::time::Instant,
}

impl FrameBudget {
    fn new(per_sec: f64) -> Self {
        let capacity = per_sec.max(1.0);
        Self {
            tokens: capacity,
            capacity,
            per_sec,
            last_refill: tokio::time::Instant::now(),
        }
    }

    fn try_take(&mut self) -> bool {
        let now = tokio::time::Instant::now();
        let elapsed = now.duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed * self.per_sec).min(self.capacity);
        self.last_refill = now;

        if self.tokens < 1.0 {
            return false;
        }
        self.tokens -= 1.0;
        true
    }
}

async fn read_loop(ws_receiver: &mut SplitStream<WebSocket>, session: &mut Session, rate: f64) {
    let mut budget = FrameBudget::new(rate);

    while let Some(Ok(msg)) = ws_receiver.next().await {
        let text = match msg {
            Message::Text(t) => t,
            Message::Close(_) => break,
            _ => continue,
        };

        if !budget.try_take() {
            tracing::warn!(connection_id = %session.id(), "Rate limited");
            continue;
        }

        match decode_client_event(text.as_str()) {
            Ok(event) => {
                session.handle(Inbound::from(event)).await;
            },
            Err(e) => {
                tracing::debug!(
                    connection_id = %session.id(),
                    error = %e,
                    "Dropping undecodable frame"
                );
            },
        }
    }
}
