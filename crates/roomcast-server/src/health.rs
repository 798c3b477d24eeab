use std::sync::atomic::Ordering;

use axum::Json;
use axum::extract::State;
use axum::response::Html;
use serde::Serialize;

use crate::state::AppState;

/// Fixed greeting served on `/`.
pub const GREETING: &str = "<h1>Hello world</h1>";

pub async fn root() -> Html<&'static str> {
    Html(GREETING)
}

/// Structured health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub connections: ConnectionInfo,
    pub room: RoomInfo,
}

#[derive(Serialize)]
pub struct ConnectionInfo {
    pub websocket: usize,
    pub registered: usize,
}

#[derive(Serialize)]
pub struct RoomInfo {
    pub name: String,
    pub active_rooms: usize,
    pub members: usize,
}

/// Returns server status, connection counts, and room occupancy as JSON.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let websocket = state.ws_connection_count.load(Ordering::Relaxed);

    let (registered, (active_rooms, members)) = {
        let presence = state.gateway.presence().read().await;
        (presence.connection_count(), presence.stats())
    };

    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        connections: ConnectionInfo {
            websocket,
            registered,
        },
        room: RoomInfo {
            name: state.gateway.room().to_string(),
            active_rooms,
            members,
        },
    })
}
