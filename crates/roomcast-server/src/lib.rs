pub mod broadcaster;
pub mod config;
pub mod error;
pub mod gateway;
pub mod health;
pub mod membership;
pub mod outbox;
pub mod presence;
pub mod registry;
pub mod state;
pub mod ws;

use axum::Router;
use axum::http::{HeaderValue, Method};
use tower_http::cors::CorsLayer;

use config::ServerConfig;
use state::AppState;

/// Build the Axum router and application state from a config.
pub fn build_app(config: ServerConfig) -> (Router<()>, AppState) {
    let cors = cors_layer(&config.cors.allowed_origin);
    let state = AppState::new(config);

    let app = Router::new()
        .route("/", axum::routing::get(health::root))
        .route("/health", axum::routing::get(health::health_check))
        .route("/ws", axum::routing::get(ws::ws_handler))
        .layer(cors)
        .with_state(state.clone());

    (app, state)
}

/// CORS for the single allowed browser origin. An unparsable origin leaves
/// cross-origin requests disallowed.
fn cors_layer(allowed_origin: &str) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods([Method::GET]);
    match allowed_origin.parse::<HeaderValue>() {
        Ok(origin) => layer.allow_origin(origin),
        Err(e) => {
            tracing::warn!(origin = allowed_origin, error = %e, "Ignoring invalid CORS origin");
            layer
        },
    }
}
