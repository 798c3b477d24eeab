use serde::Deserialize;

use roomcast_core::room::{DEFAULT_ROOM, is_valid_room_name};

/// Name of the optional config file read from the working directory.
pub const CONFIG_FILE: &str = "roomcast.toml";

/// Top-level server configuration, loaded from `roomcast.toml`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen_addr: String,
    /// The one room every client joins.
    pub room_name: String,
    pub cors: CorsConfig,
    pub limits: LimitsConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8989".to_string(),
            room_name: DEFAULT_ROOM.to_string(),
            cors: CorsConfig::default(),
            limits: LimitsConfig::default(),
        }
    }
}

/// Cross-origin policy for the WebSocket upgrade.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CorsConfig {
    pub allowed_origin: String,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origin: "http://localhost:5173".to_string(),
        }
    }
}

/// Connection caps and buffer sizes.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    pub max_ws_connections: usize,
    /// Inbound frames per second allowed per connection (also the burst size).
    pub ws_rate_limit_per_sec: f64,
    /// Queued outbound events per connection before notices are dropped.
    pub outbox_buffer: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_ws_connections: 200,
            ws_rate_limit_per_sec: 20.0,
            outbox_buffer: 64,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    InvalidListenAddr(String),
    InvalidRoomName(String),
    InvalidOrigin(String),
    ZeroLimit(&'static str),
    /// Below one frame per second the per-connection bucket never holds a
    /// whole token, so no frame would ever be accepted.
    RateTooLow(f64),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidListenAddr(a) => write!(f, "listen_addr {a:?} is not a socket address"),
            Self::InvalidRoomName(r) => write!(f, "room_name {r:?} is not a valid room name"),
            Self::InvalidOrigin(o) => write!(f, "cors.allowed_origin {o:?} is not a valid origin"),
            Self::ZeroLimit(name) => write!(f, "{name} must be > 0"),
            Self::RateTooLow(rate) => {
                write!(f, "limits.ws_rate_limit_per_sec must be >= 1, got {rate}")
            },
        }
    }
}

impl std::error::Error for ConfigError {}

impl ServerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.listen_addr.parse::<std::net::SocketAddr>().is_err() {
            return Err(ConfigError::InvalidListenAddr(self.listen_addr.clone()));
        }
        if !is_valid_room_name(&self.room_name) {
            return Err(ConfigError::InvalidRoomName(self.room_name.clone()));
        }
        if axum::http::HeaderValue::from_str(&self.cors.allowed_origin).is_err()
            || self.cors.allowed_origin.is_empty()
        {
            return Err(ConfigError::InvalidOrigin(self.cors.allowed_origin.clone()));
        }
        if self.limits.max_ws_connections == 0 {
            return Err(ConfigError::ZeroLimit("limits.max_ws_connections"));
        }
        let rate = self.limits.ws_rate_limit_per_sec;
        if !(rate.is_finite() && rate >= 1.0) {
            return Err(ConfigError::RateTooLow(rate));
        }
        if self.limits.outbox_buffer == 0 {
            return Err(ConfigError::ZeroLimit("limits.outbox_buffer"));
        }
        Ok(())
    }

    /// Load config from `roomcast.toml` if it exists, then apply env var overrides.
    pub fn load() -> Self {
        let mut config = match std::fs::read_to_string(CONFIG_FILE) {
            Ok(content) => match toml::from_str::<ServerConfig>(&content) {
                Ok(cfg) => {
                    tracing::info!("Loaded configuration from {CONFIG_FILE}");
                    cfg
                },
                Err(e) => {
                    tracing::warn!("Failed to parse {CONFIG_FILE}: {e}, using defaults");
                    ServerConfig::default()
                },
            },
            Err(_) => {
                tracing::info!("No {CONFIG_FILE} found, using defaults");
                ServerConfig::default()
            },
        };
        config.apply_env_overrides(|key| std::env::var(key).ok());
        config
    }

    /// Apply `ROOMCAST_*` overrides read through `lookup`. Empty or
    /// unparsable values are ignored.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(addr) = lookup("ROOMCAST_LISTEN_ADDR")
            && !addr.is_empty()
        {
            self.listen_addr = addr;
        }
        if let Some(room) = lookup("ROOMCAST_ROOM")
            && !room.is_empty()
        {
            self.room_name = room;
        }
        if let Some(origin) = lookup("ROOMCAST_ALLOWED_ORIGIN")
            && !origin.is_empty()
        {
            self.cors.allowed_origin = origin;
        }
        if let Some(val) = lookup("ROOMCAST_MAX_WS_CONNECTIONS")
            && let Ok(n) = val.parse::<usize>()
        {
            self.limits.max_ws_connections = n;
        }
        if let Some(val) = lookup("ROOMCAST_WS_RATE_LIMIT")
            && let Ok(n) = val.parse::<f64>()
            && n.is_finite()
        {
            self.limits.ws_rate_limit_per_sec = n;
        }
    }
}
