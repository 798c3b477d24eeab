use roomcast_core::connection::ConnectionId;

/// Failures of the shared presence tables. None of these reach a client;
/// the gateway logs them and leaves state untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PresenceError {
    /// The transport handed out an id that is already registered.
    DuplicateConnection(ConnectionId),
    /// The connection is already a member of a different room.
    InOtherRoom { id: ConnectionId, room: String },
    /// The connection is not in the registry.
    UnknownConnection(ConnectionId),
}

impl std::fmt::Display for PresenceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateConnection(id) => write!(f, "connection {id} is already registered"),
            Self::InOtherRoom { id, room } => {
                write!(f, "connection {id} is already a member of room {room}")
            },
            Self::UnknownConnection(id) => write!(f, "connection {id} is not registered"),
        }
    }
}

impl std::error::Error for PresenceError {}
