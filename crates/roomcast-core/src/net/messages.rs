use serde::{Deserialize, Serialize};

/// Wire names of the events carried over the socket.
pub const JOIN_ROOM_EVENT: &str = "joinRoom";
pub const ROOM_NOTICE_EVENT: &str = "roomNotice";

/// Events sent by a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ClientEvent {
    /// Declare a display name and join the shared room.
    JoinRoom(String),
}

/// Events sent by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ServerEvent {
    /// Another connection joined the room under this display name.
    RoomNotice(String),
}

/// Broadcast to existing room members when a connection joins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinNotice {
    pub display_name: String,
}

impl JoinNotice {
    pub fn new(display_name: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
        }
    }
}

impl From<JoinNotice> for ServerEvent {
    fn from(notice: JoinNotice) -> Self {
        ServerEvent::RoomNotice(notice.display_name)
    }
}

impl From<&JoinNotice> for ServerEvent {
    fn from(notice: &JoinNotice) -> Self {
        ServerEvent::RoomNotice(notice.display_name.clone())
    }
}
