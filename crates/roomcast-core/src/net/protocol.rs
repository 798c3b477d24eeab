use serde::Deserialize;

use super::messages::{ClientEvent, JOIN_ROOM_EVENT, ServerEvent};

/// Maximum accepted size of a single text frame in bytes.
pub const MAX_MESSAGE_SIZE: usize = 64 * 1024; // 64 KiB

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    EmptyMessage,
    PayloadTooLarge(usize),
    Json(String),
    UnknownEvent(String),
    MalformedPayload(String),
    SerializeError(String),
}

impl std::fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyMessage => write!(f, "empty message"),
            Self::PayloadTooLarge(size) => {
                write!(
                    f,
                    "payload too large: {size} bytes (max {MAX_MESSAGE_SIZE})"
                )
            },
            Self::Json(e) => write!(f, "invalid json: {e}"),
            Self::UnknownEvent(name) => write!(f, "unknown event: {name}"),
            Self::MalformedPayload(e) => write!(f, "malformed payload: {e}"),
            Self::SerializeError(e) => write!(f, "serialize error: {e}"),
        }
    }
}

impl std::error::Error for ProtocolError {}

/// Untyped view of an incoming frame, used to tell a bad envelope apart
/// from a known event with a bad payload.
#[derive(Deserialize)]
struct Envelope {
    event: String,
    #[serde(default)]
    data: Option<serde_json::Value>,
}

/// Decode a text frame into a `ClientEvent`.
pub fn decode_client_event(text: &str) -> Result<ClientEvent, ProtocolError> {
    if text.is_empty() {
        return Err(ProtocolError::EmptyMessage);
    }
    if text.len() > MAX_MESSAGE_SIZE {
        return Err(ProtocolError::PayloadTooLarge(text.len()));
    }

    let envelope: Envelope =
        serde_json::from_str(text).map_err(|e| ProtocolError::Json(e.to_string()))?;

    match envelope.event.as_str() {
        JOIN_ROOM_EVENT => match envelope.data {
            Some(serde_json::Value::String(name)) => Ok(ClientEvent::JoinRoom(name)),
            Some(other) => Err(ProtocolError::MalformedPayload(format!(
                "joinRoom expects a string, got {}",
                json_kind(&other)
            ))),
            None => Err(ProtocolError::MalformedPayload(
                "joinRoom is missing its display name".to_string(),
            )),
        },
        _ => Err(ProtocolError::UnknownEvent(envelope.event)),
    }
}

/// Encode a `ClientEvent` to a text frame.
pub fn encode_client_event(event: &ClientEvent) -> Result<String, ProtocolError> {
    serde_json::to_string(event).map_err(|e| ProtocolError::SerializeError(e.to_string()))
}

/// Encode a `ServerEvent` to a text frame.
pub fn encode_server_event(event: &ServerEvent) -> Result<String, ProtocolError> {
    serde_json::to_string(event).map_err(|e| ProtocolError::SerializeError(e.to_string()))
}

/// Decode a text frame into a `ServerEvent`. Used by clients and tests.
pub fn decode_server_event(text: &str) -> Result<ServerEvent, ProtocolError> {
    if text.is_empty() {
        return Err(ProtocolError::EmptyMessage);
    }
    serde_json::from_str(text).map_err(|e| ProtocolError::Json(e.to_string()))
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::messages::JoinNotice;

    #[test]
    fn decode_join_room() {
        let event = decode_client_event(r#"{"event":"joinRoom","data":"Alice"}"#).unwrap();
        assert_eq!(event, ClientEvent::JoinRoom("Alice".to_string()));
    }

    #[test]
    fn decode_join_room_accepts_empty_name() {
        let event = decode_client_event(r#"{"event":"joinRoom","data":""}"#).unwrap();
        assert_eq!(event, ClientEvent::JoinRoom(String::new()));
    }

    #[test]
    fn decode_join_room_non_string_payload() {
        let err = decode_client_event(r#"{"event":"joinRoom","data":42}"#).unwrap_err();
        assert!(matches!(err, ProtocolError::MalformedPayload(_)));
        assert!(err.to_string().contains("number"));
    }

    #[test]
    fn decode_join_room_missing_payload() {
        let err = decode_client_event(r#"{"event":"joinRoom"}"#).unwrap_err();
        assert!(matches!(err, ProtocolError::MalformedPayload(_)));

        let err = decode_client_event(r#"{"event":"joinRoom","data":null}"#).unwrap_err();
        assert!(matches!(err, ProtocolError::MalformedPayload(_)));
    }

    #[test]
    fn decode_unknown_event() {
        let err = decode_client_event(r#"{"event":"sendMessage","data":"hi"}"#).unwrap_err();
        assert_eq!(err, ProtocolError::UnknownEvent("sendMessage".to_string()));
    }

    #[test]
    fn decode_rejects_garbage() {
        assert_eq!(decode_client_event(""), Err(ProtocolError::EmptyMessage));
        assert!(matches!(
            decode_client_event("not json"),
            Err(ProtocolError::Json(_))
        ));
        assert!(matches!(
            decode_client_event(r#"{"data":"Alice"}"#),
            Err(ProtocolError::Json(_))
        ));
    }

    #[test]
    fn decode_rejects_oversized_frame() {
        let name = "a".repeat(MAX_MESSAGE_SIZE);
        let frame = format!(r#"{{"event":"joinRoom","data":"{name}"}}"#);
        assert!(matches!(
            decode_client_event(&frame),
            Err(ProtocolError::PayloadTooLarge(_))
        ));
    }

    #[test]
    fn room_notice_wire_shape() {
        let event = ServerEvent::from(JoinNotice::new("Bob"));
        let text = encode_server_event(&event).unwrap();
        assert_eq!(text, r#"{"event":"roomNotice","data":"Bob"}"#);
        assert_eq!(decode_server_event(&text).unwrap(), event);
    }

    #[test]
    fn join_room_wire_shape() {
        let text = encode_client_event(&ClientEvent::JoinRoom("Cara".to_string())).unwrap();
        assert_eq!(text, r#"{"event":"joinRoom","data":"Cara"}"#);
    }
}
