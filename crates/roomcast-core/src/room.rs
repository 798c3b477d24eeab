/// Name of the single shared room every client joins.
pub const DEFAULT_ROOM: &str = "group";

/// Maximum length of a room name accepted from configuration.
pub const MAX_ROOM_NAME_LEN: usize = 64;

/// Validate a room name: non-empty, bounded, and free of whitespace and
/// control characters.
pub fn is_valid_room_name(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= MAX_ROOM_NAME_LEN
        && !name.chars().any(|c| c.is_whitespace() || c.is_control())
}
