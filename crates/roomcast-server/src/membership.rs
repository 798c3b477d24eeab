use std::collections::{BTreeSet, HashMap};

use roomcast_core::connection::ConnectionId;

use crate::error::PresenceError;

/// Room name -> member set, with a reverse index enforcing that a
/// connection belongs to at most one room.
#[derive(Debug, Default)]
pub struct RoomTable {
    rooms: HashMap<String, BTreeSet<ConnectionId>>,
    member_of: HashMap<ConnectionId, String>,
}

impl RoomTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `id` to `room`. Returns `Ok(true)` if it was inserted and
    /// `Ok(false)` if it was already a member.
    pub fn join(&mut self, room: &str, id: ConnectionId) -> Result<bool, PresenceError> {
        if let Some(current) = self.member_of.get(&id) {
            if current == room {
                return Ok(false);
            }
            return Err(PresenceError::InOtherRoom {
                id,
                room: current.clone(),
            });
        }
        self.rooms.entry(room.to_string()).or_default().insert(id);
        self.member_of.insert(id, room.to_string());
        Ok(true)
    }

    /// Remove `id` from `room`. Returns whether it was a member. A room
    /// whose last member leaves is dropped.
    pub fn leave(&mut self, room: &str, id: ConnectionId) -> bool {
        let Some(members) = self.rooms.get_mut(room) else {
            return false;
        };
        let removed = members.remove(&id);
        if members.is_empty() {
            self.rooms.remove(room);
        }
        if removed {
            self.member_of.remove(&id);
        }
        removed
    }

    /// Remove `id` from whichever room holds it. Returns that room's name.
    pub fn leave_any(&mut self, id: ConnectionId) -> Option<String> {
        let room = self.member_of.get(&id)?.clone();
        self.leave(&room, id);
        Some(room)
    }

    /// Members of `room` other than `excluded`, in id order.
    pub fn members_except(&self, room: &str, excluded: ConnectionId) -> Vec<ConnectionId> {
        self.rooms
            .get(room)
            .map(|members| members.iter().copied().filter(|&m| m != excluded).collect())
            .unwrap_or_default()
    }

    pub fn room_of(&self, id: ConnectionId) -> Option<&str> {
        self.member_of.get(&id).map(String::as_str)
    }

    pub fn is_member(&self, room: &str, id: ConnectionId) -> bool {
        self.rooms.get(room).is_some_and(|m| m.contains(&id))
    }

    pub fn member_count(&self, room: &str) -> usize {
        self.rooms.get(room).map_or(0, BTreeSet::len)
    }

    pub fn room_exists(&self, room: &str) -> bool {
        self.rooms.contains_key(room)
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    pub fn total_members(&self) -> usize {
        self.member_of.len()
    }
}
