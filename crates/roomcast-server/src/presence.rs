use std::sync::Arc;

use tokio::sync::RwLock;

use crate::membership::RoomTable;
use crate::registry::ConnectionRegistry;

/// Live connections and room membership, always locked together so a
/// membership change and the broadcast it triggers see the same snapshot.
#[derive(Default)]
pub struct Presence {
    pub registry: ConnectionRegistry,
    pub rooms: RoomTable,
}

pub type SharedPresence = Arc<RwLock<Presence>>;

impl Presence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> SharedPresence {
        Arc::new(RwLock::new(Self::new()))
    }

    /// Returns (active_rooms, joined_members).
    pub fn stats(&self) -> (usize, usize) {
        (self.rooms.room_count(), self.rooms.total_members())
    }

    pub fn connection_count(&self) -> usize {
        self.registry.len()
    }
}
