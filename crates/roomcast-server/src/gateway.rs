use std::sync::Arc;

use roomcast_core::connection::ConnectionId;
use roomcast_core::session::{Effect, Inbound, SessionState};

use crate::broadcaster::announce_join;
use crate::error::PresenceError;
use crate::outbox::Outbox;
use crate::presence::{Presence, SharedPresence};
use crate::registry::Connection;

/// Accepts connections into the shared presence tables. One gateway serves
/// every connection of a server; tests build as many as they like.
#[derive(Clone)]
pub struct Gateway {
    presence: SharedPresence,
    room: Arc<str>,
}

impl Gateway {
    pub fn new(presence: SharedPresence, room: impl Into<Arc<str>>) -> Self {
        Self {
            presence,
            room: room.into(),
        }
    }

    pub fn room(&self) -> &str {
        &self.room
    }

    pub fn presence(&self) -> &SharedPresence {
        &self.presence
    }

    /// Register a freshly accepted transport connection.
    pub async fn accept(&self, outbox: impl Outbox + 'static) -> Result<Session, PresenceError> {
        let id = ConnectionId::new();
        {
            let mut presence = self.presence.write().await;
            presence.registry.register(Connection::new(id, outbox))?;
        }
        tracing::info!(connection_id = %id, "A user connected");
        Ok(Session {
            id,
            state: SessionState::Connected,
            presence: Arc::clone(&self.presence),
            room: Arc::clone(&self.room),
        })
    }
}

/// Per-connection handler driving the session state machine against the
/// shared presence tables.
pub struct Session {
    id: ConnectionId,
    state: SessionState,
    presence: SharedPresence,
    room: Arc<str>,
}

impl Session {
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Apply one inbound event. Returns the number of members that were
    /// handed a join notice.
    pub async fn handle(&mut self, input: Inbound) -> usize {
        let transition = self.state.on_event(&input);
        match transition.effect {
            Effect::Announce { display_name } => {
                match self.announce(display_name).await {
                    Some(notified) => {
                        self.state = transition.next;
                        notified
                    },
                    None => 0,
                }
            },
            Effect::Release => {
                self.release().await;
                self.state = transition.next;
                0
            },
            Effect::Ignore => {
                if matches!(input, Inbound::Join { .. }) {
                    tracing::debug!(
                        connection_id = %self.id,
                        state = ?self.state,
                        "Ignoring join"
                    );
                }
                self.state = transition.next;
                0
            },
        }
    }

    /// Shorthand for `handle(Inbound::Disconnect)`.
    pub async fn disconnect(&mut self) {
        self.handle(Inbound::Disconnect).await;
    }

    /// Insert, name, and broadcast under one write guard. `None` leaves the
    /// session in `Connected` with both tables untouched.
    async fn announce(&self, display_name: String) -> Option<usize> {
        let mut guard = self.presence.write().await;
        let Presence { registry, rooms } = &mut *guard;

        if !registry.contains(self.id) {
            let e = PresenceError::UnknownConnection(self.id);
            tracing::warn!(connection_id = %self.id, error = %e, "Join rejected");
            return None;
        }
        // Membership goes first: a refused join must not consume the
        // set-once display name.
        let inserted = match rooms.join(&self.room, self.id) {
            Ok(inserted) => inserted,
            Err(e) => {
                tracing::warn!(connection_id = %self.id, error = %e, "Join rejected");
                return None;
            },
        };
        if let Err(e) = registry.set_display_name(self.id, display_name.clone()) {
            if inserted {
                rooms.leave(&self.room, self.id);
            }
            tracing::warn!(connection_id = %self.id, error = %e, "Join rejected");
            return None;
        }

        tracing::info!(
            connection_id = %self.id,
            room = %self.room,
            display_name = %display_name,
            "{display_name} joined the room"
        );

        Some(announce_join(
            registry,
            rooms,
            &self.room,
            self.id,
            &display_name,
        ))
    }

    async fn release(&self) {
        let mut guard = self.presence.write().await;
        let left = guard.rooms.leave_any(self.id);
        guard.registry.unregister(self.id);
        drop(guard);

        tracing::info!(
            connection_id = %self.id,
            room = left.as_deref().unwrap_or("-"),
            "Connection closed"
        );
    }
}
