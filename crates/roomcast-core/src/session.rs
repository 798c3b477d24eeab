//! Per-connection lifecycle, independent of any transport.
//!
//! ```text
//! Connected --Join--> Joined --Join--> Joined (ignored)
//!     |                  |
//!     +---Disconnect-----+--> Closed (terminal)
//! ```

use crate::net::messages::ClientEvent;

/// Lifecycle state of one connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Transport open, no display name, not in a room.
    Connected,
    /// Display name set and member of the room.
    Joined,
    /// Channel released. Terminal.
    Closed,
}

/// Inbound input to a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    Join { display_name: String },
    Disconnect,
}

impl From<ClientEvent> for Inbound {
    fn from(event: ClientEvent) -> Self {
        match event {
            ClientEvent::JoinRoom(display_name) => Inbound::Join { display_name },
        }
    }
}

/// Side effect the owner of a session must perform for a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Record the name, insert into the room, notify the other members.
    Announce { display_name: String },
    /// Remove the connection from every table.
    Release,
    /// Nothing to do.
    Ignore,
}

/// Result of feeding one `Inbound` to a `SessionState`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub next: SessionState,
    pub effect: Effect,
}

impl SessionState {
    /// Compute the next state and effect for an input. Pure: the caller
    /// applies the effect and then stores `next`.
    ///
    /// A repeated join is ignored, so a joined connection keeps its first
    /// display name and existing members are not notified twice.
    pub fn on_event(self, input: &Inbound) -> Transition {
        match (self, input) {
            (SessionState::Connected, Inbound::Join { display_name }) => Transition {
                next: SessionState::Joined,
                effect: Effect::Announce {
                    display_name: display_name.clone(),
                },
            },
            (SessionState::Joined, Inbound::Join { .. }) => Transition {
                next: SessionState::Joined,
                effect: Effect::Ignore,
            },
            (SessionState::Connected | SessionState::Joined, Inbound::Disconnect) => Transition {
                next: SessionState::Closed,
                effect: Effect::Release,
            },
            (SessionState::Closed, _) => Transition {
                next: SessionState::Closed,
                effect: Effect::Ignore,
            },
        }
    }

    pub fn is_closed(self) -> bool {
        self == SessionState::Closed
    }
}
