use std::collections::HashMap;

use roomcast_core::connection::ConnectionId;

use crate::error::PresenceError;
use crate::outbox::Outbox;

/// A live connection as seen by the server.
pub struct Connection {
    id: ConnectionId,
    display_name: Option<String>,
    outbox: Box<dyn Outbox>,
}

impl Connection {
    pub fn new(id: ConnectionId, outbox: impl Outbox + 'static) -> Self {
        Self {
            id,
            display_name: None,
            outbox: Box::new(outbox),
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    pub fn outbox(&self) -> &dyn Outbox {
        self.outbox.as_ref()
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("display_name", &self.display_name)
            .finish_non_exhaustive()
    }
}

/// Authoritative set of live connections.
#[derive(Default)]
pub struct ConnectionRegistry {
    connections: HashMap<ConnectionId, Connection>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a newly accepted connection.
    pub fn register(&mut self, connection: Connection) -> Result<(), PresenceError> {
        let id = connection.id;
        if self.connections.contains_key(&id) {
            return Err(PresenceError::DuplicateConnection(id));
        }
        self.connections.insert(id, connection);
        Ok(())
    }

    /// Remove a connection. Absent ids are not an error.
    pub fn unregister(&mut self, id: ConnectionId) -> Option<Connection> {
        self.connections.remove(&id)
    }

    pub fn get(&self, id: ConnectionId) -> Option<&Connection> {
        self.connections.get(&id)
    }

    /// Record a connection's display name. Returns `Ok(false)` if a name
    /// was already set; the first name stays.
    pub fn set_display_name(
        &mut self,
        id: ConnectionId,
        name: String,
    ) -> Result<bool, PresenceError> {
        let conn = self
            .connections
            .get_mut(&id)
            .ok_or(PresenceError::UnknownConnection(id))?;
        if conn.display_name.is_some() {
            return Ok(false);
        }
        conn.display_name = Some(name);
        Ok(true)
    }

    pub fn contains(&self, id: ConnectionId) -> bool {
        self.connections.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}
