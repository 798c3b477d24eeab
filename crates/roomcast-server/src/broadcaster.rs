use roomcast_core::connection::ConnectionId;
use roomcast_core::net::messages::JoinNotice;

use crate::membership::RoomTable;
use crate::registry::ConnectionRegistry;

/// Deliver a join notice for `joining` to every other member of `room`.
///
/// Must be called after `joining` was inserted into `room`, with both tables
/// borrowed from the same guard as that insert. Delivery is fire-and-forget:
/// a recipient that is gone or not draining is skipped. Returns the number of
/// recipients the notice was handed to.
pub fn announce_join(
    registry: &ConnectionRegistry,
    rooms: &RoomTable,
    room: &str,
    joining: ConnectionId,
    display_name: &str,
) -> usize {
    let recipients = rooms.members_except(room, joining);
    if recipients.is_empty() {
        return 0;
    }

    let notice = JoinNotice::new(display_name);
    let mut delivered = 0;
    for recipient in recipients {
        let Some(conn) = registry.get(recipient) else {
            tracing::debug!(
                connection_id = %recipient, room,
                "Skipping join notice for unregistered member"
            );
            continue;
        };
        match conn.outbox().send(&notice) {
            Ok(()) => delivered += 1,
            Err(e) => {
                tracing::debug!(
                    connection_id = %recipient, room, error = %e,
                    "Dropping join notice"
                );
            },
        }
    }
    delivered
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outbox::testing::RecordingOutbox;
    use crate::registry::Connection;

    const ROOM: &str = "group";

    fn member(
        registry: &mut ConnectionRegistry,
        rooms: &mut RoomTable,
    ) -> (ConnectionId, RecordingOutbox) {
        let id = ConnectionId::new();
        let outbox = RecordingOutbox::new();
        registry
            .register(Connection::new(id, outbox.clone()))
            .unwrap();
        rooms.join(ROOM, id).unwrap();
        (id, outbox)
    }

    #[test]
    fn lone_joiner_notifies_nobody() {
        let mut registry = ConnectionRegistry::new();
        let mut rooms = RoomTable::new();
        let (alice, alice_box) = member(&mut registry, &mut rooms);

        assert_eq!(announce_join(&registry, &rooms, ROOM, alice, "Alice"), 0);
        assert!(alice_box.received().is_empty());
    }

    #[test]
    fn existing_members_receive_notice_but_joiner_does_not() {
        let mut registry = ConnectionRegistry::new();
        let mut rooms = RoomTable::new();
        let (_alice, alice_box) = member(&mut registry, &mut rooms);
        let (_bob, bob_box) = member(&mut registry, &mut rooms);
        let (cara, cara_box) = member(&mut registry, &mut rooms);

        assert_eq!(announce_join(&registry, &rooms, ROOM, cara, "Cara"), 2);
        assert_eq!(alice_box.received(), vec!["Cara"]);
        assert_eq!(bob_box.received(), vec!["Cara"]);
        assert!(cara_box.received().is_empty());
    }

    #[test]
    fn closed_recipient_is_skipped() {
        let mut registry = ConnectionRegistry::new();
        let mut rooms = RoomTable::new();
        let (_alice, alice_box) = member(&mut registry, &mut rooms);
        let (_bob, bob_box) = member(&mut registry, &mut rooms);
        let (cara, _) = member(&mut registry, &mut rooms);

        alice_box.close();
        assert_eq!(announce_join(&registry, &rooms, ROOM, cara, "Cara"), 1);
        assert!(alice_box.received().is_empty());
        assert_eq!(bob_box.received(), vec!["Cara"]);
    }

    #[test]
    fn member_missing_from_registry_is_skipped() {
        let mut registry = ConnectionRegistry::new();
        let mut rooms = RoomTable::new();
        let (_alice, alice_box) = member(&mut registry, &mut rooms);
        let (bob, _) = member(&mut registry, &mut rooms);
        registry.unregister(bob);

        let (cara, _) = member(&mut registry, &mut rooms);
        assert_eq!(announce_join(&registry, &rooms, ROOM, cara, "Cara"), 1);
        assert_eq!(alice_box.received(), vec!["Cara"]);
    }

    #[test]
    fn notice_stays_inside_its_room() {
        let mut registry = ConnectionRegistry::new();
        let mut rooms = RoomTable::new();
        let (_alice, alice_box) = member(&mut registry, &mut rooms);

        let outsider = ConnectionId::new();
        let outsider_box = RecordingOutbox::new();
        registry
            .register(Connection::new(outsider, outsider_box.clone()))
            .unwrap();
        rooms.join("side", outsider).unwrap();

        let (bob, _) = member(&mut registry, &mut rooms);
        announce_join(&registry, &rooms, ROOM, bob, "Bob");
        assert_eq!(alice_box.received(), vec!["Bob"]);
        assert!(outsider_box.received().is_empty());
    }
}
