use std::collections::{HashMap, HashSet};

use parking_lot::Mutex;

use super::ConnectionId;

/// Tracks which connections are currently in which room.
///
/// Membership is a set, so joining a room twice is the same as joining it
/// once. A room with no members left is removed entirely.
#[derive(Default)]
pub struct PresenceRegistry {
    rooms: Mutex<HashMap<String, HashSet<ConnectionId>>>,
}

impl PresenceRegistry {
    /// Adds a connection to a room, returning the member count afterwards
    pub fn join(&self, room_id: &str, connection_id: ConnectionId) -> usize {
        let mut rooms = self.rooms.lock();

        let members = rooms.entry(room_id.to_string()).or_default();
        members.insert(connection_id);
        members.len()
    }

    /// Removes a connection from a room, returning the member count
    /// afterwards. Returns [None] if the connection wasn't in the room.
    pub fn leave(&self, room_id: &str, connection_id: ConnectionId) -> Option<usize> {
        let mut rooms = self.rooms.lock();

        let members = rooms.get_mut(room_id)?;

        if !members.remove(&connection_id) {
            return None;
        }

        let remaining = members.len();

        if remaining == 0 {
            rooms.remove(room_id);
        }

        Some(remaining)
    }

    /// Returns the connections currently in a room
    pub fn members(&self, room_id: &str) -> Vec<ConnectionId> {
        self.rooms
            .lock()
            .get(room_id)
            .map(|members| members.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn count(&self, room_id: &str) -> usize {
        self.rooms
            .lock()
            .get(room_id)
            .map(|members| members.len())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joining_twice_counts_once() {
        let registry = PresenceRegistry::default();

        assert_eq!(registry.join("room", ConnectionId(1)), 1);
        assert_eq!(registry.join("room", ConnectionId(1)), 1);
        assert_eq!(registry.join("room", ConnectionId(2)), 2);
    }

    #[test]
    fn leaving_a_room_you_never_joined_is_none() {
        let registry = PresenceRegistry::default();

        registry.join("room", ConnectionId(1));

        assert_eq!(registry.leave("room", ConnectionId(2)), None);
        assert_eq!(registry.leave("other", ConnectionId(1)), None);
        assert_eq!(registry.count("room"), 1);
    }

    #[test]
    fn an_emptied_room_is_removed() {
        let registry = PresenceRegistry::default();

        registry.join("room", ConnectionId(1));
        assert_eq!(registry.leave("room", ConnectionId(1)), Some(0));

        assert!(registry.rooms.lock().is_empty());
    }

    #[test]
    fn rooms_are_tracked_separately() {
        let registry = PresenceRegistry::default();

        registry.join("a", ConnectionId(1));
        registry.join("a", ConnectionId(2));
        registry.join("b", ConnectionId(1));

        assert_eq!(registry.count("a"), 2);
        assert_eq!(registry.count("b"), 1);

        let mut members = registry.members("a");
        members.sort();
        assert_eq!(members, vec![ConnectionId(1), ConnectionId(2)]);
    }
}
