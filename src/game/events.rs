//! # Room Events
//!
//! One-way notifications emitted by the [`GameState`](crate::GameState) for
//! spawners, music and minimap systems.

use crate::RoomId;
use serde::{Deserialize, Serialize};

/// Something that happened to a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameEvent {
    /// The player entered a different room
    RoomChanged { room_id: RoomId },
    /// Every enemy of the room has been defeated
    RoomEnemiesDefeated { room_id: RoomId },
}

impl GameEvent {
    /// The room the event is about.
    pub fn room_id(&self) -> RoomId {
        match self {
            GameEvent::RoomChanged { room_id } | GameEvent::RoomEnemiesDefeated { room_id } => *room_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_event_room_id() {
        let id = Uuid::from_u128(5);
        assert_eq!(GameEvent::RoomChanged { room_id: id }.room_id(), id);
        assert_eq!(GameEvent::RoomEnemiesDefeated { room_id: id }.room_id(), id);
    }

    #[test]
    fn test_event_serialization() {
        let event = GameEvent::RoomChanged {
            room_id: Uuid::from_u128(9),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("RoomChanged"));
        let restored: GameEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, event);
    }
}
