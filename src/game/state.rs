//! # Game State Module
//!
//! Tracks which room of the built dungeon the player is in and turns room
//! transitions into [`GameEvent`]s.

use crate::{DelveError, DelveResult, Dungeon, GameEvent, Position, Room, RoomId, WorldPoint};
use log::debug;
use serde::{Deserialize, Serialize};

/// Progress counters derived from room events.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameStatistics {
    /// Rooms entered for the first time
    pub rooms_discovered: u32,
    /// Rooms cleared of enemies
    pub rooms_cleared: u32,
    /// Room transitions
    pub room_changes: u32,
}

impl GameStatistics {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Runtime state of one dungeon level.
///
/// Owns the built [`Dungeon`]. Room changes and clears are queued as events
/// until a consumer drains them.
#[derive(Debug, Clone)]
pub struct GameState {
    dungeon: Dungeon,
    current_room: RoomId,
    previous_room: Option<RoomId>,
    events: Vec<GameEvent>,
    pub statistics: GameStatistics,
}

impl GameState {
    /// Starts play in the dungeon's entrance.
    pub fn new(dungeon: Dungeon) -> Self {
        let current_room = dungeon.entrance_id();
        Self {
            dungeon,
            current_room,
            previous_room: None,
            events: Vec::new(),
            statistics: GameStatistics {
                rooms_discovered: 1,
                ..GameStatistics::default()
            },
        }
    }

    pub fn dungeon(&self) -> &Dungeon {
        &self.dungeon
    }

    pub fn dungeon_mut(&mut self) -> &mut Dungeon {
        &mut self.dungeon
    }

    pub fn current_room_id(&self) -> RoomId {
        self.current_room
    }

    pub fn previous_room_id(&self) -> Option<RoomId> {
        self.previous_room
    }

    pub fn current_room(&self) -> Option<&Room> {
        self.dungeon.room(self.current_room)
    }

    /// Where the player appears: the centre of the entrance room.
    pub fn player_spawn_position(&self) -> DelveResult<WorldPoint> {
        self.dungeon
            .entrance()
            .map(Room::center)
            .ok_or_else(|| DelveError::InvalidState("dungeon has no entrance room".to_string()))
    }

    /// Moves the player into `room_id`.
    ///
    /// Marks the room as previously visited and queues `RoomChanged`.
    /// Entering the current room again does nothing.
    pub fn enter_room(&mut self, room_id: RoomId) -> DelveResult<()> {
        if room_id == self.current_room {
            return Ok(());
        }

        let room = self
            .dungeon
            .room_mut(room_id)
            .ok_or_else(|| DelveError::InvalidState(format!("room {} is not in the dungeon", room_id)))?;

        if !room.is_previously_visited {
            room.is_previously_visited = true;
            self.statistics.rooms_discovered += 1;
        }

        debug!("Player entered room {} ({:?})", room_id, room.node_type);
        self.previous_room = Some(self.current_room);
        self.current_room = room_id;
        self.push_event(GameEvent::RoomChanged { room_id });
        Ok(())
    }

    /// Enters whichever room contains `cell`, if any.
    pub fn enter_room_at(&mut self, cell: Position) -> DelveResult<Option<RoomId>> {
        let Some(room_id) = self.dungeon.room_at_cell(cell).map(|room| room.id) else {
            return Ok(None);
        };
        self.enter_room(room_id)?;
        Ok(Some(room_id))
    }

    /// Marks `room_id` cleared of enemies and queues `RoomEnemiesDefeated`.
    pub fn clear_room(&mut self, room_id: RoomId) -> DelveResult<()> {
        let room = self
            .dungeon
            .room_mut(room_id)
            .ok_or_else(|| DelveError::InvalidState(format!("room {} is not in the dungeon", room_id)))?;

        if room.is_cleared_of_enemies {
            return Ok(());
        }

        room.is_cleared_of_enemies = true;
        self.push_event(GameEvent::RoomEnemiesDefeated { room_id });
        Ok(())
    }

    /// Hands all queued events to the caller.
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn pending_events(&self) -> &[GameEvent] {
        &self.events
    }

    pub fn boss_room(&self) -> Option<&Room> {
        self.dungeon.boss_room()
    }

    /// Whether the boss room doors may unlock.
    pub fn is_dungeon_clear_of_regular_enemies(&self) -> bool {
        self.dungeon.is_clear_of_regular_enemies()
    }

    pub fn room_at_cell(&self, cell: Position) -> Option<&Room> {
        self.dungeon.room_at_cell(cell)
    }

    fn push_event(&mut self, event: GameEvent) {
        self.update_statistics(&event);
        self.events.push(event);
    }

    fn update_statistics(&mut self, event: &GameEvent) {
        match event {
            GameEvent::RoomChanged { .. } => self.statistics.room_changes += 1,
            GameEvent::RoomEnemiesDefeated { .. } => self.statistics.rooms_cleared += 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::{demo, utils::create_rng};
    use crate::{DungeonBuilder, GenerationConfig, Generator};

    fn state() -> GameState {
        let level = demo::demo_level("Level 1");
        let classifier = demo::tile_sets();
        let config = GenerationConfig::new(21);
        let dungeon = DungeonBuilder::new(&level, &classifier)
            .generate(&config, &mut create_rng(&config))
            .unwrap();
        GameState::new(dungeon)
    }

    #[test]
    fn test_starts_in_entrance() {
        let state = state();
        let entrance = state.dungeon().entrance().unwrap();
        assert_eq!(state.current_room_id(), entrance.id);
        assert_eq!(state.player_spawn_position().unwrap(), entrance.center());
        assert!(state.pending_events().is_empty());
    }

    #[test]
    fn test_enter_room_marks_visited_and_emits_event() {
        let mut state = state();
        let entrance_id = state.current_room_id();
        let next = state
            .dungeon()
            .rooms()
            .find(|room| room.id != entrance_id)
            .unwrap()
            .id;

        state.enter_room(next).unwrap();
        assert!(state.current_room().unwrap().is_previously_visited);
        assert_eq!(state.previous_room_id(), Some(entrance_id));
        assert_eq!(state.drain_events(), vec![GameEvent::RoomChanged { room_id: next }]);
        assert!(state.drain_events().is_empty());

        // Re-entering the current room is a no-op.
        state.enter_room(next).unwrap();
        assert!(state.pending_events().is_empty());
        assert_eq!(state.statistics.rooms_discovered, 2);
    }

    #[test]
    fn test_enter_room_at_cell() {
        let mut state = state();
        let boss = state.boss_room().unwrap();
        let (boss_id, cell) = (boss.id, boss.lower_bounds);

        assert_eq!(state.enter_room_at(cell).unwrap(), Some(boss_id));
        assert_eq!(state.current_room_id(), boss_id);
        assert_eq!(state.enter_room_at(Position::new(-10_000, -10_000)).unwrap(), None);
    }

    #[test]
    fn test_clearing_rooms_unlocks_boss() {
        let mut state = state();
        assert!(!state.is_dungeon_clear_of_regular_enemies());

        let regular: Vec<RoomId> = state
            .dungeon()
            .rooms()
            .filter(|room| !room.node_type.is_boss_room() && !room.is_cleared_of_enemies)
            .map(|room| room.id)
            .collect();
        assert!(!regular.is_empty());

        for id in &regular {
            state.clear_room(*id).unwrap();
        }

        assert!(state.is_dungeon_clear_of_regular_enemies());
        let events = state.drain_events();
        assert_eq!(events.len(), regular.len());
        assert!(events
            .iter()
            .all(|event| matches!(event, GameEvent::RoomEnemiesDefeated { .. })));

        // Clearing twice emits nothing.
        state.clear_room(regular[0]).unwrap();
        assert!(state.drain_events().is_empty());
    }

    #[test]
    fn test_unknown_room_is_an_error() {
        let mut state = state();
        let unknown = uuid::Uuid::from_u128(1);
        assert!(matches!(state.enter_room(unknown), Err(DelveError::InvalidState(_))));
        assert!(state.clear_room(unknown).is_err());
    }
}
