//! # Room Templates
//!
//! Immutable authored rooms: bounds, doorways, spawn cells, tiles and the
//! node type they can stand in for.

use crate::{CellRect, DelveError, DelveResult, Doorway, Position, TileLayers};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// The role a room node (or a template filling it) plays in the dungeon.
///
/// Node graphs only use the generic `Corridor`; templates are authored as
/// either `CorridorNS` or `CorridorEW`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomNodeType {
    /// Unassigned node, ignored by the builder
    None,
    /// The dungeon's single starting room
    Entrance,
    /// Graph-only corridor placeholder
    Corridor,
    /// Corridor running north to south
    #[serde(rename = "corridor_ns")]
    CorridorNS,
    /// Corridor running east to west
    #[serde(rename = "corridor_ew")]
    CorridorEW,
    /// An ordinary room
    Standard,
    /// The level's boss room
    BossRoom,
}

impl RoomNodeType {
    pub fn is_corridor(self) -> bool {
        matches!(
            self,
            RoomNodeType::Corridor | RoomNodeType::CorridorNS | RoomNodeType::CorridorEW
        )
    }

    pub fn is_entrance(self) -> bool {
        self == RoomNodeType::Entrance
    }

    pub fn is_boss_room(self) -> bool {
        self == RoomNodeType::BossRoom
    }

    pub fn is_none(self) -> bool {
        self == RoomNodeType::None
    }

    /// Whether a template of type `self` may fill a graph node of type `node`.
    ///
    /// # Examples
    ///
    /// ```
    /// use delve::RoomNodeType;
    ///
    /// assert!(RoomNodeType::CorridorNS.can_fill(RoomNodeType::Corridor));
    /// assert!(RoomNodeType::BossRoom.can_fill(RoomNodeType::BossRoom));
    /// assert!(!RoomNodeType::Standard.can_fill(RoomNodeType::Corridor));
    /// ```
    pub fn can_fill(self, node: RoomNodeType) -> bool {
        match node {
            RoomNodeType::Corridor => {
                matches!(self, RoomNodeType::CorridorNS | RoomNodeType::CorridorEW)
            }
            RoomNodeType::None => false,
            other => self == other,
        }
    }
}

/// How many enemies a room spawns on one dungeon level, and how quickly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomEnemySpawnParameters {
    /// Name of the dungeon level these parameters apply to
    pub level_name: String,
    pub min_total_enemies: u32,
    pub max_total_enemies: u32,
    pub min_concurrent_enemies: u32,
    pub max_concurrent_enemies: u32,
    /// Seconds
    pub min_spawn_interval: u32,
    /// Seconds
    pub max_spawn_interval: u32,
}

impl RoomEnemySpawnParameters {
    /// Checks that every min/max pair is ordered and concurrency is positive.
    pub fn validate(&self) -> DelveResult<()> {
        let ranges = [
            ("total enemies", self.min_total_enemies, self.max_total_enemies),
            (
                "concurrent enemies",
                self.min_concurrent_enemies,
                self.max_concurrent_enemies,
            ),
            ("spawn interval", self.min_spawn_interval, self.max_spawn_interval),
        ];

        for (name, min, max) in ranges {
            if min > max {
                return Err(DelveError::InvalidConfig(format!(
                    "spawn parameters for level '{}': minimum {} ({}) exceeds maximum ({})",
                    self.level_name, name, min, max
                )));
            }
        }

        if self.max_total_enemies > 0 && self.min_concurrent_enemies == 0 {
            return Err(DelveError::InvalidConfig(format!(
                "spawn parameters for level '{}': concurrent enemies must be positive",
                self.level_name
            )));
        }

        Ok(())
    }

    /// Picks the total number of enemies for one visit.
    pub fn total_enemies_to_spawn<R: Rng + ?Sized>(&self, rng: &mut R) -> u32 {
        rng.gen_range(self.min_total_enemies..=self.max_total_enemies)
    }

    /// Picks how many enemies may be alive at once.
    pub fn concurrent_enemies<R: Rng + ?Sized>(&self, rng: &mut R) -> u32 {
        rng.gen_range(self.min_concurrent_enemies..=self.max_concurrent_enemies)
    }

    /// Picks the delay before the next spawn, in seconds.
    pub fn spawn_interval<R: Rng + ?Sized>(&self, rng: &mut R) -> u32 {
        rng.gen_range(self.min_spawn_interval..=self.max_spawn_interval)
    }
}

/// An authored room, loaded once and never mutated.
///
/// All coordinates are template-local tile coordinates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomTemplate {
    /// Unique identifier of the template asset
    pub id: String,
    pub node_type: RoomNodeType,
    pub lower_bounds: Position,
    pub upper_bounds: Position,
    pub doorways: Vec<Doorway>,
    /// Cells where enemies and chests may appear
    #[serde(default)]
    pub spawn_positions: Vec<Position>,
    #[serde(default)]
    pub tiles: TileLayers,
    #[serde(default)]
    pub enemy_spawn_parameters: Vec<RoomEnemySpawnParameters>,
}

impl RoomTemplate {
    /// The template's tile rectangle.
    pub fn bounds(&self) -> CellRect {
        CellRect::new(self.lower_bounds, self.upper_bounds)
    }

    pub fn width(&self) -> i32 {
        self.bounds().width()
    }

    pub fn height(&self) -> i32 {
        self.bounds().height()
    }

    /// Spawn parameters authored for the named dungeon level.
    pub fn spawn_parameters_for(&self, level_name: &str) -> Option<&RoomEnemySpawnParameters> {
        self.enemy_spawn_parameters
            .iter()
            .find(|params| params.level_name == level_name)
    }

    /// Startup validation of a single template.
    pub fn validate(&self) -> DelveResult<()> {
        if self.id.is_empty() {
            return Err(DelveError::InvalidConfig(
                "room template with an empty id".to_string(),
            ));
        }

        let bounds = self.bounds();
        if bounds.is_degenerate() {
            return Err(DelveError::InvalidConfig(format!(
                "room template '{}' has degenerate bounds",
                self.id
            )));
        }

        if self.node_type == RoomNodeType::Corridor {
            return Err(DelveError::InvalidConfig(format!(
                "room template '{}' must be CorridorNS or CorridorEW, not Corridor",
                self.id
            )));
        }

        for doorway in &self.doorways {
            if !bounds.contains(doorway.position) {
                return Err(DelveError::InvalidConfig(format!(
                    "room template '{}' has doorway {:?} outside its bounds",
                    self.id, doorway.position
                )));
            }
        }

        for spawn in &self.spawn_positions {
            if !bounds.contains(*spawn) {
                return Err(DelveError::InvalidConfig(format!(
                    "room template '{}' has spawn position {:?} outside its bounds",
                    self.id, spawn
                )));
            }
        }

        for params in &self.enemy_spawn_parameters {
            params.validate()?;
        }

        Ok(())
    }
}
