//! # Delve
//!
//! Dungeon construction and enemy navigation for a room-based roguelike shooter.
//!
//! ## Architecture Overview
//!
//! The crate turns authored content into a playable dungeon and lets enemies
//! move through it. Rendering, physics and input belong to the host engine;
//! everything here is plain data and algorithms:
//!
//! - **Generation**: room templates with doorways, room node graphs and the
//!   backtracking [`DungeonBuilder`] that places templates so their doorways line up
//! - **Game**: the built [`Dungeon`], its [`Room`] instances and the [`GameState`]
//!   that tracks the current room and emits room events
//! - **Navigation**: per-room [`ObstacleGrid`]s, the [`AStar`] grid search and the
//!   staggered [`EnemyNavigator`] that steps enemies along returned paths
//! - **Utilities**: grid geometry and distance helpers shared by the above
//!
//! Everything is single threaded. A dungeon is built synchronously within one
//! call, and pathfinding runs to completion per request.

pub mod game;
pub mod generation;
pub mod navigation;
pub mod utils;

// Core module re-exports
pub use game::*;
pub use generation::*;
pub use navigation::*;
pub use utils::*;

// Explicit re-exports for commonly used types
pub use game::{
    // From events
    GameEvent,
    // From state
    GameState,
    // From room
    DoorPlacement,
    Dungeon,
    DoorwayLink,
    Room,
    // From mod
    Orientation,
    Position,
    RoomId,
};

pub use generation::{
    Doorway, DungeonBuilder, DungeonLevel, GenerationConfig, Generator, LevelCatalog,
    RoomNode, RoomNodeGraph, RoomNodeType, RoomTemplate,
};

pub use navigation::{AStar, EnemyNavigator, NavigationConfig, ObstacleGrid, PathStack};

/// Core error type for the Delve crate.
#[derive(thiserror::Error, Debug)]
pub enum DelveError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// Authored content failed startup validation
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// No valid layout was found within the retry budget
    #[error("Dungeon build exhausted for level '{level}' after {attempts} attempts")]
    BuildExhausted { level: String, attempts: u32 },

    /// Runtime state is invalid for the requested operation
    #[error("Invalid state: {0}")]
    InvalidState(String),
}

/// Result type used throughout the Delve codebase.
pub type DelveResult<T> = Result<T, DelveError>;

/// Version information for the crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Tuning constants shared by generation and navigation.
pub mod config {
    /// Movement penalty of an ordinary walkable cell
    pub const DEFAULT_MOVEMENT_PENALTY: i32 = 40;

    /// Movement penalty of a cell under the preferred-path tile
    pub const PREFERRED_PATH_MOVEMENT_PENALTY: i32 = 1;

    /// Number of room node graphs tried before a build is declared failed
    pub const MAX_DUNGEON_BUILD_ATTEMPTS: u32 = 10;

    /// Room placements tested per chosen node graph
    pub const MAX_PLACEMENT_ATTEMPTS_PER_GRAPH: u32 = 1000;

    /// Maximum corridor children of a single room node
    pub const MAX_CHILD_CORRIDORS: usize = 3;

    /// Enemies are spread over this many frames when rebuilding paths
    pub const FRAMES_TO_SPREAD_PATHFINDING_OVER: u64 = 60;

    /// Distance the player must move before enemies rebuild their paths
    pub const PLAYER_MOVE_DISTANCE_TO_REBUILD_PATH: f32 = 3.0;

    /// Seconds between forced path rebuilds
    pub const ENEMY_PATH_REBUILD_COOLDOWN: f32 = 2.0;

    /// Distance at which an enemy counts as having reached a waypoint
    pub const WAYPOINT_ARRIVAL_DISTANCE: f32 = 0.2;

    /// World units per grid cell
    pub const CELL_SIZE: f32 = 1.0;
}
