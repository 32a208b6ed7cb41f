//! # Game Module
//!
//! Runtime representation of a built dungeon.
//!
//! This module contains the pieces that exist after a successful build:
//! - Grid positions and doorway orientations
//! - Room instances and the dungeon that owns them
//! - Room events and the game state that emits them

pub mod events;
pub mod room;
pub mod state;

pub use events::*;
pub use room::*;
pub use state::*;

use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Represents a grid cell. `y` grows towards the north.
///
/// # Examples
///
/// ```
/// use delve::Position;
///
/// let pos = Position::new(10, 5);
/// assert_eq!(pos.x, 10);
/// assert_eq!(pos.y, 5);
/// assert_eq!(pos + Position::new(1, -1), Position::new(11, 4));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    /// Creates a new position with the given coordinates.
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Returns the origin position (0, 0).
    pub fn origin() -> Self {
        Self::new(0, 0)
    }
}

/// Offsets of the Moore neighbourhood, ordered by x then y.
pub const NEIGHBOUR_OFFSETS: [Position; 8] = [
    Position { x: -1, y: -1 },
    Position { x: -1, y: 0 },
    Position { x: -1, y: 1 },
    Position { x: 0, y: -1 },
    Position { x: 0, y: 1 },
    Position { x: 1, y: -1 },
    Position { x: 1, y: 0 },
    Position { x: 1, y: 1 },
];

impl std::ops::Add for Position {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self::new(self.x + other.x, self.y + other.y)
    }
}

impl std::ops::Sub for Position {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self::new(self.x - other.x, self.y - other.y)
    }
}

/// The wall a doorway opens through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    North,
    East,
    South,
    West,
    None,
}

impl Orientation {
    /// Returns the orientation a doorway must have to connect to this one.
    ///
    /// # Examples
    ///
    /// ```
    /// use delve::Orientation;
    ///
    /// assert_eq!(Orientation::North.opposite(), Orientation::South);
    /// assert_eq!(Orientation::West.opposite(), Orientation::East);
    /// assert_eq!(Orientation::None.opposite(), Orientation::None);
    /// ```
    pub fn opposite(self) -> Orientation {
        match self {
            Orientation::North => Orientation::South,
            Orientation::South => Orientation::North,
            Orientation::East => Orientation::West,
            Orientation::West => Orientation::East,
            Orientation::None => Orientation::None,
        }
    }

    /// Converts the orientation to a one-cell step outward through the wall.
    pub fn to_delta(self) -> Position {
        match self {
            Orientation::North => Position::new(0, 1),
            Orientation::South => Position::new(0, -1),
            Orientation::East => Position::new(1, 0),
            Orientation::West => Position::new(-1, 0),
            Orientation::None => Position::origin(),
        }
    }

    /// North and south doorways sit in horizontal walls.
    pub fn is_north_south(self) -> bool {
        matches!(self, Orientation::North | Orientation::South)
    }

    /// Returns the 4 usable orientations.
    pub fn cardinal() -> [Orientation; 4] {
        [
            Orientation::North,
            Orientation::East,
            Orientation::South,
            Orientation::West,
        ]
    }
}

/// Unique identifier for placed rooms.
pub type RoomId = Uuid;

/// Draws a room ID from the generation RNG so seeded builds stay reproducible.
pub fn new_room_id<R: Rng + ?Sized>(rng: &mut R) -> RoomId {
    uuid::Builder::from_random_bytes(rng.gen()).into_uuid()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn test_position_creation() {
        let pos = Position::new(5, 10);
        assert_eq!(pos.x, 5);
        assert_eq!(pos.y, 10);
    }

    #[test]
    fn test_position_arithmetic() {
        let pos1 = Position::new(5, 10);
        let pos2 = Position::new(3, 2);
        assert_eq!(pos1 + pos2, Position::new(8, 12));
        assert_eq!(pos1 - pos2, Position::new(2, 8));
    }

    #[test]
    fn test_orientation_opposites_are_involutions() {
        for orientation in Orientation::cardinal() {
            assert_ne!(orientation.opposite(), orientation);
            assert_eq!(orientation.opposite().opposite(), orientation);
            assert_eq!(
                orientation.to_delta() + orientation.opposite().to_delta(),
                Position::origin()
            );
        }
    }

    #[test]
    fn test_room_ids_follow_the_seed() {
        let mut rng_a = StdRng::seed_from_u64(7);
        let mut rng_b = StdRng::seed_from_u64(7);
        let a = new_room_id(&mut rng_a);
        assert_eq!(a, new_room_id(&mut rng_b));
        assert_ne!(a, new_room_id(&mut rng_a));
    }
}
