//! # Doorways
//!
//! Connection points on a room template's walls.

use crate::{Orientation, Position};
use serde::{Deserialize, Serialize};

/// A designated opening in a room template.
///
/// `position` is the middle cell of the opening in template-local
/// coordinates. The copy region describes the tiles that are mirrored across
/// the opening when it is left unused and has to be sealed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Doorway {
    pub position: Position,
    pub orientation: Orientation,
    /// Top-left cell of the region copied when sealing
    pub copy_start: Position,
    pub copy_width: i32,
    pub copy_height: i32,
    #[serde(skip)]
    pub is_connected: bool,
    #[serde(skip)]
    pub is_unavailable: bool,
}

impl Doorway {
    /// Creates an unconnected doorway.
    ///
    /// # Examples
    ///
    /// ```
    /// use delve::{Doorway, Orientation, Position};
    ///
    /// let doorway = Doorway::new(Position::new(5, 9), Orientation::North, Position::new(3, 9), 3, 1);
    /// assert!(doorway.is_free());
    /// ```
    pub fn new(
        position: Position,
        orientation: Orientation,
        copy_start: Position,
        copy_width: i32,
        copy_height: i32,
    ) -> Self {
        Self {
            position,
            orientation,
            copy_start,
            copy_width,
            copy_height,
            is_connected: false,
            is_unavailable: false,
        }
    }

    /// A free doorway is neither connected nor ruled out for this build.
    pub fn is_free(&self) -> bool {
        !self.is_connected && !self.is_unavailable
    }

    /// Checks whether this doorway can be joined to `other`.
    ///
    /// Orientations must be exact opposites and both doorways must be free.
    ///
    /// # Examples
    ///
    /// ```
    /// use delve::{Doorway, Orientation, Position};
    ///
    /// let north = Doorway::new(Position::new(5, 9), Orientation::North, Position::new(3, 9), 3, 1);
    /// let south = Doorway::new(Position::new(2, 0), Orientation::South, Position::new(0, 0), 3, 1);
    /// let east = Doorway::new(Position::new(9, 4), Orientation::East, Position::new(9, 6), 1, 3);
    ///
    /// assert!(north.is_compatible_with(&south));
    /// assert!(!north.is_compatible_with(&east));
    /// ```
    pub fn is_compatible_with(&self, other: &Doorway) -> bool {
        self.orientation != Orientation::None
            && self.orientation.opposite() == other.orientation
            && self.is_free()
            && other.is_free()
    }

    /// Clears the per-build flags.
    pub fn reset(&mut self) {
        self.is_connected = false;
        self.is_unavailable = false;
    }
}
