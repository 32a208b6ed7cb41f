//! # Game Mathematics
//!
//! Integer grid geometry, octile distances and world-space points.

use crate::{config, Position};
use serde::{Deserialize, Serialize};

/// Cost of an orthogonal step, scaled so diagonals stay integral.
pub const ORTHOGONAL_STEP_COST: i32 = 10;

/// Cost of a diagonal step (10 * sqrt(2), rounded).
pub const DIAGONAL_STEP_COST: i32 = 14;

/// Integer octile distance between two cells.
///
/// Used both as the A* step cost between neighbours and as its heuristic.
///
/// # Examples
///
/// ```
/// use delve::{octile_distance, Position};
///
/// assert_eq!(octile_distance(Position::new(0, 0), Position::new(1, 0)), 10);
/// assert_eq!(octile_distance(Position::new(0, 0), Position::new(1, 1)), 14);
/// assert_eq!(octile_distance(Position::new(0, 0), Position::new(3, 1)), 34);
/// ```
pub fn octile_distance(a: Position, b: Position) -> i32 {
    let dx = (a.x - b.x).abs();
    let dy = (a.y - b.y).abs();

    if dx > dy {
        DIAGONAL_STEP_COST * dy + ORTHOGONAL_STEP_COST * (dx - dy)
    } else {
        DIAGONAL_STEP_COST * dx + ORTHOGONAL_STEP_COST * (dy - dx)
    }
}

/// Inclusive rectangle of grid cells, `lower` is the south-west corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellRect {
    pub lower: Position,
    pub upper: Position,
}

impl CellRect {
    /// Creates a rectangle from its two inclusive corners.
    pub fn new(lower: Position, upper: Position) -> Self {
        Self { lower, upper }
    }

    /// Number of columns covered.
    pub fn width(&self) -> i32 {
        self.upper.x - self.lower.x + 1
    }

    /// Number of rows covered.
    pub fn height(&self) -> i32 {
        self.upper.y - self.lower.y + 1
    }

    /// A rectangle is degenerate when its upper corner lies below its lower one.
    pub fn is_degenerate(&self) -> bool {
        self.upper.x < self.lower.x || self.upper.y < self.lower.y
    }

    pub fn contains(&self, pos: Position) -> bool {
        pos.x >= self.lower.x && pos.x <= self.upper.x && pos.y >= self.lower.y && pos.y <= self.upper.y
    }

    /// Whether `other` lies entirely inside this rectangle.
    pub fn encloses(&self, other: &CellRect) -> bool {
        self.contains(other.lower) && self.contains(other.upper)
    }

    /// Moves the rectangle by `offset`.
    pub fn translated(&self, offset: Position) -> Self {
        Self::new(self.lower + offset, self.upper + offset)
    }

    /// Checks whether two rectangles share any cell once this one is grown by `margin`.
    ///
    /// A negative margin tolerates that many cells of overlap along shared edges.
    ///
    /// # Examples
    ///
    /// ```
    /// use delve::{CellRect, Position};
    ///
    /// let a = CellRect::new(Position::new(0, 0), Position::new(4, 4));
    /// let touching = CellRect::new(Position::new(5, 0), Position::new(9, 4));
    /// let shared_edge = CellRect::new(Position::new(4, 0), Position::new(8, 4));
    ///
    /// assert!(!a.overlaps(&touching, 0));
    /// assert!(a.overlaps(&shared_edge, 0));
    /// assert!(!a.overlaps(&shared_edge, -1));
    /// ```
    pub fn overlaps(&self, other: &CellRect, margin: i32) -> bool {
        intervals_overlap(
            self.lower.x - margin,
            self.upper.x + margin,
            other.lower.x,
            other.upper.x,
        ) && intervals_overlap(
            self.lower.y - margin,
            self.upper.y + margin,
            other.lower.y,
            other.upper.y,
        )
    }

    /// Iterates over every cell, row by row from the lower corner.
    pub fn cells(&self) -> impl Iterator<Item = Position> {
        let lower = self.lower;
        let upper = self.upper;
        (lower.y..=upper.y).flat_map(move |y| (lower.x..=upper.x).map(move |x| Position::new(x, y)))
    }
}

fn intervals_overlap(min1: i32, max1: i32, min2: i32, max2: i32) -> bool {
    min1.max(min2) <= max1.min(max2)
}

/// A point in continuous world space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct WorldPoint {
    pub x: f32,
    pub y: f32,
}

impl WorldPoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: WorldPoint) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Unit vector from `self` towards `target`, or zero when they coincide.
    pub fn direction_to(self, target: WorldPoint) -> WorldPoint {
        let distance = self.distance(target);
        if distance <= f32::EPSILON {
            return WorldPoint::default();
        }
        WorldPoint::new((target.x - self.x) / distance, (target.y - self.y) / distance)
    }

    /// The grid cell containing this point.
    pub fn to_cell(self) -> Position {
        Position::new(
            (self.x / config::CELL_SIZE).floor() as i32,
            (self.y / config::CELL_SIZE).floor() as i32,
        )
    }

    /// The centre of `cell` in world space.
    pub fn cell_center(cell: Position) -> Self {
        let half = config::CELL_SIZE * 0.5;
        Self::new(
            cell.x as f32 * config::CELL_SIZE + half,
            cell.y as f32 * config::CELL_SIZE + half,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_octile_distance_is_symmetric() {
        let a = Position::new(2, 7);
        let b = Position::new(-3, 1);
        assert_eq!(octile_distance(a, b), octile_distance(b, a));
        assert_eq!(octile_distance(a, a), 0);
        // 5 diagonal steps plus 1 orthogonal
        assert_eq!(octile_distance(a, b), 5 * 14 + 10);
    }

    #[test]
    fn test_cell_rect_dimensions() {
        let rect = CellRect::new(Position::new(-2, 3), Position::new(5, 6));
        assert_eq!(rect.width(), 8);
        assert_eq!(rect.height(), 4);
        assert_eq!(rect.cells().count(), 32);
        assert!(!rect.is_degenerate());
        assert!(CellRect::new(Position::new(1, 1), Position::new(0, 4)).is_degenerate());
    }

    #[test]
    fn test_cell_rect_overlap() {
        let a = CellRect::new(Position::new(0, 0), Position::new(9, 9));
        let inside = CellRect::new(Position::new(3, 3), Position::new(4, 4));
        let far = CellRect::new(Position::new(20, 20), Position::new(25, 25));
        let adjacent = CellRect::new(Position::new(10, 0), Position::new(12, 9));

        assert!(a.overlaps(&inside, 0));
        assert!(inside.overlaps(&a, 0));
        assert!(!a.overlaps(&far, 0));
        assert!(!a.overlaps(&adjacent, 0));
        assert!(a.overlaps(&adjacent, 1));
        assert!(a.encloses(&inside));
        assert!(!inside.encloses(&a));
    }

    #[test]
    fn test_cell_rect_translation() {
        let rect = CellRect::new(Position::new(0, 0), Position::new(3, 2));
        let moved = rect.translated(Position::new(10, -4));
        assert_eq!(moved.lower, Position::new(10, -4));
        assert_eq!(moved.upper, Position::new(13, -2));
        assert_eq!(moved.width(), rect.width());
    }

    #[test]
    fn test_world_point_cells() {
        let center = WorldPoint::cell_center(Position::new(3, -2));
        assert_eq!(center, WorldPoint::new(3.5, -1.5));
        assert_eq!(center.to_cell(), Position::new(3, -2));
    }

    #[test]
    fn test_world_point_direction() {
        let origin = WorldPoint::new(0.0, 0.0);
        let dir = origin.direction_to(WorldPoint::new(3.0, 4.0));
        assert!((dir.x - 0.6).abs() < 1e-6);
        assert!((dir.y - 0.8).abs() < 1e-6);
        assert_eq!(origin.direction_to(origin), WorldPoint::default());
    }
}
