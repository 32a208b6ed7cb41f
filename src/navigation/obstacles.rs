//! # Room Obstacle Grids
//!
//! Per-room cost grids read by the pathfinder. The static layer is baked
//! once from the collision tiles; the dynamic layer tracks movable objects
//! and is rebuilt synchronously whenever one of them moves.

use crate::{config, CellRect, DelveError, DelveResult, Position, TileId, TileLayer};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Decides how collision tiles affect movement.
pub trait TileClassifier {
    /// Tiles nobody can walk through.
    fn is_unwalkable(&self, tile: TileId) -> bool;

    /// The tile marking routes enemies should prefer.
    fn is_preferred_path(&self, tile: TileId) -> bool;
}

/// A [`TileClassifier`] backed by explicit tile id sets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileSets {
    pub unwalkable: HashSet<TileId>,
    pub preferred_path: Option<TileId>,
}

impl TileSets {
    pub fn new(unwalkable: impl IntoIterator<Item = TileId>, preferred_path: Option<TileId>) -> Self {
        Self {
            unwalkable: unwalkable.into_iter().collect(),
            preferred_path,
        }
    }
}

impl TileClassifier for TileSets {
    fn is_unwalkable(&self, tile: TileId) -> bool {
        self.unwalkable.contains(&tile)
    }

    fn is_preferred_path(&self, tile: TileId) -> bool {
        self.preferred_path == Some(tile)
    }
}

/// Dense integer matrix indexed by room-local cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PenaltyGrid {
    width: i32,
    height: i32,
    cells: Vec<i32>,
}

impl PenaltyGrid {
    pub fn filled(width: i32, height: i32, value: i32) -> Self {
        let width = width.max(0);
        let height = height.max(0);
        Self {
            width,
            height,
            cells: vec![value; (width * height) as usize],
        }
    }

    fn index_of(&self, local: Position) -> Option<usize> {
        if local.x >= 0 && local.y >= 0 && local.x < self.width && local.y < self.height {
            Some((local.y * self.width + local.x) as usize)
        } else {
            None
        }
    }

    pub fn get(&self, local: Position) -> Option<i32> {
        self.index_of(local).map(|index| self.cells[index])
    }

    /// Writes `value` at `local`. Cells outside the grid are ignored.
    pub fn set(&mut self, local: Position, value: i32) {
        if let Some(index) = self.index_of(local) {
            self.cells[index] = value;
        }
    }

    pub fn fill(&mut self, value: i32) {
        self.cells.iter_mut().for_each(|cell| *cell = value);
    }
}

/// Handle of a movable object registered with an [`ObstacleGrid`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MovableId(pub u32);

/// The two cost layers of one room.
///
/// `movement_penalty` holds 0 for walls, 1 for the preferred path and the
/// default penalty elsewhere. `item_obstacle` holds 0 under movable objects
/// and the default penalty elsewhere. Both are indexed by world cell minus
/// `origin`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObstacleGrid {
    origin: Position,
    movement_penalty: PenaltyGrid,
    item_obstacle: PenaltyGrid,
    movables: BTreeMap<MovableId, CellRect>,
    next_movable: u32,
}

impl ObstacleGrid {
    /// Creates a grid covering `bounds` with every cell at the default penalty.
    ///
    /// # Examples
    ///
    /// ```
    /// use delve::{CellRect, ObstacleGrid, Position};
    ///
    /// let grid = ObstacleGrid::new(CellRect::new(Position::new(10, 10), Position::new(14, 14)));
    /// assert_eq!(grid.width(), 5);
    /// assert_eq!(grid.movement_penalty(Position::new(0, 0)), Some(40));
    /// assert!(grid.is_walkable(Position::new(4, 4)));
    /// assert!(!grid.is_walkable(Position::new(5, 4)));
    /// ```
    pub fn new(bounds: CellRect) -> Self {
        let width = bounds.width();
        let height = bounds.height();
        Self {
            origin: bounds.lower,
            movement_penalty: PenaltyGrid::filled(width, height, config::DEFAULT_MOVEMENT_PENALTY),
            item_obstacle: PenaltyGrid::filled(width, height, config::DEFAULT_MOVEMENT_PENALTY),
            movables: BTreeMap::new(),
            next_movable: 0,
        }
    }

    /// World cell of local `(0, 0)`.
    pub fn origin(&self) -> Position {
        self.origin
    }

    pub fn width(&self) -> i32 {
        self.movement_penalty.width
    }

    pub fn height(&self) -> i32 {
        self.movement_penalty.height
    }

    /// World-space rectangle covered by the grid.
    pub fn bounds(&self) -> CellRect {
        CellRect::new(
            self.origin,
            self.origin + Position::new(self.width() - 1, self.height() - 1),
        )
    }

    pub fn to_local(&self, world_cell: Position) -> Position {
        world_cell - self.origin
    }

    pub fn to_world(&self, local: Position) -> Position {
        local + self.origin
    }

    pub fn contains_local(&self, local: Position) -> bool {
        local.x >= 0 && local.y >= 0 && local.x < self.width() && local.y < self.height()
    }

    pub fn movement_penalty(&self, local: Position) -> Option<i32> {
        self.movement_penalty.get(local)
    }

    pub fn item_obstacle(&self, local: Position) -> Option<i32> {
        self.item_obstacle.get(local)
    }

    /// Overrides one static cell. Out-of-range cells are ignored.
    pub fn set_movement_penalty(&mut self, local: Position, penalty: i32) {
        self.movement_penalty.set(local, penalty);
    }

    /// A cell is walkable when neither layer is zero. Cells outside are not.
    pub fn is_walkable(&self, local: Position) -> bool {
        matches!(
            (self.movement_penalty(local), self.item_obstacle(local)),
            (Some(penalty), Some(item)) if penalty != 0 && item != 0
        )
    }

    /// Bakes the static layer from a room's collision tiles.
    ///
    /// `template_lower` maps local cell `(0, 0)` to the tile layer's
    /// template-local coordinates. The preferred-path tile wins over an
    /// unwalkable classification of the same tile.
    pub fn bake_static(
        &mut self,
        collision: &TileLayer,
        template_lower: Position,
        classifier: &dyn TileClassifier,
    ) {
        self.movement_penalty.fill(config::DEFAULT_MOVEMENT_PENALTY);

        for y in 0..self.height() {
            for x in 0..self.width() {
                let local = Position::new(x, y);
                let Some(tile) = collision.get(template_lower + local) else {
                    continue;
                };

                if classifier.is_unwalkable(tile) {
                    self.movement_penalty.set(local, 0);
                }
                if classifier.is_preferred_path(tile) {
                    self.movement_penalty
                        .set(local, config::PREFERRED_PATH_MOVEMENT_PENALTY);
                }
            }
        }
    }

    /// Starts tracking a movable object occupying `bounds` (world cells).
    pub fn register_movable(&mut self, bounds: CellRect) -> MovableId {
        let id = MovableId(self.next_movable);
        self.next_movable += 1;
        self.movables.insert(id, bounds);
        self.rebuild_dynamic();
        id
    }

    /// Updates the bounds of a tracked object and rebuilds the dynamic layer.
    pub fn move_movable(&mut self, id: MovableId, bounds: CellRect) -> DelveResult<()> {
        let slot = self.movables.get_mut(&id).ok_or_else(|| {
            DelveError::InvalidState(format!("movable {:?} is not registered", id))
        })?;
        *slot = bounds;
        self.rebuild_dynamic();
        Ok(())
    }

    /// Stops tracking an object, returning its last bounds.
    pub fn remove_movable(&mut self, id: MovableId) -> Option<CellRect> {
        let removed = self.movables.remove(&id);
        if removed.is_some() {
            self.rebuild_dynamic();
        }
        removed
    }

    pub fn movable_count(&self) -> usize {
        self.movables.len()
    }

    /// Recomputes the dynamic layer from every tracked object.
    ///
    /// Object bounds are clipped to the room.
    pub fn rebuild_dynamic(&mut self) {
        self.item_obstacle.fill(config::DEFAULT_MOVEMENT_PENALTY);

        for bounds in self.movables.values() {
            let lower = bounds.lower - self.origin;
            let upper = bounds.upper - self.origin;
            let clipped = CellRect::new(
                Position::new(lower.x.max(0), lower.y.max(0)),
                Position::new(
                    upper.x.min(self.movement_penalty.width - 1),
                    upper.y.min(self.movement_penalty.height - 1),
                ),
            );
            if clipped.is_degenerate() {
                continue;
            }
            for local in clipped.cells() {
                self.item_obstacle.set(local, 0);
            }
        }
    }
}
