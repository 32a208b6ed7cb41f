//! # Room Tilemaps
//!
//! Sparse tile layers of a room template and the doorway sealing that
//! mirrors wall tiles across unused openings.

use crate::{Doorway, Orientation, Position};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Identifier of a tile asset. Interpretation is left to the host engine.
pub type TileId = u32;

/// The named tile layers every room carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TileLayerKind {
    Ground,
    Decoration1,
    Decoration2,
    Front,
    Collision,
    Minimap,
}

impl TileLayerKind {
    /// All layers, in the order sealing visits them.
    pub fn all() -> [TileLayerKind; 6] {
        [
            TileLayerKind::Collision,
            TileLayerKind::Minimap,
            TileLayerKind::Ground,
            TileLayerKind::Decoration1,
            TileLayerKind::Decoration2,
            TileLayerKind::Front,
        ]
    }
}

/// One sparse layer of tiles keyed by template-local cell.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileLayer {
    #[serde(with = "tile_entries")]
    tiles: HashMap<Position, TileId>,
}

impl TileLayer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, pos: Position) -> Option<TileId> {
        self.tiles.get(&pos).copied()
    }

    /// Places `tile` at `pos`, or clears the cell when `tile` is `None`.
    pub fn set(&mut self, pos: Position, tile: Option<TileId>) {
        match tile {
            Some(tile) => {
                self.tiles.insert(pos, tile);
            }
            None => {
                self.tiles.remove(&pos);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Mirrors tiles across a doorway opening so it becomes solid.
    ///
    /// North and south openings are closed by copying each column of the
    /// copy region one cell east; east and west openings by copying each row
    /// one cell south. Copies run in place, so the first wall column (or row)
    /// is carried across the whole opening.
    pub fn seal_doorway(&mut self, doorway: &Doorway) {
        let start = doorway.copy_start;

        match doorway.orientation {
            Orientation::North | Orientation::South => {
                for x in 0..doorway.copy_width {
                    for y in 0..doorway.copy_height {
                        let source = Position::new(start.x + x, start.y - y);
                        let target = Position::new(start.x + 1 + x, start.y - y);
                        self.set(target, self.get(source));
                    }
                }
            }
            Orientation::East | Orientation::West => {
                for y in 0..doorway.copy_height {
                    for x in 0..doorway.copy_width {
                        let source = Position::new(start.x + x, start.y - y);
                        let target = Position::new(start.x + x, start.y - 1 - y);
                        self.set(target, self.get(source));
                    }
                }
            }
            Orientation::None => {}
        }
    }
}

/// The full set of layers painted for a room template.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileLayers {
    #[serde(default)]
    pub ground: TileLayer,
    #[serde(default)]
    pub decoration1: TileLayer,
    #[serde(default)]
    pub decoration2: TileLayer,
    #[serde(default)]
    pub front: TileLayer,
    #[serde(default)]
    pub collision: TileLayer,
    #[serde(default)]
    pub minimap: TileLayer,
}

impl TileLayers {
    pub fn layer(&self, kind: TileLayerKind) -> &TileLayer {
        match kind {
            TileLayerKind::Ground => &self.ground,
            TileLayerKind::Decoration1 => &self.decoration1,
            TileLayerKind::Decoration2 => &self.decoration2,
            TileLayerKind::Front => &self.front,
            TileLayerKind::Collision => &self.collision,
            TileLayerKind::Minimap => &self.minimap,
        }
    }

    pub fn layer_mut(&mut self, kind: TileLayerKind) -> &mut TileLayer {
        match kind {
            TileLayerKind::Ground => &mut self.ground,
            TileLayerKind::Decoration1 => &mut self.decoration1,
            TileLayerKind::Decoration2 => &mut self.decoration2,
            TileLayerKind::Front => &mut self.front,
            TileLayerKind::Collision => &mut self.collision,
            TileLayerKind::Minimap => &mut self.minimap,
        }
    }

    /// Seals `doorway` on every layer.
    pub fn seal_doorway(&mut self, doorway: &Doorway) {
        for kind in TileLayerKind::all() {
            self.layer_mut(kind).seal_doorway(doorway);
        }
    }
}

/// Serializes the sparse map as a sorted list of `(cell, tile)` pairs.
mod tile_entries {
    use super::TileId;
    use crate::Position;
    use serde::{Deserialize, Deserializer, Serializer};
    use std::collections::HashMap;

    pub fn serialize<S: Serializer>(
        tiles: &HashMap<Position, TileId>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let mut entries: Vec<(&Position, &TileId)> = tiles.iter().collect();
        entries.sort();
        serializer.collect_seq(entries)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<HashMap<Position, TileId>, D::Error> {
        let entries: Vec<(Position, TileId)> = Vec::deserialize(deserializer)?;
        Ok(entries.into_iter().collect())
    }
}
