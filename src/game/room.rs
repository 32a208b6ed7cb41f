//! # Rooms and Dungeons
//!
//! Placed room instances and the dungeon that owns them. Both are created
//! once by a successful build and live until the level unloads.

use crate::{
    config, CellRect, DelveError, DelveResult, Doorway, ObstacleGrid, Orientation, Position,
    RoomEnemySpawnParameters, RoomId, RoomNodeType, RoomTemplate, TileClassifier, TileLayers,
    WorldPoint,
};
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashMap;

/// A room template placed in world space.
#[derive(Debug, Clone, PartialEq)]
pub struct Room {
    pub id: RoomId,
    /// ID of the graph node this room fills
    pub node_id: String,
    pub template_id: String,
    pub node_type: RoomNodeType,
    /// World cell of the south-west corner
    pub lower_bounds: Position,
    /// World cell of the north-east corner
    pub upper_bounds: Position,
    pub template_lower_bounds: Position,
    pub template_upper_bounds: Position,
    /// Instance copies of the template doorways, in template-local cells
    pub doorways: Vec<Doorway>,
    /// Template-local spawn cells
    pub spawn_positions: Vec<Position>,
    pub parent_id: Option<RoomId>,
    pub child_ids: Vec<RoomId>,
    pub is_previously_visited: bool,
    pub is_cleared_of_enemies: bool,
    pub is_lit: bool,
    /// Spawn parameters for the level this room was built on
    pub enemy_spawn_parameters: Option<RoomEnemySpawnParameters>,
    /// Instance tiles, sealed where doorways went unused
    pub tiles: TileLayers,
    pub obstacles: ObstacleGrid,
}

impl Room {
    /// Instantiates `template` with its lower corner at `lower_bounds`.
    ///
    /// The obstacle grid starts at the default penalty everywhere; call
    /// [`Room::bake_obstacles`] once the tiles are final.
    pub fn instantiate(
        id: RoomId,
        node_id: impl Into<String>,
        template: &RoomTemplate,
        lower_bounds: Position,
        level_name: &str,
    ) -> Self {
        let upper_bounds = lower_bounds + (template.upper_bounds - template.lower_bounds);
        let enemy_spawn_parameters = template.spawn_parameters_for(level_name).cloned();
        let has_enemies = enemy_spawn_parameters
            .as_ref()
            .is_some_and(|params| params.max_total_enemies > 0);

        let mut doorways = template.doorways.clone();
        doorways.iter_mut().for_each(Doorway::reset);

        Self {
            id,
            node_id: node_id.into(),
            template_id: template.id.clone(),
            node_type: template.node_type,
            lower_bounds,
            upper_bounds,
            template_lower_bounds: template.lower_bounds,
            template_upper_bounds: template.upper_bounds,
            doorways,
            spawn_positions: template.spawn_positions.clone(),
            parent_id: None,
            child_ids: Vec::new(),
            is_previously_visited: template.node_type.is_entrance(),
            is_cleared_of_enemies: !has_enemies,
            is_lit: false,
            enemy_spawn_parameters,
            tiles: template.tiles.clone(),
            obstacles: ObstacleGrid::new(CellRect::new(lower_bounds, upper_bounds)),
        }
    }

    /// World-space cell rectangle.
    pub fn bounds(&self) -> CellRect {
        CellRect::new(self.lower_bounds, self.upper_bounds)
    }

    pub fn contains_cell(&self, cell: Position) -> bool {
        self.bounds().contains(cell)
    }

    /// Converts a template-local cell to a world cell.
    pub fn template_to_world(&self, local: Position) -> Position {
        self.lower_bounds + (local - self.template_lower_bounds)
    }

    /// Converts a world cell to a grid-local cell (origin at `lower_bounds`).
    pub fn to_local(&self, cell: Position) -> Position {
        cell - self.lower_bounds
    }

    pub fn cell_to_world_center(&self, cell: Position) -> WorldPoint {
        WorldPoint::cell_center(cell)
    }

    pub fn world_to_cell(&self, point: WorldPoint) -> Position {
        point.to_cell()
    }

    /// World-space centre of the room.
    pub fn center(&self) -> WorldPoint {
        WorldPoint::new(
            (self.lower_bounds.x + self.upper_bounds.x + 1) as f32 * config::CELL_SIZE * 0.5,
            (self.lower_bounds.y + self.upper_bounds.y + 1) as f32 * config::CELL_SIZE * 0.5,
        )
    }

    /// World cell of a doorway of this room.
    pub fn doorway_cell(&self, doorway: &Doorway) -> Position {
        self.template_to_world(doorway.position)
    }

    /// Spawn cells in world space.
    pub fn spawn_cells(&self) -> Vec<Position> {
        self.spawn_positions
            .iter()
            .map(|&local| self.template_to_world(local))
            .collect()
    }

    /// A random spawn cell in world space, if the room has any.
    pub fn random_spawn_cell<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Position> {
        self.spawn_positions
            .choose(rng)
            .map(|&local| self.template_to_world(local))
    }

    pub fn has_enemies_to_spawn(&self) -> bool {
        self.enemy_spawn_parameters
            .as_ref()
            .is_some_and(|params| params.max_total_enemies > 0)
    }

    /// Total enemies for this visit, zero when the room spawns none.
    pub fn total_enemies_to_spawn<R: Rng + ?Sized>(&self, rng: &mut R) -> u32 {
        self.enemy_spawn_parameters
            .as_ref()
            .map_or(0, |params| params.total_enemies_to_spawn(rng))
    }

    /// Seals every doorway that was not connected during the build.
    pub fn seal_unconnected_doorways(&mut self) -> usize {
        let mut sealed = 0;
        for doorway in self.doorways.iter().filter(|doorway| !doorway.is_connected) {
            self.tiles.seal_doorway(doorway);
            sealed += 1;
        }
        sealed
    }

    /// Bakes the static obstacle layer from the collision tiles.
    pub fn bake_obstacles(&mut self, classifier: &dyn TileClassifier) {
        self.obstacles
            .bake_static(&self.tiles.collision, self.template_lower_bounds, classifier);
    }

    /// Doors the host should spawn on connected doorways.
    ///
    /// Boss room doors start locked.
    pub fn door_placements(&self) -> Vec<DoorPlacement> {
        self.doorways
            .iter()
            .filter(|doorway| doorway.is_connected)
            .map(|doorway| DoorPlacement {
                room_id: self.id,
                cell: self.doorway_cell(doorway),
                orientation: doorway.orientation,
                is_locked: self.node_type.is_boss_room(),
            })
            .collect()
    }
}

/// A door to spawn at a connected doorway.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DoorPlacement {
    pub room_id: RoomId,
    pub cell: Position,
    pub orientation: Orientation,
    pub is_locked: bool,
}

/// A connected doorway pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DoorwayLink {
    pub parent: RoomId,
    /// Index into the parent's doorways
    pub parent_doorway: usize,
    pub child: RoomId,
    /// Index into the child's doorways
    pub child_doorway: usize,
}

/// The rooms of a successful build, keyed by ID.
#[derive(Debug, Clone)]
pub struct Dungeon {
    pub level_name: String,
    pub graph_name: String,
    rooms: HashMap<RoomId, Room>,
    build_order: Vec<RoomId>,
    entrance_id: RoomId,
    links: Vec<DoorwayLink>,
}

impl Dungeon {
    /// Assembles a dungeon from rooms in build order.
    ///
    /// Fails unless exactly one room is an entrance without a parent.
    pub fn new(
        level_name: impl Into<String>,
        graph_name: impl Into<String>,
        rooms: Vec<Room>,
        links: Vec<DoorwayLink>,
    ) -> DelveResult<Self> {
        let entrances: Vec<RoomId> = rooms
            .iter()
            .filter(|room| room.node_type.is_entrance() && room.parent_id.is_none())
            .map(|room| room.id)
            .collect();

        let [entrance_id] = entrances.as_slice() else {
            return Err(DelveError::InvalidState(format!(
                "dungeon must have exactly one entrance, found {}",
                entrances.len()
            )));
        };

        let build_order = rooms.iter().map(|room| room.id).collect();
        let rooms = rooms.into_iter().map(|room| (room.id, room)).collect();

        Ok(Self {
            level_name: level_name.into(),
            graph_name: graph_name.into(),
            rooms,
            build_order,
            entrance_id: *entrance_id,
            links,
        })
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    pub fn room(&self, id: RoomId) -> Option<&Room> {
        self.rooms.get(&id)
    }

    pub fn room_mut(&mut self, id: RoomId) -> Option<&mut Room> {
        self.rooms.get_mut(&id)
    }

    /// Rooms in the order they were placed, entrance first.
    pub fn rooms(&self) -> impl Iterator<Item = &Room> {
        self.build_order.iter().filter_map(|id| self.rooms.get(id))
    }

    pub fn entrance_id(&self) -> RoomId {
        self.entrance_id
    }

    pub fn entrance(&self) -> Option<&Room> {
        self.rooms.get(&self.entrance_id)
    }

    pub fn links(&self) -> &[DoorwayLink] {
        &self.links
    }

    pub fn boss_room(&self) -> Option<&Room> {
        self.rooms().find(|room| room.node_type.is_boss_room())
    }

    pub fn room_for_node(&self, node_id: &str) -> Option<&Room> {
        self.rooms().find(|room| room.node_id == node_id)
    }

    /// The room whose bounds contain `cell`.
    pub fn room_at_cell(&self, cell: Position) -> Option<&Room> {
        self.rooms().find(|room| room.contains_cell(cell))
    }

    /// Smallest rectangle covering every room.
    pub fn bounds(&self) -> Option<CellRect> {
        self.rooms().map(Room::bounds).reduce(|acc, bounds| {
            CellRect::new(
                Position::new(acc.lower.x.min(bounds.lower.x), acc.lower.y.min(bounds.lower.y)),
                Position::new(acc.upper.x.max(bounds.upper.x), acc.upper.y.max(bounds.upper.y)),
            )
        })
    }

    /// Doors for every connected doorway in the dungeon.
    pub fn door_placements(&self) -> Vec<DoorPlacement> {
        self.rooms().flat_map(Room::door_placements).collect()
    }

    /// Whether every room other than the boss room has been cleared.
    pub fn is_clear_of_regular_enemies(&self) -> bool {
        self.rooms()
            .filter(|room| !room.node_type.is_boss_room())
            .all(|room| room.is_cleared_of_enemies)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::demo;
    use crate::new_room_id;
    use rand::{rngs::StdRng, SeedableRng};

    fn template(node_type: RoomNodeType) -> RoomTemplate {
        demo::demo_level("Level 1")
            .templates_of_type(node_type)
            .next()
            .unwrap()
            .clone()
    }

    fn room_at(node_type: RoomNodeType, lower: Position) -> Room {
        let mut rng = StdRng::seed_from_u64(lower.x as u64 + 100);
        Room::instantiate(
            new_room_id(&mut rng),
            format!("{:?}", node_type),
            &template(node_type),
            lower,
            "Level 1",
        )
    }

    #[test]
    fn test_instantiation_translates_bounds() {
        let template = template(RoomNodeType::Standard);
        let room = room_at(RoomNodeType::Standard, Position::new(20, -4));

        assert_eq!(room.upper_bounds - room.lower_bounds, template.upper_bounds - template.lower_bounds);
        assert!(room.contains_cell(Position::new(20, -4)));
        assert!(!room.contains_cell(Position::new(19, -4)));
        assert_eq!(room.obstacles.origin(), Position::new(20, -4));
        assert_eq!(room.obstacles.width(), template.width());
        assert!(room.doorways.iter().all(Doorway::is_free));
    }

    #[test]
    fn test_entrance_starts_visited_and_cleared() {
        let entrance = room_at(RoomNodeType::Entrance, Position::origin());
        assert!(entrance.is_previously_visited);
        assert!(entrance.is_cleared_of_enemies);

        let standard = room_at(RoomNodeType::Standard, Position::origin());
        assert!(!standard.is_previously_visited);
        assert!(!standard.is_cleared_of_enemies);
        assert!(standard.has_enemies_to_spawn());
    }

    #[test]
    fn test_spawn_cells_are_in_world_space() {
        let room = room_at(RoomNodeType::Standard, Position::new(50, 60));
        let mut rng = StdRng::seed_from_u64(11);
        let cells = room.spawn_cells();
        assert!(!cells.is_empty());
        assert!(cells.iter().all(|&cell| room.contains_cell(cell)));
        let cell = room.random_spawn_cell(&mut rng).unwrap();
        assert!(cells.contains(&cell));
    }

    #[test]
    fn test_world_conversions() {
        let room = room_at(RoomNodeType::Standard, Position::new(3, 3));
        let center = room.cell_to_world_center(Position::new(4, 5));
        assert_eq!(center, WorldPoint::new(4.5, 5.5));
        assert_eq!(room.world_to_cell(center), Position::new(4, 5));
        assert_eq!(room.to_local(Position::new(4, 5)), Position::new(1, 2));
    }

    #[test]
    fn test_sealing_skips_connected_doorways() {
        let mut room = room_at(RoomNodeType::Entrance, Position::origin());
        let total = room.doorways.len();
        room.doorways[0].is_connected = true;
        assert_eq!(room.seal_unconnected_doorways(), total - 1);
        assert_eq!(room.door_placements().len(), 1);
    }

    #[test]
    fn test_boss_doors_are_locked() {
        let mut boss = room_at(RoomNodeType::BossRoom, Position::origin());
        boss.doorways[0].is_connected = true;
        let doors = boss.door_placements();
        assert_eq!(doors.len(), 1);
        assert!(doors[0].is_locked);
    }

    #[test]
    fn test_dungeon_requires_single_entrance() {
        let entrance = room_at(RoomNodeType::Entrance, Position::origin());
        let standard = room_at(RoomNodeType::Standard, Position::new(40, 0));
        let dungeon = Dungeon::new("Level 1", "g", vec![entrance.clone(), standard.clone()], vec![]).unwrap();

        assert_eq!(dungeon.len(), 2);
        assert_eq!(dungeon.entrance_id(), entrance.id);
        assert_eq!(dungeon.room_at_cell(Position::new(41, 1)).unwrap().id, standard.id);
        assert!(dungeon.room_at_cell(Position::new(-5, -5)).is_none());
        assert!(!dungeon.is_clear_of_regular_enemies());

        assert!(Dungeon::new("Level 1", "g", vec![standard], vec![]).is_err());
    }
}
