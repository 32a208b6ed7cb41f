//! # Demo Content
//!
//! A small built-in level catalog: rectangular rooms with centred three-cell
//! doorways and a handful of node graphs. Used by the preview binary when no
//! catalog file is given, and by tests.

use crate::{
    Doorway, DungeonLevel, LevelCatalog, Orientation, Position, RoomEnemySpawnParameters,
    RoomNodeGraph, RoomNodeType, RoomTemplate, TileId, TileLayers, TileSets,
};

/// Solid wall, unwalkable
pub const WALL: TileId = 1;
pub const FLOOR: TileId = 2;
/// Free-standing obstacle, unwalkable
pub const PILLAR: TileId = 3;
/// Marks routes enemies prefer
pub const PREFERRED_PATH: TileId = 4;
pub const TORCH: TileId = 5;

/// Classifier matching the demo tiles.
pub fn tile_sets() -> TileSets {
    TileSets::new([WALL, PILLAR], Some(PREFERRED_PATH))
}

/// The demo catalog: two levels of rising difficulty.
pub fn demo_catalog() -> LevelCatalog {
    LevelCatalog::new(vec![
        demo_level_with_difficulty("Level 1", 1),
        demo_level_with_difficulty("Level 2", 2),
    ])
}

/// A single demo level at the easiest difficulty.
pub fn demo_level(name: &str) -> DungeonLevel {
    demo_level_with_difficulty(name, 1)
}

pub fn demo_level_with_difficulty(name: &str, difficulty: u32) -> DungeonLevel {
    use Orientation::{East, North, South, West};
    let all_sides = [North, East, South, West];

    let mut entrance = rectangular_template("entrance", RoomNodeType::Entrance, 12, 10, &all_sides);
    entrance.tiles.decoration1.set(Position::new(3, 9), Some(TORCH));
    entrance.tiles.decoration1.set(Position::new(8, 9), Some(TORCH));

    let mut corridor_ns = rectangular_template("corridor-ns", RoomNodeType::CorridorNS, 5, 6, &[North, South]);
    for y in 0..6 {
        corridor_ns.tiles.collision.set(Position::new(2, y), Some(PREFERRED_PATH));
    }

    let mut corridor_ew = rectangular_template("corridor-ew", RoomNodeType::CorridorEW, 6, 5, &[East, West]);
    for x in 0..6 {
        corridor_ew.tiles.collision.set(Position::new(x, 2), Some(PREFERRED_PATH));
    }

    let mut small_room = rectangular_template("small-room", RoomNodeType::Standard, 10, 8, &all_sides);
    small_room.spawn_positions = vec![
        Position::new(2, 2),
        Position::new(7, 2),
        Position::new(2, 5),
        Position::new(7, 5),
    ];
    small_room.enemy_spawn_parameters = vec![spawn_parameters(name, difficulty, 2, 4)];

    let mut wide_room = rectangular_template("wide-room", RoomNodeType::Standard, 14, 8, &[North, East, West]);
    wide_room.spawn_positions = vec![Position::new(3, 3), Position::new(10, 3), Position::new(6, 5)];
    wide_room.enemy_spawn_parameters = vec![spawn_parameters(name, difficulty, 3, 6)];

    let mut boss = rectangular_template("boss-room", RoomNodeType::BossRoom, 16, 12, &all_sides);
    for pillar in [(4, 3), (11, 3), (4, 8), (11, 8)] {
        boss.tiles.collision.set(Position::new(pillar.0, pillar.1), Some(PILLAR));
    }
    boss.spawn_positions = vec![Position::new(7, 6), Position::new(8, 6)];
    boss.enemy_spawn_parameters = vec![RoomEnemySpawnParameters {
        level_name: name.to_string(),
        min_total_enemies: 1,
        max_total_enemies: 1,
        min_concurrent_enemies: 1,
        max_concurrent_enemies: 1,
        min_spawn_interval: 0,
        max_spawn_interval: 0,
    }];

    DungeonLevel::new(
        name,
        vec![entrance, corridor_ns, corridor_ew, small_room, wide_room, boss],
        vec![linear_graph(), branching_graph()],
    )
}

fn spawn_parameters(level: &str, difficulty: u32, min: u32, max: u32) -> RoomEnemySpawnParameters {
    RoomEnemySpawnParameters {
        level_name: level.to_string(),
        min_total_enemies: min * difficulty,
        max_total_enemies: max * difficulty,
        min_concurrent_enemies: 1,
        max_concurrent_enemies: 1 + difficulty,
        min_spawn_interval: 1,
        max_spawn_interval: 3,
    }
}

/// entrance -> corridor -> room -> corridor -> boss
pub fn linear_graph() -> RoomNodeGraph {
    build_graph(
        "linear",
        &[
            ("entrance", RoomNodeType::Entrance),
            ("c1", RoomNodeType::Corridor),
            ("room", RoomNodeType::Standard),
            ("c2", RoomNodeType::Corridor),
            ("boss", RoomNodeType::BossRoom),
        ],
        &[("entrance", "c1"), ("c1", "room"), ("room", "c2"), ("c2", "boss")],
    )
}

/// Two branches off the entrance, the boss at the end of one of them.
pub fn branching_graph() -> RoomNodeGraph {
    build_graph(
        "branching",
        &[
            ("entrance", RoomNodeType::Entrance),
            ("c1", RoomNodeType::Corridor),
            ("c2", RoomNodeType::Corridor),
            ("room_a", RoomNodeType::Standard),
            ("room_b", RoomNodeType::Standard),
            ("c3", RoomNodeType::Corridor),
            ("room_c", RoomNodeType::Standard),
            ("c4", RoomNodeType::Corridor),
            ("boss", RoomNodeType::BossRoom),
        ],
        &[
            ("entrance", "c1"),
            ("entrance", "c2"),
            ("c1", "room_a"),
            ("c2", "room_b"),
            ("room_a", "c3"),
            ("c3", "room_c"),
            ("room_b", "c4"),
            ("c4", "boss"),
        ],
    )
}

fn build_graph(name: &str, nodes: &[(&str, RoomNodeType)], links: &[(&str, &str)]) -> RoomNodeGraph {
    let mut graph = RoomNodeGraph::new(name);
    for (id, node_type) in nodes {
        // Node IDs above are unique and the links follow the authoring rules.
        let _ = graph.add_node(*id, *node_type);
    }
    for (parent, child) in links {
        let _ = graph.connect(parent, child);
    }
    graph
}

/// A walled rectangle with a centred doorway on each of `sides`.
pub fn rectangular_template(
    id: &str,
    node_type: RoomNodeType,
    width: i32,
    height: i32,
    sides: &[Orientation],
) -> RoomTemplate {
    let doorways: Vec<Doorway> = sides
        .iter()
        .map(|&side| centred_doorway(side, width, height))
        .collect();

    let mut tiles = TileLayers::default();
    for y in 0..height {
        for x in 0..width {
            let cell = Position::new(x, y);
            tiles.ground.set(cell, Some(FLOOR));

            let on_border = x == 0 || y == 0 || x == width - 1 || y == height - 1;
            let in_opening = doorways.iter().any(|doorway| opening_contains(doorway, cell));
            if on_border && !in_opening {
                tiles.collision.set(cell, Some(WALL));
                tiles.minimap.set(cell, Some(WALL));
                tiles.front.set(cell, Some(WALL));
            }
        }
    }

    RoomTemplate {
        id: id.to_string(),
        node_type,
        lower_bounds: Position::origin(),
        upper_bounds: Position::new(width - 1, height - 1),
        doorways,
        spawn_positions: Vec::new(),
        tiles,
        enemy_spawn_parameters: Vec::new(),
    }
}

fn centred_doorway(side: Orientation, width: i32, height: i32) -> Doorway {
    let cx = width / 2;
    let cy = height / 2;
    match side {
        Orientation::North => Doorway::new(Position::new(cx, height - 1), side, Position::new(cx - 2, height - 1), 3, 1),
        Orientation::South => Doorway::new(Position::new(cx, 0), side, Position::new(cx - 2, 0), 3, 1),
        Orientation::East => Doorway::new(Position::new(width - 1, cy), side, Position::new(width - 1, cy + 2), 1, 3),
        Orientation::West => Doorway::new(Position::new(0, cy), side, Position::new(0, cy + 2), 1, 3),
        Orientation::None => Doorway::new(Position::new(cx, cy), side, Position::new(cx, cy), 0, 0),
    }
}

/// The three cells of a doorway's opening.
fn opening_contains(doorway: &Doorway, cell: Position) -> bool {
    let pos = doorway.position;
    if doorway.orientation.is_north_south() {
        cell.y == pos.y && (cell.x - pos.x).abs() <= 1
    } else {
        cell.x == pos.x && (cell.y - pos.y).abs() <= 1
    }
}
