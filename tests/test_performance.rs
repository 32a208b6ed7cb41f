//! Performance tests for dungeon building and pathfinding

use delve::generation::{demo, utils::create_rng};
use delve::{
    AStar, CellRect, DelveResult, DungeonBuilder, EnemyNavigator, GenerationConfig, Generator,
    NavigationConfig, NavigationInput, ObstacleGrid, Position, WorldPoint,
};
use rand::{rngs::StdRng, SeedableRng};
use std::time::Instant;

#[test]
fn test_astar_performance_on_large_room() {
    // A 60x60 room with staggered walls, each leaving a gap at alternating ends
    let mut grid = ObstacleGrid::new(CellRect::new(Position::origin(), Position::new(59, 59)));
    for wall in 1..10 {
        let x = wall * 6;
        let gap = if wall % 2 == 0 { 0 } else { 59 };
        for y in 0..60 {
            if y != gap {
                grid.set_movement_penalty(Position::new(x, y), 0);
            }
        }
    }

    let start = Instant::now();
    let iterations = 20;

    for _ in 0..iterations {
        let path = AStar::build_path_in(&grid, Position::new(0, 30), Position::new(59, 30));
        assert!(path.is_some());
    }

    let elapsed = start.elapsed();
    let avg_search_time = elapsed / iterations;

    println!("Average A* search time: {:?}", avg_search_time);

    assert!(
        avg_search_time.as_millis() < 50,
        "A* search too slow: {:?}",
        avg_search_time
    );
}

#[test]
fn test_dungeon_build_performance() -> DelveResult<()> {
    let level = demo::demo_level("Level 1");
    let classifier = demo::tile_sets();
    let builder = DungeonBuilder::new(&level, &classifier);

    let start = Instant::now();
    let iterations = 20;

    for seed in 0..iterations {
        let config = GenerationConfig::new(seed as u64);
        builder.generate(&config, &mut create_rng(&config))?;
    }

    let elapsed = start.elapsed();
    let avg_build_time = elapsed / iterations;

    println!("Average dungeon build time: {:?}", avg_build_time);

    assert!(
        avg_build_time.as_millis() < 250,
        "Dungeon builds too slow: {:?}",
        avg_build_time
    );

    Ok(())
}

#[test]
fn test_navigator_tick_performance() -> DelveResult<()> {
    let level = demo::demo_level("Level 1");
    let classifier = demo::tile_sets();
    let config = GenerationConfig::new(5);
    let dungeon = DungeonBuilder::new(&level, &classifier).generate(&config, &mut create_rng(&config))?;
    let room = dungeon.boss_room().unwrap();

    // Sixty enemies spread across the rebuild frames
    let mut navigators: Vec<EnemyNavigator> = (0..60)
        .map(|index| EnemyNavigator::new(index, 3.0, 50.0, NavigationConfig::default()))
        .collect();
    let enemy = WorldPoint::cell_center(room.spawn_cells()[0]);
    let player = room.center();
    let mut rng = StdRng::seed_from_u64(1);

    let start = Instant::now();
    let frames = 120u64;

    for frame in 0..frames {
        let input = NavigationInput {
            room,
            enemy_position: enemy,
            player_position: player,
            frame,
        };
        for navigator in &mut navigators {
            navigator.advance(1.0 / 60.0, &input, &mut rng);
        }
    }

    let elapsed = start.elapsed();
    let avg_frame_time = elapsed / frames as u32;

    println!("Average navigation frame time: {:?}", avg_frame_time);

    // Staggered rebuilds keep a frame well under the 60 FPS budget
    assert!(
        avg_frame_time.as_millis() < 16,
        "Navigation frames too slow: {:?}",
        avg_frame_time
    );

    Ok(())
}
