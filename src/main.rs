//! # Delve Dungeon Preview
//!
//! Builds a dungeon from a level catalog and prints an ASCII overview with a
//! per-room summary.

use clap::Parser;
use delve::generation::{demo, utils::create_rng};
use delve::{
    AStar, DelveError, DelveResult, Dungeon, DungeonBuilder, GameState, GenerationConfig,
    Generator, LevelCatalog, Position, TileSets,
};
use log::{error, info};
use std::collections::HashSet;
use std::path::PathBuf;

/// Command line arguments for the dungeon preview.
#[derive(Parser, Debug)]
#[command(name = "delve")]
#[command(about = "Builds and previews procedurally assembled dungeons")]
#[command(version)]
struct Args {
    /// Level catalog JSON file; the built-in demo catalog is used when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Index of the level to build
    #[arg(short, long, default_value_t = 0)]
    level: usize,

    /// Random seed for dungeon generation
    #[arg(short, long)]
    seed: Option<u64>,

    /// Write the built-in demo catalog to this path and exit
    #[arg(long)]
    export_demo: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() {
    let args = Args::parse();
    initialize_logging(&args.log_level);

    if let Err(err) = run(&args) {
        error!("{}", err);
        std::process::exit(1);
    }
}

/// Initializes `env_logger` at the requested level unless `RUST_LOG` is set.
fn initialize_logging(log_level: &str) {
    let level = match log_level.to_lowercase().as_str() {
        "error" => log::LevelFilter::Error,
        "warn" => log::LevelFilter::Warn,
        "debug" => log::LevelFilter::Debug,
        "trace" => log::LevelFilter::Trace,
        _ => log::LevelFilter::Info,
    };

    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_target(false)
        .init();
}

fn run(args: &Args) -> DelveResult<()> {
    info!("Starting Delve v{}", delve::VERSION);

    if let Some(path) = &args.export_demo {
        std::fs::write(path, demo::demo_catalog().to_json_string()?)?;
        info!("Wrote demo catalog to {}", path.display());
        return Ok(());
    }

    let catalog = match &args.config {
        Some(path) => LevelCatalog::load_from_path(path)?,
        None => demo::demo_catalog(),
    };
    let level = catalog.level(args.level).ok_or_else(|| {
        DelveError::InvalidConfig(format!(
            "level index {} out of range, catalog has {} levels",
            args.level,
            catalog.len()
        ))
    })?;

    let seed = args.seed.unwrap_or(12345);
    info!("Building level '{}' with seed {}", level.name, seed);

    let classifier: TileSets = demo::tile_sets();
    let config = GenerationConfig::new(seed);
    let builder = DungeonBuilder::new(level, &classifier);
    let report = builder.build(&config, &mut create_rng(&config))?;
    builder.validate(&report.dungeon, &config)?;

    info!(
        "{} graph attempts, {} placements tested, {} backtracks",
        report.stats.graph_attempts, report.stats.placement_attempts, report.stats.backtracks
    );

    println!("{}", render_overview(&report.dungeon));
    print_room_summary(&report.dungeon);

    let state = GameState::new(report.dungeon);
    let spawn = state.player_spawn_position()?;
    println!("Player spawns at ({:.1}, {:.1})", spawn.x, spawn.y);
    Ok(())
}

/// Draws every room, north at the top.
///
/// `#` unwalkable, `:` preferred path, `.` floor, `+` connected doorway.
fn render_overview(dungeon: &Dungeon) -> String {
    let Some(bounds) = dungeon.bounds() else {
        return String::new();
    };

    let doors: HashSet<Position> = dungeon
        .door_placements()
        .iter()
        .map(|door| door.cell)
        .collect();

    let mut out = String::new();
    for y in (bounds.lower.y..=bounds.upper.y).rev() {
        for x in bounds.lower.x..=bounds.upper.x {
            let cell = Position::new(x, y);
            let glyph = match dungeon.room_at_cell(cell) {
                None => ' ',
                Some(_) if doors.contains(&cell) => '+',
                Some(room) => match room.obstacles.movement_penalty(room.to_local(cell)) {
                    Some(0) => '#',
                    Some(penalty) if penalty == delve::config::PREFERRED_PATH_MOVEMENT_PENALTY => ':',
                    _ => '.',
                },
            };
            out.push(glyph);
        }
        out.push('\n');
    }
    out
}

fn print_room_summary(dungeon: &Dungeon) {
    println!(
        "Level '{}', graph '{}', {} rooms",
        dungeon.level_name,
        dungeon.graph_name,
        dungeon.len()
    );

    for room in dungeon.rooms() {
        let bounds = room.bounds();
        let enemies = room
            .enemy_spawn_parameters
            .as_ref()
            .map(|params| format!("{}-{} enemies", params.min_total_enemies, params.max_total_enemies))
            .unwrap_or_else(|| "no enemies".to_string());

        // Sanity check that enemies can reach the centre from a spawn cell.
        let reachable = match room.spawn_cells().first() {
            Some(&spawn) => {
                let centre = room.world_to_cell(room.center());
                AStar::build_path(room, spawn, centre)
                    .map(|path| format!("path {} steps", path.len().saturating_sub(1)))
                    .unwrap_or_else(|| "no path".to_string())
            }
            None => String::new(),
        };

        let kind = format!("{:?}", room.node_type);
        println!(
            "  {:<10} {:<12} {:<12} ({:>4},{:>4})..({:>4},{:>4}) {:<16} {}",
            room.node_id,
            kind,
            room.template_id,
            bounds.lower.x,
            bounds.lower.y,
            bounds.upper.x,
            bounds.upper.y,
            enemies,
            reachable
        );
    }
}
