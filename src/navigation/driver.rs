//! # Enemy Navigation Driver
//!
//! Per-enemy controller that decides when to rebuild a path to the player
//! and steps the enemy along it, one tick at a time.
//!
//! Path rebuilds are spread over frames: each navigator only rebuilds on
//! frames where `frame % frames_to_spread_pathfinding_over` equals its
//! update frame. Stepping along an existing path happens every tick.

use crate::{config, AStar, DelveError, DelveResult, PathStack, PathStep, Position, Room, WorldPoint};
use crate::NEIGHBOUR_OFFSETS;
use log::trace;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Tuning for enemy navigation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigationConfig {
    /// Rebuilds are spread over this many frames
    pub frames_to_spread_pathfinding_over: u64,
    /// Seconds between forced rebuilds
    pub path_rebuild_cooldown: f32,
    /// Player displacement that forces a rebuild
    pub player_move_distance_to_rebuild_path: f32,
    /// Distance at which a waypoint counts as reached
    pub waypoint_arrival_distance: f32,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            frames_to_spread_pathfinding_over: config::FRAMES_TO_SPREAD_PATHFINDING_OVER,
            path_rebuild_cooldown: config::ENEMY_PATH_REBUILD_COOLDOWN,
            player_move_distance_to_rebuild_path: config::PLAYER_MOVE_DISTANCE_TO_REBUILD_PATH,
            waypoint_arrival_distance: config::WAYPOINT_ARRIVAL_DISTANCE,
        }
    }
}

impl NavigationConfig {
    pub fn validate(&self) -> DelveResult<()> {
        if self.frames_to_spread_pathfinding_over == 0 {
            return Err(DelveError::InvalidConfig(
                "frames_to_spread_pathfinding_over must be positive".to_string(),
            ));
        }
        if self.path_rebuild_cooldown < 0.0
            || self.player_move_distance_to_rebuild_path < 0.0
            || self.waypoint_arrival_distance <= 0.0
        {
            return Err(DelveError::InvalidConfig(
                "navigation distances and cooldown must not be negative".to_string(),
            ));
        }
        Ok(())
    }
}

/// What the host should do with the enemy this tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NavigationStep {
    /// Stand still and play the idle animation
    Idle,
    /// Move towards `target` at `speed` along unit vector `direction`
    MoveTowards {
        target: WorldPoint,
        direction: WorldPoint,
        speed: f32,
    },
}

/// A path being walked, tagged with the generation that started it.
#[derive(Debug, Clone, PartialEq)]
pub struct PathFollower {
    path: PathStack,
    waypoint: Option<PathStep>,
    generation: u64,
}

impl PathFollower {
    /// Waypoints not yet reached, including the current one.
    pub fn remaining_steps(&self) -> usize {
        self.path.len() + usize::from(self.waypoint.is_some())
    }

    /// Advances past every waypoint within `arrival` of `position` and
    /// returns the next one to head for.
    fn next_waypoint(&mut self, position: WorldPoint, arrival: f32) -> Option<PathStep> {
        loop {
            let waypoint = match self.waypoint {
                Some(waypoint) => waypoint,
                None => {
                    let next = self.path.pop()?;
                    self.waypoint = Some(next);
                    next
                }
            };

            if position.distance(waypoint.world) < arrival {
                self.waypoint = None;
                continue;
            }

            return Some(waypoint);
        }
    }
}

/// Navigator state machine.
#[derive(Debug, Clone, PartialEq)]
pub enum NavigatorState {
    /// No path to follow
    Idle,
    /// Following a path towards the player
    Chasing(PathFollower),
}

/// Per-tick inputs of an [`EnemyNavigator`].
#[derive(Debug, Clone, Copy)]
pub struct NavigationInput<'a> {
    /// Room the enemy is in
    pub room: &'a Room,
    pub enemy_position: WorldPoint,
    pub player_position: WorldPoint,
    /// Monotonic frame counter of the host loop
    pub frame: u64,
}

/// Drives one enemy towards the player.
#[derive(Debug, Clone)]
pub struct EnemyNavigator {
    config: NavigationConfig,
    update_frame: u64,
    move_speed: f32,
    chase_distance: f32,
    chase_started: bool,
    rebuild_cooldown: f32,
    player_reference: Option<WorldPoint>,
    generation: u64,
    state: NavigatorState,
}

impl EnemyNavigator {
    /// Creates a navigator for the `spawn_index`-th enemy spawned.
    ///
    /// # Examples
    ///
    /// ```
    /// use delve::{EnemyNavigator, NavigationConfig};
    ///
    /// let navigator = EnemyNavigator::new(61, 3.0, 8.0, NavigationConfig::default());
    /// assert_eq!(navigator.update_frame(), 1);
    /// assert!(!navigator.is_chasing());
    /// ```
    pub fn new(spawn_index: u64, move_speed: f32, chase_distance: f32, config: NavigationConfig) -> Self {
        let spread = config.frames_to_spread_pathfinding_over.max(1);
        Self {
            update_frame: spawn_index % spread,
            move_speed,
            chase_distance,
            chase_started: false,
            rebuild_cooldown: 0.0,
            player_reference: None,
            generation: 0,
            state: NavigatorState::Idle,
            config,
        }
    }

    pub fn update_frame(&self) -> u64 {
        self.update_frame
    }

    pub fn state(&self) -> &NavigatorState {
        &self.state
    }

    pub fn is_chasing(&self) -> bool {
        matches!(self.state, NavigatorState::Chasing(_))
    }

    /// Whether the player has come within chase distance at least once.
    pub fn has_started_chase(&self) -> bool {
        self.chase_started
    }

    /// Incremented every time the current movement is cancelled.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Drops any movement in progress.
    pub fn cancel(&mut self) {
        self.generation += 1;
        self.state = NavigatorState::Idle;
    }

    /// Advances the navigator by one tick of `dt` seconds.
    pub fn advance<R: Rng + ?Sized>(
        &mut self,
        dt: f32,
        input: &NavigationInput<'_>,
        rng: &mut R,
    ) -> NavigationStep {
        self.rebuild_cooldown -= dt;

        if !self.chase_started {
            if input.enemy_position.distance(input.player_position) >= self.chase_distance {
                return NavigationStep::Idle;
            }
            self.chase_started = true;
        }

        let spread = self.config.frames_to_spread_pathfinding_over.max(1);
        if input.frame % spread == self.update_frame && self.needs_rebuild(input.player_position) {
            self.rebuild_cooldown = self.config.path_rebuild_cooldown;
            self.player_reference = Some(input.player_position);
            self.rebuild_path(input, rng);
        }

        self.step(input.enemy_position)
    }

    fn needs_rebuild(&self, player_position: WorldPoint) -> bool {
        if self.rebuild_cooldown <= 0.0 {
            return true;
        }
        match self.player_reference {
            Some(reference) => {
                reference.distance(player_position) > self.config.player_move_distance_to_rebuild_path
            }
            None => true,
        }
    }

    fn rebuild_path<R: Rng + ?Sized>(&mut self, input: &NavigationInput<'_>, rng: &mut R) {
        self.cancel();

        let start = input.enemy_position.to_cell();
        let target = resolve_target_cell(input.room, input.player_position, rng);

        let Some(mut path) = AStar::build_path(input.room, start, target) else {
            trace!("No path from {:?} to {:?}, going idle", start, target);
            return;
        };

        // The enemy already stands on the first cell.
        path.pop();
        if path.is_empty() {
            return;
        }

        self.state = NavigatorState::Chasing(PathFollower {
            path,
            waypoint: None,
            generation: self.generation,
        });
    }

    fn step(&mut self, position: WorldPoint) -> NavigationStep {
        let generation = self.generation;
        let arrival = self.config.waypoint_arrival_distance;

        let waypoint = match &mut self.state {
            NavigatorState::Chasing(follower) if follower.generation == generation => {
                follower.next_waypoint(position, arrival)
            }
            _ => None,
        };

        match waypoint {
            Some(waypoint) => NavigationStep::MoveTowards {
                target: waypoint.world,
                direction: position.direction_to(waypoint.world),
                speed: self.move_speed,
            },
            None => {
                if self.is_chasing() {
                    trace!("Path exhausted, going idle");
                }
                self.state = NavigatorState::Idle;
                NavigationStep::Idle
            }
        }
    }
}

/// Picks the cell to path towards for a player standing at `player`.
///
/// A blocked player cell falls back to a random walkable neighbour inside the
/// room, then to a random spawn cell, then to the player cell itself.
pub fn resolve_target_cell<R: Rng + ?Sized>(room: &Room, player: WorldPoint, rng: &mut R) -> Position {
    let player_cell = player.to_cell();
    let grid = &room.obstacles;

    if grid.is_walkable(grid.to_local(player_cell)) {
        return player_cell;
    }

    let mut offsets = NEIGHBOUR_OFFSETS;
    offsets.shuffle(rng);
    for offset in offsets {
        let candidate = grid.to_local(player_cell + offset);
        if !grid.contains_local(candidate) {
            continue;
        }
        if grid.is_walkable(candidate) {
            return player_cell + offset;
        }
    }

    room.random_spawn_cell(rng).unwrap_or(player_cell)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::demo;
    use crate::{new_room_id, CellRect};
    use rand::{rngs::StdRng, SeedableRng};

    fn room() -> Room {
        let level = demo::demo_level("Level 1");
        let template = level
            .templates_of_type(crate::RoomNodeType::Standard)
            .next()
            .unwrap()
            .clone();
        let mut rng = StdRng::seed_from_u64(1);
        let mut room = Room::instantiate(
            new_room_id(&mut rng),
            "room",
            &template,
            Position::new(0, 0),
            &level.name,
        );
        room.bake_obstacles(&demo::tile_sets());
        room
    }

    fn input(room: &Room, enemy: Position, player: Position, frame: u64) -> NavigationInput<'_> {
        NavigationInput {
            room,
            enemy_position: WorldPoint::cell_center(enemy),
            player_position: WorldPoint::cell_center(player),
            frame,
        }
    }

    #[test]
    fn test_update_frame_is_staggered() {
        let config = NavigationConfig::default();
        assert_eq!(EnemyNavigator::new(0, 1.0, 5.0, config.clone()).update_frame(), 0);
        assert_eq!(EnemyNavigator::new(59, 1.0, 5.0, config.clone()).update_frame(), 59);
        assert_eq!(EnemyNavigator::new(125, 1.0, 5.0, config).update_frame(), 5);
    }

    #[test]
    fn test_waits_until_player_is_within_chase_distance() {
        let room = room();
        let mut rng = StdRng::seed_from_u64(2);
        let mut navigator = EnemyNavigator::new(0, 2.0, 3.0, NavigationConfig::default());

        let far = input(&room, Position::new(1, 1), Position::new(8, 6), 0);
        assert_eq!(navigator.advance(0.016, &far, &mut rng), NavigationStep::Idle);
        assert!(!navigator.has_started_chase());

        let near = input(&room, Position::new(1, 1), Position::new(3, 1), 0);
        let step = navigator.advance(0.016, &near, &mut rng);
        assert!(navigator.has_started_chase());
        match step {
            NavigationStep::MoveTowards { target, speed, .. } => {
                assert_eq!(target, WorldPoint::cell_center(Position::new(2, 1)));
                assert_eq!(speed, 2.0);
            }
            NavigationStep::Idle => panic!("expected movement"),
        }
    }

    #[test]
    fn test_rebuild_only_on_own_frame() {
        let room = room();
        let mut rng = StdRng::seed_from_u64(3);
        let mut navigator = EnemyNavigator::new(7, 2.0, 100.0, NavigationConfig::default());

        let other_frame = input(&room, Position::new(1, 1), Position::new(5, 1), 8);
        assert_eq!(navigator.advance(0.016, &other_frame, &mut rng), NavigationStep::Idle);
        assert_eq!(navigator.generation(), 0);

        let own_frame = input(&room, Position::new(1, 1), Position::new(5, 1), 67);
        assert!(matches!(
            navigator.advance(0.016, &own_frame, &mut rng),
            NavigationStep::MoveTowards { .. }
        ));
        assert_eq!(navigator.generation(), 1);
    }

    #[test]
    fn test_cooldown_and_player_movement_trigger_rebuilds() {
        let room = room();
        let mut rng = StdRng::seed_from_u64(4);
        let mut navigator = EnemyNavigator::new(0, 2.0, 100.0, NavigationConfig::default());

        navigator.advance(0.1, &input(&room, Position::new(1, 1), Position::new(5, 1), 0), &mut rng);
        assert_eq!(navigator.generation(), 1);

        // Within cooldown and the player barely moved.
        navigator.advance(0.1, &input(&room, Position::new(1, 1), Position::new(5, 2), 60), &mut rng);
        assert_eq!(navigator.generation(), 1);

        // Player moved further than the rebuild distance.
        navigator.advance(0.1, &input(&room, Position::new(1, 1), Position::new(8, 5), 120), &mut rng);
        assert_eq!(navigator.generation(), 2);

        // Cooldown expired.
        navigator.advance(2.5, &input(&room, Position::new(1, 1), Position::new(8, 5), 180), &mut rng);
        assert_eq!(navigator.generation(), 3);
    }

    #[test]
    fn test_walks_path_to_exhaustion() {
        let room = room();
        let mut rng = StdRng::seed_from_u64(5);
        let mut navigator = EnemyNavigator::new(0, 2.0, 100.0, NavigationConfig::default());

        let start = input(&room, Position::new(1, 1), Position::new(3, 1), 0);
        assert!(navigator.advance(0.0, &start, &mut rng).ne(&NavigationStep::Idle));

        let at_first = input(&room, Position::new(2, 1), Position::new(3, 1), 1);
        match navigator.advance(0.0, &at_first, &mut rng) {
            NavigationStep::MoveTowards { target, direction, .. } => {
                assert_eq!(target, WorldPoint::cell_center(Position::new(3, 1)));
                assert!((direction.x - 1.0).abs() < 1e-6);
            }
            NavigationStep::Idle => panic!("expected movement"),
        }

        let at_end = input(&room, Position::new(3, 1), Position::new(3, 1), 2);
        assert_eq!(navigator.advance(0.0, &at_end, &mut rng), NavigationStep::Idle);
        assert_eq!(navigator.state(), &NavigatorState::Idle);
    }

    #[test]
    fn test_cancel_discards_movement() {
        let room = room();
        let mut rng = StdRng::seed_from_u64(6);
        let mut navigator = EnemyNavigator::new(0, 2.0, 100.0, NavigationConfig::default());

        navigator.advance(0.0, &input(&room, Position::new(1, 1), Position::new(5, 1), 0), &mut rng);
        assert!(navigator.is_chasing());

        navigator.cancel();
        assert!(!navigator.is_chasing());
        let step = navigator.advance(0.0, &input(&room, Position::new(1, 1), Position::new(5, 1), 1), &mut rng);
        assert_eq!(step, NavigationStep::Idle);
    }

    #[test]
    fn test_unreachable_player_goes_idle() {
        let mut room = room();
        let mut rng = StdRng::seed_from_u64(7);
        // Box the enemy in.
        room.obstacles.register_movable(CellRect::new(Position::new(0, 0), Position::new(2, 0)));
        room.obstacles.register_movable(CellRect::new(Position::new(0, 2), Position::new(2, 2)));
        room.obstacles.register_movable(CellRect::new(Position::new(2, 1), Position::new(2, 1)));

        let mut navigator = EnemyNavigator::new(0, 2.0, 100.0, NavigationConfig::default());
        let step = navigator.advance(0.0, &input(&room, Position::new(1, 1), Position::new(6, 4), 0), &mut rng);
        assert_eq!(step, NavigationStep::Idle);
        assert_eq!(navigator.generation(), 1);
    }

    #[test]
    fn test_blocked_player_cell_resolves_to_walkable_neighbour() {
        let mut room = room();
        let mut rng = StdRng::seed_from_u64(8);
        room.obstacles.register_movable(CellRect::new(Position::new(5, 4), Position::new(5, 4)));

        let target = resolve_target_cell(&room, WorldPoint::cell_center(Position::new(5, 4)), &mut rng);
        assert_ne!(target, Position::new(5, 4));
        assert!((target.x - 5).abs() <= 1 && (target.y - 4).abs() <= 1);
        assert!(room.obstacles.is_walkable(room.obstacles.to_local(target)));
    }

    #[test]
    fn test_player_outside_room_falls_back_to_spawn_cell() {
        let room = room();
        let mut rng = StdRng::seed_from_u64(9);
        let target = resolve_target_cell(&room, WorldPoint::new(-50.0, -50.0), &mut rng);
        let spawns = room.spawn_cells();
        assert!(spawns.contains(&target));
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = NavigationConfig {
            frames_to_spread_pathfinding_over: 0,
            ..NavigationConfig::default()
        };
        assert!(config.validate().is_err());
        assert!(NavigationConfig::default().validate().is_ok());
    }
}
