//! # Navigation Module
//!
//! Enemy pathfinding inside a single room.
//!
//! - [`ObstacleGrid`]: the static and dynamic cost layers of a room
//! - [`AStar`]: octile grid search over those layers
//! - [`EnemyNavigator`]: staggered path rebuilds and waypoint stepping

pub mod astar;
pub mod driver;
pub mod grid;
pub mod obstacles;

pub use astar::*;
pub use driver::*;
pub use grid::*;
pub use obstacles::*;
