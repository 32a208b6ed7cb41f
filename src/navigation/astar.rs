//! # A* Pathfinder
//!
//! Stateless grid search over a room's [`ObstacleGrid`].
//!
//! Every call allocates its own [`GridNodes`], open heap and closed set, so
//! searches never share state. The open heap uses lazy deletion: improved
//! nodes are pushed again and stale entries are skipped when popped.

use super::grid::GridNodes;
use crate::{octile_distance, ObstacleGrid, Position, Room, WorldPoint, NEIGHBOUR_OFFSETS};
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// One waypoint of a path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathStep {
    /// World grid cell
    pub cell: Position,
    /// Centre of `cell` in world space
    pub world: WorldPoint,
}

impl PathStep {
    pub fn new(cell: Position) -> Self {
        Self {
            cell,
            world: WorldPoint::cell_center(cell),
        }
    }
}

/// Last-in-first-out sequence of waypoints. The top is the start cell.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PathStack {
    steps: Vec<PathStep>,
}

impl PathStack {
    /// Builds a stack from cells ordered target first, start last.
    pub fn from_target_to_start(cells: impl IntoIterator<Item = Position>) -> Self {
        Self {
            steps: cells.into_iter().map(PathStep::new).collect(),
        }
    }

    pub fn pop(&mut self) -> Option<PathStep> {
        self.steps.pop()
    }

    pub fn peek(&self) -> Option<&PathStep> {
        self.steps.last()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Waypoints in travel order, top of the stack first.
    pub fn iter(&self) -> impl Iterator<Item = &PathStep> {
        self.steps.iter().rev()
    }

    /// World cells in travel order.
    pub fn cells(&self) -> Vec<Position> {
        self.iter().map(|step| step.cell).collect()
    }
}

/// Result of a raw search in room-local coordinates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchOutcome {
    /// Local cells from start to target, if the target was reached
    pub path: Option<Vec<Position>>,
    /// Total g cost of `path`
    pub cost: Option<i32>,
    /// f cost of every node taken off the open heap, in pop order
    pub expanded_f_costs: Vec<i32>,
}

/// Open heap entry.
///
/// Search order is lower `f_cost` first, then lower `h_cost`, then earlier
/// insertion. `Ord` is reversed so `BinaryHeap` pops the minimum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct OpenEntry {
    f_cost: i32,
    h_cost: i32,
    g_cost: i32,
    sequence: u64,
    index: usize,
}

impl Ord for OpenEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .f_cost
            .cmp(&self.f_cost)
            .then_with(|| other.h_cost.cmp(&self.h_cost))
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Grid pathfinder used by enemies.
pub struct AStar;

impl AStar {
    /// Finds a path between two world cells inside `room`.
    ///
    /// Returns `None` when either cell lies outside the room or the target
    /// cannot be reached. The top of the returned stack is `start`, which the
    /// caller usually pops since the mover already stands there.
    pub fn build_path(room: &Room, start: Position, end: Position) -> Option<PathStack> {
        Self::build_path_in(&room.obstacles, start, end)
    }

    /// [`AStar::build_path`] against a bare obstacle grid.
    ///
    /// # Examples
    ///
    /// ```
    /// use delve::{AStar, CellRect, ObstacleGrid, Position};
    ///
    /// let grid = ObstacleGrid::new(CellRect::new(Position::new(10, 10), Position::new(14, 14)));
    /// let mut path = AStar::build_path_in(&grid, Position::new(10, 10), Position::new(12, 10)).unwrap();
    ///
    /// assert_eq!(path.pop().unwrap().cell, Position::new(10, 10));
    /// assert_eq!(path.pop().unwrap().cell, Position::new(11, 10));
    /// assert_eq!(path.pop().unwrap().cell, Position::new(12, 10));
    /// assert!(path.is_empty());
    /// ```
    pub fn build_path_in(grid: &ObstacleGrid, start: Position, end: Position) -> Option<PathStack> {
        let outcome = Self::search(grid, grid.to_local(start), grid.to_local(end));
        let local_path = outcome.path?;

        Some(PathStack::from_target_to_start(
            local_path.into_iter().rev().map(|local| grid.to_world(local)),
        ))
    }

    /// Runs the search between two room-local cells.
    pub fn search(grid: &ObstacleGrid, start: Position, end: Position) -> SearchOutcome {
        let mut nodes = GridNodes::new(grid.width(), grid.height());
        let mut outcome = SearchOutcome::default();

        let (Some(start_index), Some(target_index)) = (nodes.index_of(start), nodes.index_of(end))
        else {
            return outcome;
        };

        let cell_count = (nodes.width() * nodes.height()) as usize;
        let mut in_open = vec![false; cell_count];
        let mut closed = vec![false; cell_count];
        let mut open = BinaryHeap::new();
        let mut sequence = 0u64;

        let start_node = nodes.node_mut(start_index);
        start_node.h_cost = octile_distance(start, end);
        open.push(OpenEntry {
            f_cost: start_node.f_cost(),
            h_cost: start_node.h_cost,
            g_cost: 0,
            sequence,
            index: start_index,
        });
        in_open[start_index] = true;

        while let Some(entry) = open.pop() {
            let current = *nodes.node(entry.index);
            if closed[entry.index] || entry.g_cost != current.g_cost {
                continue;
            }

            outcome.expanded_f_costs.push(entry.f_cost);

            if entry.index == target_index {
                let mut path = nodes.trace_back(target_index);
                path.reverse();
                outcome.path = Some(path);
                outcome.cost = Some(current.g_cost);
                return outcome;
            }

            closed[entry.index] = true;

            for offset in NEIGHBOUR_OFFSETS {
                let neighbour = current.position + offset;
                let Some(index) = nodes.index_of(neighbour) else {
                    continue;
                };
                if closed[index] || !grid.is_walkable(neighbour) {
                    continue;
                }
                let Some(penalty) = grid.movement_penalty(neighbour) else {
                    continue;
                };

                let tentative = current.g_cost + octile_distance(current.position, neighbour) + penalty;
                let node = nodes.node_mut(index);
                if in_open[index] && tentative >= node.g_cost {
                    continue;
                }

                node.g_cost = tentative;
                node.h_cost = octile_distance(neighbour, end);
                node.parent = Some(entry.index);
                in_open[index] = true;

                sequence += 1;
                open.push(OpenEntry {
                    f_cost: node.f_cost(),
                    h_cost: node.h_cost,
                    g_cost: node.g_cost,
                    sequence,
                    index,
                });
            }
        }

        outcome
    }
}
