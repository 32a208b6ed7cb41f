//! # Grid Node Store
//!
//! Dense per-search storage of A* bookkeeping, indexed by room-local cell.

use crate::Position;

/// A* bookkeeping for one room-local cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridNode {
    pub position: Position,
    /// Cost from the start
    pub g_cost: i32,
    /// Heuristic cost to the target
    pub h_cost: i32,
    /// Index of the node this one was reached from
    pub parent: Option<usize>,
}

impl GridNode {
    pub fn new(position: Position) -> Self {
        Self {
            position,
            g_cost: 0,
            h_cost: 0,
            parent: None,
        }
    }

    pub fn f_cost(&self) -> i32 {
        self.g_cost + self.h_cost
    }
}

/// Fixed-size 2D array of [`GridNode`]s, created fresh for every search.
#[derive(Debug, Clone)]
pub struct GridNodes {
    width: i32,
    height: i32,
    nodes: Vec<GridNode>,
}

impl GridNodes {
    /// Allocates `width * height` nodes. Non-positive sizes give an empty store.
    pub fn new(width: i32, height: i32) -> Self {
        let width = width.max(0);
        let height = height.max(0);
        let nodes = (0..height)
            .flat_map(|y| (0..width).map(move |x| GridNode::new(Position::new(x, y))))
            .collect();

        Self {
            width,
            height,
            nodes,
        }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn contains(&self, pos: Position) -> bool {
        pos.x >= 0 && pos.y >= 0 && pos.x < self.width && pos.y < self.height
    }

    /// Flat index of `pos`, or `None` outside the grid.
    pub fn index_of(&self, pos: Position) -> Option<usize> {
        if self.contains(pos) {
            Some((pos.y * self.width + pos.x) as usize)
        } else {
            None
        }
    }

    pub fn node(&self, index: usize) -> &GridNode {
        &self.nodes[index]
    }

    pub fn node_mut(&mut self, index: usize) -> &mut GridNode {
        &mut self.nodes[index]
    }

    /// Follows parent links from `index` back to the root of the search.
    ///
    /// Returns cells in target-to-start order.
    pub fn trace_back(&self, index: usize) -> Vec<Position> {
        let mut cells = Vec::new();
        let mut current = Some(index);
        while let Some(index) = current {
            let node = &self.nodes[index];
            cells.push(node.position);
            current = node.parent;
        }
        cells
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nodes_are_indexed_by_local_cell() {
        let nodes = GridNodes::new(4, 3);
        assert_eq!(nodes.width(), 4);
        assert_eq!(nodes.height(), 3);

        let index = nodes.index_of(Position::new(2, 1)).unwrap();
        assert_eq!(nodes.node(index).position, Position::new(2, 1));
        let corner = nodes.index_of(Position::new(3, 2)).unwrap();
        assert_eq!(corner, 11);
        assert_eq!(nodes.node(corner).position, Position::new(3, 2));
    }

    #[test]
    fn test_out_of_bounds_cells_are_rejected() {
        let nodes = GridNodes::new(4, 3);
        assert!(nodes.index_of(Position::new(-1, 0)).is_none());
        assert!(nodes.index_of(Position::new(4, 0)).is_none());
        assert!(nodes.index_of(Position::new(0, 3)).is_none());
        assert!(GridNodes::new(-2, 5).index_of(Position::origin()).is_none());
    }

    #[test]
    fn test_trace_back_follows_parents() {
        let mut nodes = GridNodes::new(3, 1);
        let a = nodes.index_of(Position::new(0, 0)).unwrap();
        let b = nodes.index_of(Position::new(1, 0)).unwrap();
        let c = nodes.index_of(Position::new(2, 0)).unwrap();
        nodes.node_mut(b).parent = Some(a);
        nodes.node_mut(c).parent = Some(b);

        assert_eq!(
            nodes.trace_back(c),
            vec![Position::new(2, 0), Position::new(1, 0), Position::new(0, 0)]
        );
    }
}
