//! # Room Node Graphs
//!
//! Abstract connectivity blueprints authored offline. The builder reads them;
//! nothing at runtime mutates them.

use crate::{config, DelveError, DelveResult, RoomNodeType};
use pathfinding::prelude::bfs_reach;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A single node of a room node graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomNode {
    pub id: String,
    pub node_type: RoomNodeType,
    #[serde(default)]
    pub parent_ids: Vec<String>,
    #[serde(default)]
    pub child_ids: Vec<String>,
}

impl RoomNode {
    pub fn new(id: impl Into<String>, node_type: RoomNodeType) -> Self {
        Self {
            id: id.into(),
            node_type,
            parent_ids: Vec::new(),
            child_ids: Vec::new(),
        }
    }
}

/// Directed graph of room nodes rooted at the entrance.
///
/// # Examples
///
/// ```
/// use delve::{RoomNodeGraph, RoomNodeType};
///
/// let mut graph = RoomNodeGraph::new("tiny");
/// graph.add_node("entrance", RoomNodeType::Entrance).unwrap();
/// graph.add_node("corridor", RoomNodeType::Corridor).unwrap();
/// graph.add_node("boss", RoomNodeType::BossRoom).unwrap();
/// graph.connect("entrance", "corridor").unwrap();
/// graph.connect("corridor", "boss").unwrap();
///
/// assert!(graph.validate().is_ok());
/// assert_eq!(graph.entrance().unwrap().id, "entrance");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomNodeGraph {
    pub name: String,
    pub nodes: Vec<RoomNode>,
}

impl RoomNodeGraph {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            nodes: Vec::new(),
        }
    }

    /// Adds an unlinked node.
    pub fn add_node(&mut self, id: impl Into<String>, node_type: RoomNodeType) -> DelveResult<()> {
        let id = id.into();
        if self.node(&id).is_some() {
            return Err(DelveError::InvalidConfig(format!(
                "graph '{}' already has a node '{}'",
                self.name, id
            )));
        }
        self.nodes.push(RoomNode::new(id, node_type));
        Ok(())
    }

    /// Links `parent_id` to `child_id` if the authoring rules allow it.
    pub fn connect(&mut self, parent_id: &str, child_id: &str) -> DelveResult<()> {
        if !self.can_add_child(parent_id, child_id) {
            return Err(DelveError::InvalidConfig(format!(
                "graph '{}': '{}' cannot be a child of '{}'",
                self.name, child_id, parent_id
            )));
        }

        if let Some(parent) = self.node_mut(parent_id) {
            parent.child_ids.push(child_id.to_string());
        }
        if let Some(child) = self.node_mut(child_id) {
            child.parent_ids.push(parent_id.to_string());
        }
        Ok(())
    }

    /// Authoring rule check for a new parent-to-child link.
    ///
    /// Corridors and rooms must alternate, a node has at most one parent,
    /// only one boss room may be linked, and a room may fan out into at most
    /// [`config::MAX_CHILD_CORRIDORS`] corridors while a corridor leads to a
    /// single room.
    pub fn can_add_child(&self, parent_id: &str, child_id: &str) -> bool {
        let (Some(parent), Some(child)) = (self.node(parent_id), self.node(child_id)) else {
            return false;
        };

        let boss_already_linked = self
            .nodes
            .iter()
            .any(|node| node.node_type.is_boss_room() && !node.parent_ids.is_empty());

        if child.node_type.is_boss_room() && boss_already_linked {
            return false;
        }

        if child.node_type.is_none() || parent.node_type.is_none() {
            return false;
        }

        if parent_id == child_id
            || parent.child_ids.iter().any(|id| id == child_id)
            || parent.parent_ids.iter().any(|id| id == child_id)
            || !child.parent_ids.is_empty()
        {
            return false;
        }

        if child.node_type.is_corridor() == parent.node_type.is_corridor() {
            return false;
        }

        if child.node_type.is_corridor() && parent.child_ids.len() >= config::MAX_CHILD_CORRIDORS {
            return false;
        }

        if child.node_type.is_entrance() {
            return false;
        }

        if !child.node_type.is_corridor() && !parent.child_ids.is_empty() {
            return false;
        }

        true
    }

    pub fn node(&self, id: &str) -> Option<&RoomNode> {
        self.nodes.iter().find(|node| node.id == id)
    }

    fn node_mut(&mut self, id: &str) -> Option<&mut RoomNode> {
        self.nodes.iter_mut().find(|node| node.id == id)
    }

    /// The root of the graph.
    pub fn entrance(&self) -> Option<&RoomNode> {
        self.nodes.iter().find(|node| node.node_type.is_entrance())
    }

    /// Children of `node`, in authored order. Unknown IDs are skipped.
    pub fn children<'a>(&'a self, node: &'a RoomNode) -> impl Iterator<Item = &'a RoomNode> + 'a {
        node.child_ids.iter().filter_map(move |id| self.node(id))
    }

    /// Node types that need templates, excluding unassigned nodes.
    pub fn node_types(&self) -> HashSet<RoomNodeType> {
        self.nodes
            .iter()
            .map(|node| node.node_type)
            .filter(|node_type| !node_type.is_none())
            .collect()
    }

    /// Nodes the builder will turn into rooms.
    pub fn buildable_node_count(&self) -> usize {
        self.nodes.iter().filter(|node| !node.node_type.is_none()).count()
    }

    /// Verifies the structural invariants authoring is meant to guarantee.
    pub fn validate(&self) -> DelveResult<()> {
        let invalid = |reason: String| {
            Err(DelveError::InvalidConfig(format!("graph '{}': {}", self.name, reason)))
        };

        let entrances: Vec<&RoomNode> = self
            .nodes
            .iter()
            .filter(|node| node.node_type.is_entrance())
            .collect();
        if entrances.len() != 1 {
            return invalid(format!("expected one entrance node, found {}", entrances.len()));
        }
        let entrance = entrances[0];
        if !entrance.parent_ids.is_empty() {
            return invalid("the entrance node has parents".to_string());
        }

        let linked_bosses = self
            .nodes
            .iter()
            .filter(|node| node.node_type.is_boss_room() && !node.parent_ids.is_empty())
            .count();
        if linked_bosses > 1 {
            return invalid(format!("{} boss rooms are linked", linked_bosses));
        }

        for node in self.nodes.iter().filter(|node| !node.node_type.is_none()) {
            if !node.node_type.is_entrance() && node.parent_ids.len() != 1 {
                return invalid(format!(
                    "node '{}' has {} parents",
                    node.id,
                    node.parent_ids.len()
                ));
            }

            let corridor_children = node.child_ids.len();
            if !node.node_type.is_corridor() && corridor_children > config::MAX_CHILD_CORRIDORS {
                return invalid(format!(
                    "node '{}' has {} corridor children",
                    node.id, corridor_children
                ));
            }
            if node.node_type.is_corridor() && node.child_ids.len() > 1 {
                return invalid(format!("corridor '{}' has more than one child", node.id));
            }

            for child_id in &node.child_ids {
                let Some(child) = self.node(child_id) else {
                    return invalid(format!("node '{}' links to unknown '{}'", node.id, child_id));
                };
                if child.node_type.is_corridor() == node.node_type.is_corridor() {
                    return invalid(format!(
                        "'{}' and its child '{}' must alternate between corridor and room",
                        node.id, child.id
                    ));
                }
                if !child.parent_ids.iter().any(|id| id == &node.id) {
                    return invalid(format!(
                        "child '{}' does not list '{}' as its parent",
                        child.id, node.id
                    ));
                }
            }
        }

        let reachable: HashSet<&str> = bfs_reach(entrance.id.as_str(), |id: &&str| {
            self.node(id)
                .map(|node| node.child_ids.iter().map(String::as_str).collect::<Vec<_>>())
                .unwrap_or_default()
        })
        .collect();

        if let Some(orphan) = self
            .nodes
            .iter()
            .find(|node| !node.node_type.is_none() && !reachable.contains(node.id.as_str()))
        {
            return invalid(format!("node '{}' is unreachable from the entrance", orphan.id));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn linear_graph() -> RoomNodeGraph {
        let mut graph = RoomNodeGraph::new("linear");
        graph.add_node("entrance", RoomNodeType::Entrance).unwrap();
        graph.add_node("c1", RoomNodeType::Corridor).unwrap();
        graph.add_node("room", RoomNodeType::Standard).unwrap();
        graph.add_node("c2", RoomNodeType::Corridor).unwrap();
        graph.add_node("boss", RoomNodeType::BossRoom).unwrap();
        graph.connect("entrance", "c1").unwrap();
        graph.connect("c1", "room").unwrap();
        graph.connect("room", "c2").unwrap();
        graph.connect("c2", "boss").unwrap();
        graph
    }

    #[test]
    fn test_valid_graph() {
        let graph = linear_graph();
        assert!(graph.validate().is_ok());
        assert_eq!(graph.buildable_node_count(), 5);
        assert!(graph.node_types().contains(&RoomNodeType::Corridor));

        let entrance = graph.entrance().unwrap();
        let children: Vec<&str> = graph.children(entrance).map(|n| n.id.as_str()).collect();
        assert_eq!(children, vec!["c1"]);
    }

    #[test]
    fn test_rooms_and_corridors_must_alternate() {
        let mut graph = linear_graph();
        graph.add_node("other", RoomNodeType::Standard).unwrap();
        graph.add_node("c3", RoomNodeType::Corridor).unwrap();

        assert!(!graph.can_add_child("room", "other"));
        assert!(!graph.can_add_child("c2", "c3"));
        assert!(graph.can_add_child("room", "c3"));
    }

    #[test]
    fn test_single_linked_boss() {
        let mut graph = linear_graph();
        graph.add_node("c3", RoomNodeType::Corridor).unwrap();
        graph.add_node("boss2", RoomNodeType::BossRoom).unwrap();
        graph.connect("room", "c3").unwrap();

        assert!(!graph.can_add_child("c3", "boss2"));
    }

    #[test]
    fn test_corridor_fan_out_is_limited() {
        let mut graph = RoomNodeGraph::new("fan");
        graph.add_node("entrance", RoomNodeType::Entrance).unwrap();
        for i in 0..4 {
            graph.add_node(format!("c{}", i), RoomNodeType::Corridor).unwrap();
        }
        for i in 0..3 {
            graph.connect("entrance", &format!("c{}", i)).unwrap();
        }
        assert!(graph.connect("entrance", "c3").is_err());
    }

    #[test]
    fn test_corridor_leads_to_one_room() {
        let mut graph = linear_graph();
        graph.add_node("extra", RoomNodeType::Standard).unwrap();
        assert!(!graph.can_add_child("c1", "extra"));
    }

    #[test]
    fn test_invalid_links_rejected() {
        let mut graph = linear_graph();
        graph.add_node("unset", RoomNodeType::None).unwrap();

        assert!(!graph.can_add_child("room", "room"));
        assert!(!graph.can_add_child("c1", "entrance"));
        assert!(!graph.can_add_child("room", "unset"));
        assert!(!graph.can_add_child("room", "missing"));
        // Already has a parent
        assert!(!graph.can_add_child("entrance", "c2"));
    }

    #[test]
    fn test_duplicate_node_rejected() {
        let mut graph = linear_graph();
        assert!(graph.add_node("room", RoomNodeType::Standard).is_err());
    }

    #[test]
    fn test_validation_detects_missing_entrance() {
        let mut graph = RoomNodeGraph::new("empty");
        graph.add_node("room", RoomNodeType::Standard).unwrap();
        assert!(graph.validate().is_err());
    }

    #[test]
    fn test_validation_detects_orphans() {
        let mut graph = linear_graph();
        graph.add_node("lost", RoomNodeType::Standard).unwrap();
        assert!(graph.validate().is_err());

        // Unassigned leftovers are ignored
        let mut graph = linear_graph();
        graph.add_node("unset", RoomNodeType::None).unwrap();
        assert!(graph.validate().is_ok());
    }

    #[test]
    fn test_validation_detects_asymmetric_links() {
        let mut graph = linear_graph();
        graph.nodes[2].parent_ids.clear();
        assert!(graph.validate().is_err());
    }

    #[test]
    fn test_graph_from_json() {
        let json = r#"{
            "name": "json",
            "nodes": [
                { "id": "e", "node_type": "entrance", "child_ids": ["c"] },
                { "id": "c", "node_type": "corridor", "parent_ids": ["e"], "child_ids": ["b"] },
                { "id": "b", "node_type": "boss_room", "parent_ids": ["c"] }
            ]
        }"#;
        let graph: RoomNodeGraph = serde_json::from_str(json).unwrap();
        assert!(graph.validate().is_ok());
        assert_eq!(graph.node("b").unwrap().node_type, RoomNodeType::BossRoom);
    }
}
