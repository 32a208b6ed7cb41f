//! # Dungeon Levels
//!
//! Per-level content (templates plus candidate node graphs) and the ordered
//! catalog of levels loaded at startup.

use crate::{DelveError, DelveResult, RoomNodeGraph, RoomNodeType, RoomTemplate};
use log::warn;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Everything the builder needs for one difficulty level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DungeonLevel {
    pub name: String,
    pub room_templates: Vec<RoomTemplate>,
    pub room_node_graphs: Vec<RoomNodeGraph>,
}

impl DungeonLevel {
    pub fn new(
        name: impl Into<String>,
        room_templates: Vec<RoomTemplate>,
        room_node_graphs: Vec<RoomNodeGraph>,
    ) -> Self {
        Self {
            name: name.into(),
            room_templates,
            room_node_graphs,
        }
    }

    /// Templates that can fill a node of `node_type`.
    pub fn templates_for(&self, node_type: RoomNodeType) -> impl Iterator<Item = &RoomTemplate> {
        self.room_templates
            .iter()
            .filter(move |template| template.node_type.can_fill(node_type))
    }

    /// Templates authored with exactly `node_type`.
    pub fn templates_of_type(&self, node_type: RoomNodeType) -> impl Iterator<Item = &RoomTemplate> {
        self.room_templates
            .iter()
            .filter(move |template| template.node_type == node_type)
    }

    pub fn template(&self, id: &str) -> Option<&RoomTemplate> {
        self.room_templates.iter().find(|template| template.id == id)
    }

    /// Startup validation.
    ///
    /// Fails on anything that would make generation impossible: no templates
    /// or graphs, invalid templates or graphs, or a node type used by a graph
    /// that no template can fill. Missing corridor or entrance templates that
    /// no graph needs are only logged.
    pub fn validate(&self) -> DelveResult<()> {
        if self.name.is_empty() {
            return Err(DelveError::InvalidConfig(
                "dungeon level with an empty name".to_string(),
            ));
        }

        if self.room_templates.is_empty() {
            return Err(DelveError::InvalidConfig(format!(
                "level '{}' has no room templates",
                self.name
            )));
        }

        if self.room_node_graphs.is_empty() {
            return Err(DelveError::InvalidConfig(format!(
                "level '{}' has no room node graphs",
                self.name
            )));
        }

        for template in &self.room_templates {
            template.validate()?;
        }

        for (node_type, label) in [
            (RoomNodeType::CorridorEW, "east-west corridor"),
            (RoomNodeType::CorridorNS, "north-south corridor"),
            (RoomNodeType::Entrance, "entrance"),
        ] {
            if self.templates_of_type(node_type).next().is_none() {
                warn!("Level '{}' has no {} room template", self.name, label);
            }
        }

        for graph in &self.room_node_graphs {
            graph.validate()?;

            for node_type in graph.node_types() {
                if self.templates_for(node_type).next().is_none() {
                    return Err(DelveError::InvalidConfig(format!(
                        "level '{}': no room template for {:?} nodes in graph '{}'",
                        self.name, node_type, graph.name
                    )));
                }
            }
        }

        Ok(())
    }
}

/// Ordered list of dungeon levels, easiest first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelCatalog {
    pub levels: Vec<DungeonLevel>,
}

impl LevelCatalog {
    pub fn new(levels: Vec<DungeonLevel>) -> Self {
        Self { levels }
    }

    /// Parses a catalog from JSON and validates it.
    pub fn from_json_str(json: &str) -> DelveResult<Self> {
        let catalog: LevelCatalog = serde_json::from_str(json)?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Reads, parses and validates a catalog file.
    pub fn load_from_path(path: impl AsRef<Path>) -> DelveResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn to_json_string(&self) -> DelveResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn level(&self, index: usize) -> Option<&DungeonLevel> {
        self.levels.get(index)
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn validate(&self) -> DelveResult<()> {
        if self.levels.is_empty() {
            return Err(DelveError::InvalidConfig(
                "level catalog is empty".to_string(),
            ));
        }
        for level in &self.levels {
            level.validate()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::demo;

    #[test]
    fn test_demo_level_is_valid() {
        let level = demo::demo_level("Level 1");
        assert!(level.validate().is_ok());
        assert!(level.templates_for(RoomNodeType::Corridor).count() >= 2);
        assert!(level.templates_of_type(RoomNodeType::Entrance).next().is_some());
    }

    #[test]
    fn test_level_without_templates_is_fatal() {
        let mut level = demo::demo_level("Level 1");
        level.room_templates.clear();
        assert!(matches!(
            level.validate(),
            Err(DelveError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_level_missing_boss_template_is_fatal() {
        let mut level = demo::demo_level("Level 1");
        level
            .room_templates
            .retain(|template| !template.node_type.is_boss_room());
        assert!(level.validate().is_err());
    }

    #[test]
    fn test_catalog_json_round_trip_validates() {
        let catalog = demo::demo_catalog();
        let json = catalog.to_json_string().unwrap();
        let restored = LevelCatalog::from_json_str(&json).unwrap();
        assert_eq!(restored.len(), catalog.len());
        assert_eq!(restored.level(0).unwrap().name, catalog.level(0).unwrap().name);
    }

    #[test]
    fn test_empty_catalog_is_invalid() {
        assert!(LevelCatalog::default().validate().is_err());
        assert!(LevelCatalog::from_json_str("{ \"levels\": [] }").is_err());
        assert!(matches!(
            LevelCatalog::from_json_str("not json"),
            Err(DelveError::Serde(_))
        ));
    }
}
