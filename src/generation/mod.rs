//! # Generation Module
//!
//! Procedural dungeon construction from authored content.
//!
//! This module holds the authored inputs (room templates, doorways, tile
//! layers, room node graphs, levels) and the backtracking builder that turns
//! them into a [`Dungeon`](crate::Dungeon). A small built-in demo catalog
//! lives in [`demo`] for previews and tests.

pub mod demo;
pub mod doorway;
pub mod dungeon;
pub mod graph;
pub mod level;
pub mod template;
pub mod tilemap;

pub use doorway::*;
pub use dungeon::*;
pub use graph::*;
pub use level::*;
pub use template::*;
pub use tilemap::*;

use crate::{config, CellRect, DelveResult};
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

/// Configuration for a dungeon build.
///
/// Controls the seed, the retry budgets and the placement constraints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Random seed for reproducible generation
    pub seed: u64,
    /// Node graphs tried before the build is declared exhausted
    pub max_build_attempts: u32,
    /// Room placements tested per chosen node graph
    pub max_placement_attempts_per_graph: u32,
    /// Grows every placed room by this many cells when testing overlap
    #[serde(default)]
    pub overlap_margin: i32,
    /// Rooms must lie inside this rectangle when set
    #[serde(default)]
    pub build_bounds: Option<CellRect>,
}

impl GenerationConfig {
    /// Creates a default generation configuration.
    ///
    /// # Examples
    ///
    /// ```
    /// use delve::GenerationConfig;
    ///
    /// let config = GenerationConfig::new(7);
    /// assert_eq!(config.seed, 7);
    /// assert_eq!(config.max_build_attempts, 10);
    /// assert!(config.build_bounds.is_none());
    /// ```
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            max_build_attempts: config::MAX_DUNGEON_BUILD_ATTEMPTS,
            max_placement_attempts_per_graph: config::MAX_PLACEMENT_ATTEMPTS_PER_GRAPH,
            overlap_margin: 0,
            build_bounds: None,
        }
    }

    /// Creates a configuration for testing with smaller budgets.
    pub fn for_testing(seed: u64) -> Self {
        Self {
            seed,
            max_build_attempts: 5,
            max_placement_attempts_per_graph: 200,
            overlap_margin: 0,
            build_bounds: None,
        }
    }

    /// Restricts placement to `bounds`.
    pub fn with_build_bounds(mut self, bounds: CellRect) -> Self {
        self.build_bounds = Some(bounds);
        self
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self::new(42)
    }
}

/// Trait for procedural generators.
///
/// Generators take their collaborators at construction time and draw every
/// random choice from the supplied RNG.
pub trait Generator<T> {
    /// Generates content using the provided configuration and random number generator.
    fn generate(&self, config: &GenerationConfig, rng: &mut StdRng) -> DelveResult<T>;

    /// Validates that the generated content meets requirements.
    fn validate(&self, content: &T, config: &GenerationConfig) -> DelveResult<()>;

    /// Gets the generator type name for logging and debugging.
    fn generator_type(&self) -> &'static str;
}

/// Utility functions for generation algorithms.
pub mod utils {
    use super::*;
    use rand::SeedableRng;

    /// Creates a seeded random number generator from the config.
    pub fn create_rng(config: &GenerationConfig) -> StdRng {
        StdRng::seed_from_u64(config.seed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Position;
    use rand::Rng;

    #[test]
    fn test_generation_config_creation() {
        let config = GenerationConfig::new(12345);
        assert_eq!(config.seed, 12345);
        assert_eq!(config.max_placement_attempts_per_graph, 1000);
        assert_eq!(config.overlap_margin, 0);
        assert_eq!(GenerationConfig::default().seed, 42);
    }

    #[test]
    fn test_generation_config_serialization() {
        let bounds = CellRect::new(Position::new(-100, -100), Position::new(100, 100));
        let config = GenerationConfig::for_testing(9).with_build_bounds(bounds);
        let json = serde_json::to_string(&config).unwrap();
        let restored: GenerationConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, config);
    }

    #[test]
    fn test_utils_rng_is_seeded() {
        let config = GenerationConfig::new(12345);
        let a: u64 = utils::create_rng(&config).gen();
        let b: u64 = utils::create_rng(&config).gen();
        assert_eq!(a, b);
    }
}
