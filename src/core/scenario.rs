//! Scenario serialization and deserialization
//!
//! Supports saving and loading simulation scenarios in RON (Rusty Object
//! Notation) and JSON. A scenario is pure data: the navigation grid, the
//! obstacle boxes, the player, and the enemy roster with its tuning. Every
//! field defaults, so a hand-written scenario only names what it changes.

use std::fs;
use std::path::Path;

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::ai::{BehaviorConfig, StateKind, VisionConfig};
use crate::nav::NavGrid;

/// Navigation grid description
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridSpec {
    /// Width in cells (world X axis)
    pub width: usize,
    /// Height in cells (world Z axis)
    pub height: usize,
    /// Cell size in world units
    pub cell_size: f32,
    /// World-space XZ position of the grid's corner
    pub origin: Vec2,
    /// Y coordinate of the walkable surface
    pub surface_height: f32,
}

impl Default for GridSpec {
    fn default() -> Self {
        Self {
            width: 24,
            height: 24,
            cell_size: 1.0,
            origin: Vec2::new(-12.0, -12.0),
            surface_height: 0.0,
        }
    }
}

impl GridSpec {
    /// Build the runtime grid (all cells walkable; obstacles block later).
    #[must_use]
    pub fn build(&self) -> NavGrid {
        let mut grid = NavGrid::new(self.width, self.height, self.cell_size);
        grid.origin = self.origin;
        grid.surface_height = self.surface_height;
        grid
    }
}

/// A static box obstacle: blocks both sight lines and grid cells
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    /// World-space center of the box
    pub center: Vec3,
    /// Half extents along each axis
    pub half_extents: Vec3,
}

/// The player's spawn data
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerSpec {
    /// World-space spawn position
    pub position: Vec3,
}

impl Default for PlayerSpec {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
        }
    }
}

/// One enemy's spawn data and tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemySpec {
    /// Display name
    pub name: String,
    /// World-space spawn position
    pub position: Vec3,
    /// Initial facing, as a yaw around Y in degrees
    pub yaw_degrees: f32,
    /// Seed for the agent's private RNG stream
    pub seed: u64,
    /// Maximum (and starting) health
    pub max_health: f32,
    /// Reach within which the agent strikes instead of closing in
    pub attack_range: f32,
    /// Vision tuning
    pub vision: VisionConfig,
    /// State tuning bundle
    pub behavior: BehaviorConfig,
    /// Starting state; `None` falls back to the first registered state
    pub initial_state: Option<StateKind>,
    /// Patrol route
    pub waypoints: Vec<Vec3>,
}

impl Default for EnemySpec {
    fn default() -> Self {
        Self {
            name: "enemy".to_string(),
            position: Vec3::ZERO,
            yaw_degrees: 0.0,
            seed: 0,
            max_health: 100.0,
            attack_range: 2.0,
            vision: VisionConfig::default(),
            behavior: BehaviorConfig::default(),
            initial_state: None,
            waypoints: Vec::new(),
        }
    }
}

/// A complete, serializable simulation setup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Scenario {
    /// Scenario name
    pub name: String,
    /// Scenario version for compatibility
    pub version: u32,
    /// Navigation grid description
    pub grid: GridSpec,
    /// Static box obstacles
    pub obstacles: Vec<Obstacle>,
    /// The player, if the scenario has one
    pub player: Option<PlayerSpec>,
    /// The enemy roster
    pub enemies: Vec<EnemySpec>,
}

impl Scenario {
    /// Create a new empty scenario
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: 1,
            grid: GridSpec::default(),
            obstacles: Vec::new(),
            player: None,
            enemies: Vec::new(),
        }
    }

    /// The built-in test arena: one guard on a square route, a wall and a
    /// pillar for cover, and a player spawn across the yard.
    #[must_use]
    pub fn sandbox() -> Self {
        Self {
            name: "sandbox".to_string(),
            version: 1,
            grid: GridSpec::default(),
            obstacles: vec![
                // Long wall through the middle
                Obstacle {
                    center: Vec3::new(0.0, 1.0, 0.0),
                    half_extents: Vec3::new(4.0, 1.0, 0.5),
                },
                // Free-standing pillar
                Obstacle {
                    center: Vec3::new(6.0, 1.0, 4.0),
                    half_extents: Vec3::new(0.75, 1.0, 0.75),
                },
            ],
            player: Some(PlayerSpec {
                position: Vec3::new(0.0, 0.0, 8.0),
            }),
            enemies: vec![EnemySpec {
                name: "guard-01".to_string(),
                position: Vec3::new(-6.0, 0.0, -6.0),
                seed: 7,
                waypoints: vec![
                    Vec3::new(-8.0, 0.0, -8.0),
                    Vec3::new(8.0, 0.0, -8.0),
                    Vec3::new(8.0, 0.0, 8.0),
                    Vec3::new(-8.0, 0.0, 8.0),
                ],
                ..Default::default()
            }],
        }
    }

    /// Save the scenario to a RON file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or serialization fails
    pub fn save_ron(&self, path: impl AsRef<Path>) -> Result<(), ScenarioError> {
        let ron_string = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| ScenarioError::SerializeError(e.to_string()))?;
        fs::write(path, ron_string).map_err(|e| ScenarioError::IoError(e.to_string()))?;
        Ok(())
    }

    /// Load a scenario from a RON file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or deserialization fails
    pub fn load_ron(path: impl AsRef<Path>) -> Result<Self, ScenarioError> {
        let content =
            fs::read_to_string(path).map_err(|e| ScenarioError::IoError(e.to_string()))?;
        let scenario: Scenario =
            ron::from_str(&content).map_err(|e| ScenarioError::DeserializeError(e.to_string()))?;
        Ok(scenario)
    }

    /// Save the scenario to a JSON file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or serialization fails
    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<(), ScenarioError> {
        let json_string = serde_json::to_string_pretty(self)
            .map_err(|e| ScenarioError::SerializeError(e.to_string()))?;
        fs::write(path, json_string).map_err(|e| ScenarioError::IoError(e.to_string()))?;
        Ok(())
    }

    /// Load a scenario from a JSON file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or deserialization fails
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, ScenarioError> {
        let content =
            fs::read_to_string(path).map_err(|e| ScenarioError::IoError(e.to_string()))?;
        let scenario: Scenario = serde_json::from_str(&content)
            .map_err(|e| ScenarioError::DeserializeError(e.to_string()))?;
        Ok(scenario)
    }

    /// Number of enemies in the roster
    #[must_use]
    pub fn enemy_count(&self) -> usize {
        self.enemies.len()
    }
}

impl Default for Scenario {
    fn default() -> Self {
        Self::new("untitled")
    }
}

/// Errors that can occur during scenario load and save
#[derive(Debug, Clone)]
pub enum ScenarioError {
    /// IO error
    IoError(String),
    /// Serialization error
    SerializeError(String),
    /// Deserialization error
    DeserializeError(String),
}

impl std::fmt::Display for ScenarioError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::IoError(e) => write!(f, "IO error: {e}"),
            Self::SerializeError(e) => write!(f, "Serialization error: {e}"),
            Self::DeserializeError(e) => write!(f, "Deserialization error: {e}"),
        }
    }
}

impl std::error::Error for ScenarioError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scenario_serialization_ron() {
        let scenario = Scenario::sandbox();

        let ron_str =
            ron::ser::to_string_pretty(&scenario, ron::ser::PrettyConfig::default()).unwrap();
        assert!(ron_str.contains("guard-01"));

        let loaded: Scenario = ron::from_str(&ron_str).unwrap();
        assert_eq!(loaded, scenario);
    }

    #[test]
    fn test_scenario_serialization_json() {
        let scenario = Scenario::sandbox();

        let json_str = serde_json::to_string(&scenario).unwrap();
        let loaded: Scenario = serde_json::from_str(&json_str).unwrap();

        assert_eq!(loaded.name, "sandbox");
        assert_eq!(loaded.enemy_count(), 1);
        assert_eq!(loaded.enemies[0].waypoints.len(), 4);
        assert!(loaded.player.is_some());
    }

    #[test]
    fn test_sparse_ron_fills_defaults() {
        // A scenario that only names what it changes
        let loaded: Scenario = ron::from_str(
            r#"(
                name: "minimal",
                enemies: [(name: "lone", position: (1.0, 0.0, 2.0))],
            )"#,
        )
        .unwrap();

        assert_eq!(loaded.name, "minimal");
        assert_eq!(loaded.grid.width, 24);

        let enemy = &loaded.enemies[0];
        assert_eq!(enemy.max_health, 100.0);
        assert_eq!(enemy.attack_range, 2.0);
        assert_eq!(enemy.vision.range, 10.0);
        assert_eq!(enemy.behavior.attack.damage, 10.0);
        assert!(enemy.initial_state.is_none());
        assert!(enemy.waypoints.is_empty());
    }

    #[test]
    fn test_grid_spec_builds_offset_grid() {
        let spec = GridSpec {
            width: 10,
            height: 8,
            cell_size: 2.0,
            origin: Vec2::new(-10.0, -8.0),
            surface_height: 0.5,
        };
        let grid = spec.build();

        assert_eq!(grid.width, 10);
        assert_eq!(grid.height, 8);
        // Corner cell center lands inside the offset grid
        assert_eq!(grid.cell_to_world(0, 0), Vec3::new(-9.0, 0.5, -7.0));
        assert!(grid.is_on_navigable(Vec3::new(0.0, 0.0, 0.0)));
    }

    #[test]
    fn test_sandbox_is_well_formed() {
        let scenario = Scenario::sandbox();

        assert_eq!(scenario.enemy_count(), 1);
        let grid = scenario.grid.build();

        // Waypoints and spawns all sit on the grid
        for point in &scenario.enemies[0].waypoints {
            assert!(grid.is_on_navigable(*point));
        }
        assert!(grid.is_on_navigable(scenario.enemies[0].position));
        assert!(grid.is_on_navigable(scenario.player.unwrap().position));
    }
}
