//! # Engine Configuration
//!
//! Settings for the collision engine and the level loader. Every section has
//! sensible defaults, so a config file only needs the values it changes.
//!
//! ```toml
//! log_level = "debug"
//!
//! [physics]
//! climb_speed = 2.5
//!
//! [levels]
//! levels_dir = "assets/levels"
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

pub use crate::config::{Config, ConfigError};

/// # Physics Configuration
///
/// Tunables for the motion integrator and the locomotion responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Downward acceleration in units per second squared
    pub gravity: f32,
    /// Decimal places velocity is rounded to after each integration step
    pub speed_decimals: u32,
    /// Vertical speed while climbing a ladder
    pub climb_speed: f32,
    /// Height of a body's center above the surface it stands on
    pub ground_clearance: f32,
}

impl PhysicsConfig {
    /// Set gravity
    pub fn with_gravity(mut self, gravity: f32) -> Self {
        self.gravity = gravity;
        self
    }

    /// Set ladder climb speed
    pub fn with_climb_speed(mut self, climb_speed: f32) -> Self {
        self.climb_speed = climb_speed;
        self
    }

    /// Set ground clearance
    pub fn with_ground_clearance(mut self, ground_clearance: f32) -> Self {
        self.ground_clearance = ground_clearance;
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if !self.gravity.is_finite() || self.gravity < 0.0 {
            return Err(format!("Gravity must be a non-negative number, got {}", self.gravity));
        }
        if self.speed_decimals > 6 {
            return Err("Speed rounding beyond 6 decimals exceeds f32 precision".to_string());
        }
        if self.climb_speed <= 0.0 {
            return Err("Climb speed must be positive".to_string());
        }
        if !(0.0..=1.0).contains(&self.ground_clearance) {
            return Err("Ground clearance must lie within one probe radius".to_string());
        }
        Ok(())
    }
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: 9.81,
            speed_decimals: 3,
            climb_speed: 3.0,
            ground_clearance: 0.5,
        }
    }
}

/// # Level Configuration
///
/// Where [`LevelRegistry`](crate::level::LevelRegistry) looks for level files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelConfig {
    /// Directory holding level files
    pub levels_dir: PathBuf,
    /// File extension of level files, without the dot
    pub extension: String,
}

impl LevelConfig {
    /// Set the levels directory
    pub fn with_levels_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.levels_dir = dir.into();
        self
    }

    /// Set the level file extension
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.extension.is_empty() || self.extension.starts_with('.') {
            return Err(format!("Level extension must be non-empty and dotless, got '{}'", self.extension));
        }
        Ok(())
    }
}

impl Default for LevelConfig {
    fn default() -> Self {
        Self {
            levels_dir: PathBuf::from("resources/levels"),
            extension: "lvl".to_string(),
        }
    }
}

/// # Engine Configuration
///
/// Top-level configuration, loadable from TOML or RON through [`Config`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Default log filter when `RUST_LOG` is unset
    pub log_level: String,
    /// Physics tunables
    pub physics: PhysicsConfig,
    /// Level loading
    pub levels: LevelConfig,
}

impl EngineConfig {
    /// Set the default log filter
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Replace the physics section
    pub fn with_physics(mut self, physics: PhysicsConfig) -> Self {
        self.physics = physics;
        self
    }

    /// Replace the level section
    pub fn with_levels(mut self, levels: LevelConfig) -> Self {
        self.levels = levels;
        self
    }

    /// Validate every section
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.log_level.trim().is_empty() {
            return Err(ConfigError::Invalid("Log level cannot be empty".to_string()));
        }
        self.physics.validate().map_err(ConfigError::Invalid)?;
        self.levels.validate().map_err(ConfigError::Invalid)?;
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            physics: PhysicsConfig::default(),
            levels: LevelConfig::default(),
        }
    }
}

impl Config for EngineConfig {}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_are_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.physics.speed_decimals, 3);
        assert_eq!(config.levels.extension, "lvl");
    }

    #[test]
    fn test_invalid_values_are_reported() {
        let config = EngineConfig::default().with_physics(PhysicsConfig::default().with_climb_speed(0.0));
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(msg)) if msg.contains("Climb speed")));

        let config = EngineConfig::default().with_levels(LevelConfig::default().with_extension(".lvl"));
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let config = EngineConfig::default().with_log_level("  ");
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_toml_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("engine.toml");
        let config = EngineConfig::default()
            .with_log_level("debug")
            .with_physics(PhysicsConfig::default().with_gravity(4.0));

        config.save_to_file(&path).unwrap();
        let loaded = EngineConfig::load_from_file(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_ron_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("engine.ron");
        std::fs::write(&path, "(physics: (climb_speed: 2.5))").unwrap();

        let loaded = EngineConfig::load_from_file(&path).unwrap();
        assert_eq!(loaded.physics.climb_speed, 2.5);
        assert_eq!(loaded.physics.gravity, 9.81);
        assert_eq!(loaded.log_level, "info");
    }

    #[test]
    fn test_unknown_extension_is_rejected() {
        let result = EngineConfig::load_from_file("engine.yaml");
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat(_))));
    }
}
