//! # Runtime Configuration
//!
//! Settings that used to be reached through process-wide globals (such as
//! pixels per unit) live here and are handed to a [`Scene`](crate::scene::Scene)
//! at construction. Components read them through their frame contexts.

use serde::{Deserialize, Serialize};

use crate::config::{Config, ConfigError};
use crate::spatial::QuadTreeConfig;

/// # Scene Settings
///
/// Per-scene configuration passed explicitly down to components.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneSettings {
    /// How many pixels make up one world unit
    pub pixels_per_unit: u16,
    /// Spatial index used for camera culling
    pub spatial: QuadTreeConfig,
}

impl Default for SceneSettings {
    fn default() -> Self {
        Self {
            pixels_per_unit: 32,
            spatial: QuadTreeConfig::default(),
        }
    }
}

impl SceneSettings {
    /// Size of one pixel in world units
    pub fn units_per_pixel(&self) -> f32 {
        1.0 / f32::from(self.pixels_per_unit.max(1))
    }

    /// Builder pattern: set pixels per unit
    #[must_use]
    pub fn with_pixels_per_unit(mut self, pixels_per_unit: u16) -> Self {
        self.pixels_per_unit = pixels_per_unit;
        self
    }

    /// Builder pattern: set the spatial index configuration
    #[must_use]
    pub fn with_spatial(mut self, spatial: QuadTreeConfig) -> Self {
        self.spatial = spatial;
        self
    }

    /// Validate the settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pixels_per_unit == 0 {
            return Err(ConfigError::Invalid("pixels_per_unit must be at least 1".to_string()));
        }

        self.spatial.validate()
    }
}

/// # Runtime Configuration
///
/// Top-level configuration file for a host running a scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Log filter passed to the logger (e.g. `"info"`, `"scene_runtime=trace"`)
    pub log_level: String,
    /// Scene settings
    pub scene: SceneSettings,
    /// Number of frames a headless host runs before exiting
    pub frames: u32,
    /// Fixed timestep in seconds used by headless hosts
    pub fixed_timestep: f32,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            scene: SceneSettings::default(),
            frames: 120,
            fixed_timestep: 1.0 / 60.0,
        }
    }
}

impl Config for RuntimeConfig {}

impl RuntimeConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.fixed_timestep.is_finite() && self.fixed_timestep > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "fixed_timestep must be positive, got {}",
                self.fixed_timestep
            )));
        }

        self.scene.validate()
    }
}
