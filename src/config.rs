//! Tunable engine parameters.

use std::f32::consts::{FRAC_PI_4, FRAC_PI_6};
use std::fs;
use std::path::Path;

use log::info;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::integrator::Gains;
use crate::orientation::Orientation;

/// Orientation the cube starts in and returns to on reset.
pub const INITIAL_ORIENTATION: Orientation = Orientation::new(FRAC_PI_6, FRAC_PI_4);

/// Radians of whole-cube rotation per pixel of drag.
pub const DRAG_SENSITIVITY: f32 = 0.01;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub whole_cube: Gains,
    pub layer: Gains,
    pub drag_sensitivity: f32,
    pub initial_orientation: Orientation,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            whole_cube: Gains::WHOLE_CUBE,
            layer: Gains::LAYER,
            drag_sensitivity: DRAG_SENSITIVITY,
            initial_orientation: INITIAL_ORIENTATION,
        }
    }
}

impl EngineConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads a config file. Missing fields keep their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json(&json)?;
        info!("loaded engine config from {}", path.display());
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_gives_defaults() {
        let config = EngineConfig::from_json("{}").unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn partial_override() {
        let config = EngineConfig::from_json(
            r#"{ "drag_sensitivity": 0.02, "initial_orientation": { "x": 0.0, "y": 1.0 } }"#,
        )
        .unwrap();
        assert_eq!(config.drag_sensitivity, 0.02);
        assert_eq!(config.initial_orientation, Orientation::new(0.0, 1.0));
        assert_eq!(config.layer, Gains::LAYER);
    }

    #[test]
    fn missing_file_reports_path() {
        let err = EngineConfig::load(Path::new("/nonexistent/cubetutor.json")).unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
        assert!(err.to_string().contains("cubetutor.json"));
    }
}
