// SPDX-License-Identifier: GPL-3.0-only

//! Persistent application settings

use crate::errors::{PipelineError, PipelineResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

fn default_true() -> bool {
    true
}

fn default_width() -> u32 {
    640
}

fn default_height() -> u32 {
    480
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Apply the edge-detection filter to the live feed
    #[serde(default = "default_true")]
    pub apply_filter: bool,
    /// Capture width in pixels
    #[serde(default = "default_width")]
    pub frame_width: u32,
    /// Capture height in pixels
    #[serde(default = "default_height")]
    pub frame_height: u32,
    /// Rotation hint in degrees attached to captured frames
    #[serde(default)]
    pub rotation_degrees: u32,
    /// Directory snapshots are written to; defaults to the pictures folder
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            apply_filter: true,
            frame_width: default_width(),
            frame_height: default_height(),
            rotation_degrees: 0,
            output_dir: None,
        }
    }
}

impl Config {
    /// Default config file location under the user config directory
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("edgeview").join("config.json"))
    }

    /// Load from the default location, falling back to defaults when the
    /// file does not exist or cannot be read
    pub fn load() -> Self {
        let Some(path) = Self::default_path() else {
            warn!("No config directory on this system; using defaults");
            return Self::default();
        };
        match Self::load_from(&path) {
            Ok(config) => config,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "Using default config");
                Self::default()
            }
        }
    }

    /// Load from an explicit path
    pub fn load_from(path: &Path) -> PipelineResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Write to an explicit path, creating parent directories as needed
    pub fn save_to(&self, path: &Path) -> PipelineResult<()> {
        self.validate()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        debug!(path = %path.display(), "Config saved");
        Ok(())
    }

    /// Check the settings are usable before the pipeline starts
    pub fn validate(&self) -> PipelineResult<()> {
        if self.frame_width == 0 || self.frame_height == 0 {
            return Err(PipelineError::Config(format!(
                "frame size {}x{} is empty",
                self.frame_width, self.frame_height
            )));
        }
        if self.frame_width % 2 != 0 || self.frame_height % 2 != 0 {
            return Err(PipelineError::Config(format!(
                "frame size {}x{} is not valid for 4:2:0 capture",
                self.frame_width, self.frame_height
            )));
        }
        if crate::capture::Rotation::from_degrees(self.rotation_degrees).is_none() {
            return Err(PipelineError::Config(format!(
                "rotation {} is not a quadrant angle",
                self.rotation_degrees
            )));
        }
        Ok(())
    }

    /// The configured rotation as a typed hint
    pub fn rotation(&self) -> crate::capture::Rotation {
        crate::capture::Rotation::from_degrees(self.rotation_degrees)
            .unwrap_or(crate::capture::Rotation::Deg0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert!(config.apply_filter);
        assert_eq!((config.frame_width, config.frame_height), (640, 480));
    }

    #[test]
    fn test_missing_fields_fall_back_to_defaults() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config, Config::default());

        let config: Config = serde_json::from_str(r#"{"apply_filter": false}"#).unwrap();
        assert!(!config.apply_filter);
        assert_eq!(config.frame_width, 640);
    }

    #[test]
    fn test_rejects_odd_frame_size() {
        let config = Config {
            frame_width: 641,
            ..Config::default()
        };
        assert!(matches!(
            config.validate(),
            Err(PipelineError::Config(_))
        ));
    }

    #[test]
    fn test_rejects_bad_rotation() {
        let config = Config {
            rotation_degrees: 45,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_save_and_reload_round_trip() {
        let path = std::env::temp_dir()
            .join(format!("edgeview-config-{}", std::process::id()))
            .join("config.json");

        let config = Config {
            apply_filter: false,
            frame_width: 1280,
            frame_height: 720,
            rotation_degrees: 90,
            output_dir: Some(PathBuf::from("/tmp/shots")),
        };
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded, config);

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }
}
