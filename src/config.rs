//! Optional TOML configuration.
//!
//! Every section uses `#[serde(default)]`, so a file that only overrides
//! `[camera]` (or a single field of it) is valid. Without a config file the
//! built-in defaults give the desk scene's starting view.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Environment variable naming the config file to load.
pub const CONFIG_ENV_VAR: &str = "DESKSCENE_CONFIG";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub window: WindowConfig,
    pub camera: CameraConfig,
    pub assets: AssetConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Desk Scene".to_string(),
            width: 1000,
            height: 800,
        }
    }
}

impl WindowConfig {
    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }
}

/// Initial camera pose and projection parameters. Angles are in degrees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub position: [f32; 3],
    pub front: [f32; 3],
    pub up: [f32; 3],
    pub yaw: f32,
    pub pitch: f32,
    /// Vertical field of view of the perspective projection.
    pub zoom: f32,
    pub movement_speed: f32,
    pub mouse_sensitivity: f32,
    pub z_near: f32,
    pub z_far: f32,
    /// Half of the visible height in world units while in orthographic mode.
    pub orthographic_half_height: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            position: [0.0, 3.3, 12.0],
            front: [0.0, -0.5, -2.0],
            up: [0.0, 1.0, 0.0],
            yaw: -90.0,
            pitch: 0.0,
            zoom: 80.0,
            movement_speed: 2.5,
            mouse_sensitivity: 0.1,
            z_near: 0.1,
            z_far: 100.0,
            orthographic_half_height: 6.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetConfig {
    /// Directory the scene textures are loaded from.
    pub texture_dir: PathBuf,
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            texture_dir: PathBuf::from("assets/textures"),
        }
    }
}

impl AppConfig {
    /// Load a config file. Missing fields use defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Load the file named by `DESKSCENE_CONFIG`, or the defaults when unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        match std::env::var_os(CONFIG_ENV_VAR) {
            Some(path) => {
                let path = PathBuf::from(path);
                tracing::info!(path = %path.display(), "loading config");
                Self::load(&path)
            }
            None => Ok(Self::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = AppConfig::parse("").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.window.width, 1000);
        assert_eq!(config.window.height, 800);
        assert_eq!(config.camera.zoom, 80.0);
    }

    #[test]
    fn test_partial_section_keeps_other_defaults() {
        let config = AppConfig::parse(
            r#"
            [camera]
            movement_speed = 5.0

            [assets]
            texture_dir = "textures"
            "#,
        )
        .unwrap();
        assert_eq!(config.camera.movement_speed, 5.0);
        assert_eq!(config.camera.yaw, -90.0);
        assert_eq!(config.assets.texture_dir, PathBuf::from("textures"));
        assert_eq!(config.window, WindowConfig::default());
    }

    #[test]
    fn test_invalid_toml_is_rejected() {
        assert!(AppConfig::parse("[camera\nzoom = ").is_err());
    }

    #[test]
    fn test_missing_file_reports_path() {
        let path = Path::new("definitely/not/here.toml");
        match AppConfig::load(path) {
            Err(ConfigError::Io { path: p, .. }) => assert_eq!(p, path),
            other => panic!("expected io error, got {:?}", other),
        }
    }

    #[test]
    fn test_aspect_ratio() {
        let window = WindowConfig::default();
        assert!((window.aspect() - 1.25).abs() < f32::EPSILON);
    }
}
