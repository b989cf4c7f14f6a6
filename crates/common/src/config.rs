//! Viewer configuration loaded from YAML.
//!
//! Every field has a default, so a partial file (or none at all) is valid.

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::types::DEFAULT_PREGEN_SIZE;

/// Errors from loading or validating a configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub width: u32,
    pub height: u32,
    pub title: String,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            title: "voxelview".into(),
        }
    }
}

/// Camera parameters. Angles are in degrees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub position: [f32; 3],
    pub speed: f32,
    pub sensitivity: f32,
    pub fov: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            position: [0.0, 0.0, 0.0],
            speed: 1.5,
            sensitivity: 0.1,
            fov: 45.0,
            near: 0.01,
            far: 100.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Chunks pregenerated along each axis; every component must be odd.
    pub pregen_size: [i32; 3],
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            pregen_size: DEFAULT_PREGEN_SIZE.to_array(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub window: WindowConfig,
    pub camera: CameraConfig,
    pub world: WorldConfig,
}

impl ViewerConfig {
    /// Read and validate a YAML configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let file = File::open(path)?;
        let config: ViewerConfig = serde_yaml::from_reader(BufReader::new(file))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        let config: ViewerConfig = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window.width == 0 || self.window.height == 0 {
            return Err(ConfigError::Invalid(format!(
                "window size must be non-zero, got {}x{}",
                self.window.width, self.window.height
            )));
        }
        if self
            .world
            .pregen_size
            .iter()
            .any(|&s| s <= 0 || s % 2 == 0)
        {
            return Err(ConfigError::Invalid(format!(
                "pregen_size components must be positive and odd, got {:?}",
                self.world.pregen_size
            )));
        }
        let volume = self
            .world
            .pregen_size
            .iter()
            .try_fold(1usize, |acc, &s| acc.checked_mul(s as usize));
        if volume.is_none() {
            return Err(ConfigError::Invalid(format!(
                "pregen_size {:?} has more chunks than can be addressed",
                self.world.pregen_size
            )));
        }
        let cam = &self.camera;
        if cam.near <= 0.0 || cam.far <= cam.near {
            return Err(ConfigError::Invalid(format!(
                "camera clip planes must satisfy 0 < near < far, got near={} far={}",
                cam.near, cam.far
            )));
        }
        if !(cam.fov > 0.0 && cam.fov < 180.0) {
            return Err(ConfigError::Invalid(format!(
                "camera fov must lie in (0, 180) degrees, got {}",
                cam.fov
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_valid() {
        let config = ViewerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.world.pregen_size, [3, 3, 3]);
        assert_eq!(config.camera.fov, 45.0);
    }

    #[test]
    fn empty_document_uses_defaults() {
        let config = ViewerConfig::from_yaml("{}").unwrap();
        assert_eq!(config, ViewerConfig::default());
    }

    #[test]
    fn partial_section_keeps_other_defaults() {
        let config = ViewerConfig::from_yaml("camera:\n  speed: 4.0\n").unwrap();
        assert_eq!(config.camera.speed, 4.0);
        assert_eq!(config.camera.sensitivity, 0.1);
        assert_eq!(config.window.width, 1280);
    }

    #[test]
    fn even_pregen_size_rejected() {
        let err = ViewerConfig::from_yaml("world:\n  pregen_size: [3, 4, 3]\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn bad_clip_planes_rejected() {
        let err =
            ViewerConfig::from_yaml("camera:\n  near: 10.0\n  far: 1.0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn zero_window_rejected() {
        for yaml in ["window:\n  width: 0\n", "window:\n  height: 0\n"] {
            let err = ViewerConfig::from_yaml(yaml).unwrap_err();
            assert!(matches!(err, ConfigError::Invalid(msg) if msg.contains("window size")));
        }
    }

    #[test]
    fn fov_out_of_range_rejected() {
        for fov in [0.0, 180.0, -10.0, f32::NAN] {
            let mut config = ViewerConfig::default();
            config.camera.fov = fov;
            let err = config.validate().unwrap_err();
            assert!(
                matches!(&err, ConfigError::Invalid(msg) if msg.contains("fov")),
                "fov {fov} accepted: {err:?}"
            );
        }
        let mut config = ViewerConfig::default();
        config.camera.fov = 179.0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn overflowing_pregen_volume_rejected() {
        let err =
            ViewerConfig::from_yaml("world:\n  pregen_size: [3000001, 3000001, 3000001]\n")
                .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn malformed_yaml_is_a_yaml_error() {
        let err = ViewerConfig::from_yaml("window: [1, 2").unwrap_err();
        assert!(matches!(err, ConfigError::Yaml(_)));
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "window:\n  title: test\nworld:\n  pregen_size: [5, 1, 5]").unwrap();
        let config = ViewerConfig::load(file.path()).unwrap();
        assert_eq!(config.window.title, "test");
        assert_eq!(config.world.pregen_size, [5, 1, 5]);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = ViewerConfig::load("/nonexistent/voxelview.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
