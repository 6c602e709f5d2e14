//! Harness configuration.
//!
//! Loaded from a TOML file. Every field has a default, so a partial file
//! (or none at all) is valid.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use orb_combat::EngineConfig;
use orb_common::{OrbError, OrbResult};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Default configuration file name.
pub const CONFIG_FILE: &str = "orb-sim.toml";

/// Harness configuration parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Log directive used when `RUST_LOG` is unset.
    pub log_filter: String,
    /// Emit logs as JSON lines.
    pub json_logs: bool,
    /// Simulated frames per second.
    pub frame_rate: u32,
    /// Simulated seconds before the skirmish is called a draw.
    pub duration_seconds: f32,
    /// RON catalog to load instead of the built-in content.
    pub catalog_path: Option<PathBuf>,
    /// Combat engine tunables.
    pub engine: EngineConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            log_filter: "orb_combat=info,orb_sim=info".to_string(),
            json_logs: false,
            frame_rate: 30,
            duration_seconds: 120.0,
            catalog_path: None,
            engine: EngineConfig {
                max_frame_delta: Some(0.25),
                ..EngineConfig::default()
            },
        }
    }
}

impl SimConfig {
    /// Read a config file. `Ok(None)` when the file does not exist.
    pub fn read<P: AsRef<Path>>(path: P) -> OrbResult<Option<Self>> {
        let path = path.as_ref();
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let mut config: Self =
            toml::from_str(&contents).map_err(|e| OrbError::Config(e.to_string()))?;
        config.validate();
        Ok(Some(config))
    }

    /// Save configuration to a specific path.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> OrbResult<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents =
            toml::to_string_pretty(self).map_err(|e| OrbError::Serialization(e.to_string()))?;
        let mut file = fs::File::create(path)?;
        file.write_all(contents.as_bytes())?;

        info!("Saved config to {}", path.display());
        Ok(())
    }

    /// Validate and clamp configuration values to sensible ranges.
    pub fn validate(&mut self) {
        self.frame_rate = self.frame_rate.clamp(1, 240);
        if !self.duration_seconds.is_finite() {
            self.duration_seconds = 120.0;
        }
        self.duration_seconds = self.duration_seconds.clamp(1.0, 3600.0);
        self.engine.validate();
    }

    /// Seconds per simulated frame.
    #[must_use]
    pub fn frame_delta(&self) -> f32 {
        1.0 / self.frame_rate as f32
    }

    /// Number of frames in the configured duration.
    #[must_use]
    pub fn frame_budget(&self) -> u32 {
        (self.duration_seconds * self.frame_rate as f32).ceil() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_defaults() {
        let config = SimConfig::default();
        assert_eq!(config.frame_rate, 30);
        assert_eq!(config.engine.max_frame_delta, Some(0.25));
        assert!(config.catalog_path.is_none());
        assert_eq!(config.frame_budget(), 3600);
    }

    #[test]
    fn test_config_save_load() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config_path = temp_dir.path().join("sim.toml");

        let mut config = SimConfig::default();
        config.frame_rate = 60;
        config.catalog_path = Some(PathBuf::from("content/catalog.ron"));
        config.engine.shield_cap = 500.0;
        config.save_to(&config_path).expect("Failed to save config");

        let loaded = SimConfig::read(&config_path)
            .expect("Failed to read config")
            .expect("Config file should exist");
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_config_missing_file() {
        let loaded =
            SimConfig::read("/nonexistent/path/orb-sim.toml").expect("Missing is not an error");
        assert!(loaded.is_none());
    }

    #[test]
    fn test_config_partial_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config_path = temp_dir.path().join("sim.toml");
        fs::write(&config_path, "frame_rate = 10\n\n[engine]\nregen_enabled = false\n")
            .expect("Failed to write config");

        let loaded = SimConfig::read(&config_path)
            .expect("Failed to read config")
            .expect("Config file should exist");
        assert_eq!(loaded.frame_rate, 10);
        assert!(!loaded.engine.regen_enabled);
        assert_eq!(loaded.duration_seconds, 120.0);
        assert_eq!(loaded.engine.shield_cap, 420.0);
    }

    #[test]
    fn test_config_invalid_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config_path = temp_dir.path().join("sim.toml");
        fs::write(&config_path, "frame_rate = \"fast\"").expect("Failed to write config");

        let result = SimConfig::read(&config_path);
        assert!(matches!(result, Err(OrbError::Config(_))));
    }

    #[test]
    fn test_config_validation() {
        let mut config = SimConfig::default();
        config.frame_rate = 0;
        config.duration_seconds = f32::NAN;
        config.engine.resistance_cap = 3.0;

        config.validate();

        assert_eq!(config.frame_rate, 1);
        assert_eq!(config.duration_seconds, 120.0);
        assert_eq!(config.engine.resistance_cap, 1.0);
    }
}
