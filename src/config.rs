//! Configuration for vectorlab
//!
//! Sources, lowest precedence first:
//! 1. Built-in defaults
//! 2. A TOML file (`--config`, `VECTORLAB_CONFIG`, or `./vectorlab.toml`)
//! 3. Environment variables
//! 4. Command-line flags (applied by `main`)

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::camera::CameraLimits;
use crate::error::{ConfigError, Result};
use crate::interaction::InteractionSettings;

const DEFAULT_CONFIG_FILE: &str = "vectorlab.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct LabConfig {
    pub camera: CameraConfig,
    pub interaction: InteractionConfig,
    pub simulation: SimulationConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Pixels per world unit when a lesson opens.
    pub initial_scale: f32,
    pub min_scale: f32,
    pub max_scale: f32,
    pub initial_yaw: f32,
    pub initial_pitch: f32,
    pub pitch_limit: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            initial_scale: 60.0,
            min_scale: 8.0,
            max_scale: 400.0,
            initial_yaw: 0.5,
            initial_pitch: 0.3,
            pitch_limit: std::f32::consts::FRAC_PI_2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractionConfig {
    /// Hit-test radius around a projected handle, in pixels.
    pub handle_radius: f32,
    /// Radians of orbit per pixel of drag.
    pub orbit_sensitivity: f32,
    /// Fractional zoom change per wheel notch.
    pub zoom_step: f32,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            handle_radius: 20.0,
            orbit_sensitivity: 0.01,
            zoom_step: 0.1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub gradient_interval_ms: u64,
    pub learning_rate: f32,
    pub composition_ticks: u32,
    pub eigen_epsilon: f32,
    pub riemann_resolution: usize,
    pub riemann_range: f32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            gradient_interval_ms: 100,
            learning_rate: 0.1,
            composition_ticks: 45,
            eigen_epsilon: 0.1,
            riemann_resolution: 12,
            riemann_range: 3.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `env_logger` filter, e.g. `info` or `vectorlab=debug`.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
        }
    }
}

impl LabConfig {
    pub fn camera_limits(&self) -> CameraLimits {
        CameraLimits {
            min_scale: self.camera.min_scale,
            max_scale: self.camera.max_scale,
            pitch_limit: self.camera.pitch_limit,
        }
    }

    pub fn interaction_settings(&self) -> InteractionSettings {
        InteractionSettings {
            handle_radius: self.interaction.handle_radius,
            orbit_sensitivity: self.interaction.orbit_sensitivity,
            zoom_step: self.interaction.zoom_step,
            limits: self.camera_limits(),
        }
    }

    pub fn gradient_interval(&self) -> Duration {
        Duration::from_millis(self.simulation.gradient_interval_ms)
    }

    pub fn validate(&self) -> Result<()> {
        let c = &self.camera;
        if !(c.min_scale > 0.0 && c.min_scale <= c.max_scale) {
            return Err(ConfigError::Invalid(format!(
                "camera scale range [{}, {}] must be positive and ordered",
                c.min_scale, c.max_scale
            )));
        }
        if !(c.pitch_limit > 0.0 && c.pitch_limit <= std::f32::consts::FRAC_PI_2) {
            return Err(ConfigError::Invalid(format!(
                "camera.pitch_limit {} must be in (0, pi/2]",
                c.pitch_limit
            )));
        }
        if !(self.interaction.handle_radius > 0.0) {
            return Err(ConfigError::Invalid("interaction.handle_radius must be positive".into()));
        }
        if !(self.interaction.zoom_step > 0.0) {
            return Err(ConfigError::Invalid("interaction.zoom_step must be positive".into()));
        }
        let s = &self.simulation;
        if s.gradient_interval_ms == 0 {
            return Err(ConfigError::Invalid("simulation.gradient_interval_ms must be non-zero".into()));
        }
        if s.composition_ticks == 0 {
            return Err(ConfigError::Invalid("simulation.composition_ticks must be non-zero".into()));
        }
        if !(s.eigen_epsilon > 0.0) || !(s.riemann_range > 0.0) {
            return Err(ConfigError::Invalid(
                "simulation.eigen_epsilon and simulation.riemann_range must be positive".into(),
            ));
        }
        Ok(())
    }
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads from the first config file found, then applies environment
    /// overrides and validates the result.
    pub fn load(explicit: Option<&Path>) -> Result<LabConfig> {
        let mut config = match Self::locate(explicit) {
            Some(path) => Self::load_from_file(&path)?,
            None => {
                debug!(target: "vectorlab", "no config file found, using defaults");
                LabConfig::default()
            }
        };
        Self::apply_overrides(&mut config, |key| env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// The config file that [`ConfigLoader::load`] would read, if any.
    pub fn locate(explicit: Option<&Path>) -> Option<PathBuf> {
        if let Some(path) = explicit {
            return Some(path.to_path_buf());
        }
        if let Ok(path) = env::var("VECTORLAB_CONFIG") {
            return Some(PathBuf::from(path));
        }
        let local = PathBuf::from(DEFAULT_CONFIG_FILE);
        local.is_file().then_some(local)
    }

    pub fn load_from_file(path: &Path) -> Result<LabConfig> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::parse(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(target: "vectorlab", "parsed config from {}", path.display());
        Ok(config)
    }

    pub fn parse(content: &str) -> std::result::Result<LabConfig, toml::de::Error> {
        toml::from_str(content)
    }

    /// Environment overrides. Unparseable values are ignored.
    pub fn apply_overrides(config: &mut LabConfig, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(level) = lookup("VECTORLAB_LOG") {
            let level = level.trim();
            if !level.is_empty() {
                config.logging.level = level.to_owned();
            }
        }
        if let Some(radius) = lookup("VECTORLAB_HANDLE_RADIUS").and_then(|v| v.trim().parse::<f32>().ok()) {
            config.interaction.handle_radius = radius;
        }
        if let Some(ms) = lookup("VECTORLAB_GRADIENT_INTERVAL_MS").and_then(|v| v.trim().parse::<u64>().ok()) {
            config.simulation.gradient_interval_ms = ms;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_are_valid() {
        assert!(LabConfig::default().validate().is_ok());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let config = ConfigLoader::parse(
            r#"
            [camera]
            initial_scale = 80.0

            [simulation]
            riemann_resolution = 20
            "#,
        )
        .expect("valid toml");
        assert_eq!(config.camera.initial_scale, 80.0);
        assert_eq!(config.camera.max_scale, CameraConfig::default().max_scale);
        assert_eq!(config.simulation.riemann_resolution, 20);
        assert_eq!(config.interaction, InteractionConfig::default());
    }

    #[test]
    fn environment_overrides_win() {
        let vars: HashMap<&str, &str> = [
            ("VECTORLAB_LOG", "debug"),
            ("VECTORLAB_HANDLE_RADIUS", " 25 "),
            ("VECTORLAB_GRADIENT_INTERVAL_MS", "not a number"),
        ]
        .into_iter()
        .collect();
        let mut config = LabConfig::default();
        ConfigLoader::apply_overrides(&mut config, |k| vars.get(k).map(|v| v.to_string()));
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.interaction.handle_radius, 25.0);
        assert_eq!(config.simulation.gradient_interval_ms, 100);
    }

    #[test]
    fn inverted_scale_range_is_rejected() {
        let mut config = LabConfig::default();
        config.camera.min_scale = 500.0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = ConfigLoader::load_from_file(Path::new("/nonexistent/vectorlab.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
        assert!(err.to_string().contains("/nonexistent/vectorlab.toml"));
    }
}
