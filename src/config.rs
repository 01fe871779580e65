//! TOML configuration for the probe.
//!
//! Loaded from `<config dir>/padprobe/config.toml`; a default file is written
//! on first run so the knobs are discoverable without documentation.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use tracing::{debug, info, warn};

use crate::probe::ProbeSettings;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

#[derive(Deserialize, Serialize, Clone, Debug)]
#[serde(default)]
pub struct ProbeConfig {
    /// Poll tick interval in milliseconds.
    pub poll_interval_ms: u64,

    /// Axis noise threshold in normalized units.
    pub axis_threshold: f32,

    /// Gamepads are tracked only if their name contains one of these
    /// phrases, case-insensitively.
    pub name_filters: Vec<String>,

    /// Enable the running mean/stddev statistics hook on the report sink.
    pub stats: bool,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        let settings = ProbeSettings::default();
        Self {
            poll_interval_ms: settings.poll_interval_ms,
            axis_threshold: settings.axis_threshold,
            name_filters: settings.name_filters,
            stats: false,
        }
    }
}

impl ProbeConfig {
    /// Loads the config file, writing defaults on first run. Any failure
    /// falls back to defaults with a warning; configuration is never fatal.
    pub fn load_or_default() -> Self {
        let Some(path) = Self::config_path() else {
            warn!("No config directory available, using default configuration");
            return Self::default();
        };

        if !path.exists() {
            let config = Self::default();
            match config.write_to(&path) {
                Ok(()) => info!("Wrote default configuration to {}", path.display()),
                Err(e) => warn!("Could not write default config: {}", e),
            }
            return config;
        }

        match Self::read_from(&path) {
            Ok(config) => {
                debug!("Loaded configuration from {}", path.display());
                config
            }
            Err(e) => {
                warn!("Invalid config at {}: {}, using defaults", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn settings(&self) -> ProbeSettings {
        ProbeSettings {
            poll_interval_ms: self.poll_interval_ms,
            axis_threshold: self.axis_threshold,
            name_filters: self.name_filters.clone(),
        }
    }

    fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("padprobe").join("config.toml"))
    }

    fn read_from(path: &PathBuf) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    fn write_to(&self, path: &PathBuf) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_mirror_probe_settings() {
        let config = ProbeConfig::default();
        assert_eq!(config.poll_interval_ms, 16);
        assert!((config.axis_threshold - 0.05).abs() < f32::EPSILON);
        assert_eq!(config.name_filters, vec!["Xbox", "Wireless"]);
        assert!(!config.stats);
    }

    #[test]
    fn partial_toml_fills_in_defaults() {
        let config: ProbeConfig = toml::from_str("axis_threshold = 0.01").unwrap();
        assert!((config.axis_threshold - 0.01).abs() < f32::EPSILON);
        assert_eq!(config.poll_interval_ms, 16);
    }

    #[test]
    fn round_trips_through_toml() {
        let config = ProbeConfig {
            poll_interval_ms: 8,
            axis_threshold: 0.02,
            name_filters: vec!["DualSense".to_string()],
            stats: true,
        };
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: ProbeConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed.poll_interval_ms, 8);
        assert_eq!(parsed.name_filters, vec!["DualSense"]);
        assert!(parsed.stats);
    }
}
