use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::estimate::Calibration;
use crate::tree::DEFAULT_HISTORY_CAPACITY;

const APP_NAME: &str = "featurecost";
const CONFIG_FILE: &str = "config.json";
const PORT_ENV: &str = "FEATURECOST_PORT";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimatorConfig {
    /// Pipeline constants (parallelism factor, working days, escalation thresholds).
    pub calibration: Calibration,
    /// Tree versions kept per open project for undo/redo.
    pub history_capacity: usize,
    pub server: ServerConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: 3000 }
    }
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            calibration: Calibration::default(),
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            server: ServerConfig::default(),
        }
    }
}

impl EstimatorConfig {
    /// Load configuration from the user's config directory, then apply
    /// environment overrides. Returns defaults if the file doesn't exist or
    /// fails to parse.
    pub fn load() -> Self {
        let mut config = match default_config_path().and_then(|path| Self::load_from(&path)) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Failed to load config, using defaults: {:#}", e);
                Self::default()
            }
        };
        config.apply_env();
        config
    }

    /// Load from an explicit path. A missing file yields defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).context("Failed to read config file")?;
        let config = serde_json::from_str(&content).context("Failed to parse config file")?;

        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let content = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, content).context("Failed to write config file")?;

        Ok(())
    }

    fn apply_env(&mut self) {
        if let Some(port) = std::env::var(PORT_ENV).ok().and_then(|p| p.parse().ok()) {
            self.server.port = port;
        }
    }
}

pub fn default_config_path() -> Result<PathBuf> {
    let dirs = directories::ProjectDirs::from("", "", APP_NAME)
        .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
    Ok(dirs.config_dir().join(CONFIG_FILE))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = EstimatorConfig::load_from(&dir.path().join("absent.json")).unwrap();
        assert_eq!(config, EstimatorConfig::default());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, r#"{"calibration": {"parallelism_factor": 0.8}}"#).unwrap();

        let config = EstimatorConfig::load_from(&path).unwrap();
        assert_eq!(config.calibration.parallelism_factor, 0.8);
        assert_eq!(config.calibration.working_days_per_month, 22.0);
        assert_eq!(config.history_capacity, DEFAULT_HISTORY_CAPACITY);
    }

    #[test]
    fn save_then_load_preserves_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE);
        let mut config = EstimatorConfig::default();
        config.history_capacity = 12;
        config.server.port = 4100;

        config.save_to(&path).unwrap();
        assert_eq!(EstimatorConfig::load_from(&path).unwrap(), config);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "{ nope").unwrap();
        assert!(EstimatorConfig::load_from(&path).is_err());
    }
}
