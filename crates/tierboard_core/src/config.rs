//! Engine configuration.
//!
//! # Responsibility
//! - Carry host-provided settings into logging, storage and input handling.
//! - Validate settings before any subsystem starts.
//!
//! # Invariants
//! - `activation_distance` is finite and non-negative.
//! - `log_level` is one of the levels accepted by `init_logging`.

use crate::logging::{self, default_log_level, normalize_level};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Pointer travel in logical pixels before a press becomes a drag.
pub const DEFAULT_ACTIVATION_DISTANCE_PX: f64 = 5.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub log_level: String,
    /// Absolute directory for rolling log files; `None` leaves logging off.
    pub log_dir: Option<PathBuf>,
    /// SQLite board file; `None` keeps the board in memory.
    pub db_path: Option<PathBuf>,
    pub activation_distance: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level().to_string(),
            log_dir: None,
            db_path: None,
            activation_distance: DEFAULT_ACTIVATION_DISTANCE_PX,
        }
    }
}

impl EngineConfig {
    pub fn with_log_dir(mut self, log_dir: impl Into<PathBuf>) -> Self {
        self.log_dir = Some(log_dir.into());
        self
    }

    pub fn with_db_path(mut self, db_path: impl Into<PathBuf>) -> Self {
        self.db_path = Some(db_path.into());
        self
    }

    pub fn with_activation_distance(mut self, distance: f64) -> Self {
        self.activation_distance = distance;
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        normalize_level(&self.log_level)?;
        if !self.activation_distance.is_finite() || self.activation_distance < 0.0 {
            return Err(format!(
                "activation_distance must be a non-negative number, got {}",
                self.activation_distance
            ));
        }
        if let Some(log_dir) = &self.log_dir {
            if !log_dir.is_absolute() {
                return Err(format!(
                    "log_dir must be an absolute path, got `{}`",
                    log_dir.display()
                ));
            }
        }
        Ok(())
    }

    /// Starts logging when `log_dir` is set; a no-op otherwise.
    pub fn init_logging(&self) -> Result<(), String> {
        match &self.log_dir {
            Some(log_dir) => {
                let log_dir = log_dir
                    .to_str()
                    .ok_or_else(|| format!("log_dir is not valid UTF-8: `{}`", log_dir.display()))?;
                logging::init_logging(&self.log_level, log_dir)
            }
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{EngineConfig, DEFAULT_ACTIVATION_DISTANCE_PX};

    #[test]
    fn default_config_is_valid() {
        let config = EngineConfig::default();
        assert_eq!(config.activation_distance, DEFAULT_ACTIVATION_DISTANCE_PX);
        assert!(config.validate().is_ok());
        assert!(config.init_logging().is_ok());
    }

    #[test]
    fn validate_rejects_bad_values() {
        let negative = EngineConfig::default().with_activation_distance(-1.0);
        assert!(negative.validate().is_err());

        let nan = EngineConfig::default().with_activation_distance(f64::NAN);
        assert!(nan.validate().is_err());

        let relative = EngineConfig::default().with_log_dir("logs");
        assert!(relative.validate().unwrap_err().contains("absolute"));

        let level = EngineConfig {
            log_level: "loud".to_string(),
            ..EngineConfig::default()
        };
        assert!(level.validate().is_err());
    }

    #[test]
    fn deserializes_partial_json_with_defaults() {
        let config: EngineConfig =
            serde_json::from_str(r#"{"activation_distance": 8.0}"#).unwrap();
        assert_eq!(config.activation_distance, 8.0);
        assert_eq!(config.db_path, None);
    }
}
