//! Configuration for the call station

use serde::{Deserialize, Serialize};

use crate::error::{Result, StationError};
use crate::logging::{parse_log_level, LoggingConfig};

/// Call station configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StationConfig {
    /// Capacity of the lifecycle event broadcast channel
    pub event_capacity: usize,

    /// Logging settings
    pub logging: LoggingSettings,
}

/// Logging settings as they appear in a configuration file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Log level (`trace`, `debug`, `info`, `warn`, `error`)
    pub level: String,

    /// Emit JSON formatted log lines
    pub json: bool,

    /// Include file and line information
    pub file_info: bool,
}

impl Default for StationConfig {
    fn default() -> Self {
        Self {
            event_capacity: 256,
            logging: LoggingSettings::default(),
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file_info: false,
        }
    }
}

impl StationConfig {
    /// Parse a configuration from a TOML document
    ///
    /// Missing keys fall back to their defaults. The parsed configuration is
    /// validated before it is returned.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: StationConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.event_capacity == 0 {
            return Err(StationError::config(
                "event_capacity must be greater than zero",
            ));
        }
        parse_log_level(&self.logging.level)?;
        Ok(())
    }

    /// Build the logging configuration for [`crate::logging::setup_logging`]
    pub fn logging_config(&self) -> Result<LoggingConfig> {
        Ok(LoggingConfig {
            level: parse_log_level(&self.logging.level)?,
            json: self.logging.json,
            file_info: self.logging.file_info,
        })
    }
}
