//! Error types for the call station
//!
//! Call lifecycle outcomes are never errors: rejected and force-terminated
//! calls are recorded as [`crate::types::CallStatus::Ended`] records. These
//! errors only cover configuration, logging setup and identifier parsing.

use thiserror::Error;

/// Call station errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StationError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Parse errors (TOML documents, call identifiers)
    #[error("Parse error: {0}")]
    Parse(String),
}

impl StationError {
    /// Create a new Config error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new Parse error
    pub fn parse<S: Into<String>>(msg: S) -> Self {
        Self::Parse(msg.into())
    }

    /// Check if this is a configuration-related error
    pub fn is_configuration_error(&self) -> bool {
        matches!(self, StationError::Config(_))
    }
}

impl From<toml::de::Error> for StationError {
    fn from(err: toml::de::Error) -> Self {
        Self::parse(err.to_string())
    }
}

impl From<uuid::Error> for StationError {
    fn from(err: uuid::Error) -> Self {
        Self::parse(format!("invalid call id: {}", err))
    }
}

/// Result type for call station operations
pub type Result<T> = std::result::Result<T, StationError>;
