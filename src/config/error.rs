//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Dialogue service URL must use http or https")]
    InvalidDialogueUrl,

    #[error("Endpoint path must start with '/': {0}")]
    InvalidEndpointPath(String),

    #[error("Invalid request timeout")]
    InvalidTimeout,

    #[error("Pacing min_delay_ms exceeds max_delay_ms")]
    InvalidDelayRange,

    #[error("Invalid log filter directive: {0}")]
    InvalidLogFilter(String),
}
