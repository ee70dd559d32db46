//! Application configuration module
//!
//! This module provides type-safe configuration loading from environment variables
//! using the `config` and `dotenvy` crates. Configuration is loaded with the
//! `RENTAL_ASSISTANT` prefix and nested values use double underscores as separators.
//!
//! # Example
//!
//! ```no_run
//! use rental_assistant::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Dialogue service at {}", config.dialogue.base_url);
//! ```

mod dialogue;
mod error;
mod logging;
mod pacing;

pub use dialogue::DialogueConfig;
pub use error::{ConfigError, ValidationError};
pub use logging::LoggingConfig;
pub use pacing::PacingConfig;

use serde::Deserialize;

/// Root application configuration
///
/// Load using [`AppConfig::load()`] which reads from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Dialogue service endpoints and HTTP timeout
    pub dialogue: DialogueConfig,

    /// Bot turn reveal delay
    #[serde(default)]
    pub pacing: PacingConfig,

    /// Tracing subscriber settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `RENTAL_ASSISTANT` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `RENTAL_ASSISTANT__DIALOGUE__BASE_URL=...` -> `dialogue.base_url = ...`
    /// - `RENTAL_ASSISTANT__PACING__MAX_DELAY_MS=900` -> `pacing.max_delay_ms = 900`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Required environment variables are missing
    /// - Values cannot be parsed into expected types
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("RENTAL_ASSISTANT")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.dialogue.validate()?;
        self.pacing.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}
