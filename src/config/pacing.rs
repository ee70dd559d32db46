//! Turn-pacing configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Reveal delay range for bot turns
#[derive(Debug, Clone, Deserialize)]
pub struct PacingConfig {
    #[serde(default = "default_min_delay")]
    pub min_delay_ms: u64,

    #[serde(default = "default_max_delay")]
    pub max_delay_ms: u64,

    /// When false, bot turns are revealed immediately
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

impl PacingConfig {
    pub fn min_delay(&self) -> Duration {
        Duration::from_millis(self.min_delay_ms)
    }

    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }

    /// Validate pacing configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.min_delay_ms > self.max_delay_ms {
            return Err(ValidationError::InvalidDelayRange);
        }
        Ok(())
    }
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            min_delay_ms: default_min_delay(),
            max_delay_ms: default_max_delay(),
            enabled: default_enabled(),
        }
    }
}

fn default_min_delay() -> u64 {
    500
}

fn default_max_delay() -> u64 {
    1500
}

fn default_enabled() -> bool {
    true
}
