//! Dialogue service configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Dialogue service endpoints and HTTP client settings
#[derive(Debug, Clone, Deserialize)]
pub struct DialogueConfig {
    /// Base URL of the dialogue service (e.g. `https://rentals.example.com`)
    pub base_url: String,

    #[serde(default = "default_start_path")]
    pub start_path: String,

    #[serde(default = "default_respond_path")]
    pub respond_path: String,

    #[serde(default = "default_satisfaction_path")]
    pub satisfaction_path: String,

    /// Sent with every `start` request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl DialogueConfig {
    /// Creates a configuration with default paths for the given base URL
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            start_path: default_start_path(),
            respond_path: default_respond_path(),
            satisfaction_path: default_satisfaction_path(),
            user_agent: default_user_agent(),
            timeout_secs: default_timeout(),
        }
    }

    /// Get timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Validate dialogue configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.base_url.trim().is_empty() {
            return Err(ValidationError::MissingRequired("DIALOGUE__BASE_URL"));
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ValidationError::InvalidDialogueUrl);
        }
        for path in [&self.start_path, &self.respond_path, &self.satisfaction_path] {
            if !path.starts_with('/') {
                return Err(ValidationError::InvalidEndpointPath(path.clone()));
            }
        }
        if self.timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout);
        }
        Ok(())
    }
}

fn default_start_path() -> String {
    "/api/chatbot/start".to_string()
}

fn default_respond_path() -> String {
    "/api/chatbot/respond".to_string()
}

fn default_satisfaction_path() -> String {
    "/api/chatbot/satisfaction".to_string()
}

fn default_user_agent() -> String {
    format!("rental-assistant/{}", env!("CARGO_PKG_VERSION"))
}

fn default_timeout() -> u64 {
    30
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DialogueConfig::new("http://localhost:8000");
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert!(config.user_agent.starts_with("rental-assistant/"));
    }

    #[test]
    fn test_validation_rejects_bad_scheme() {
        let config = DialogueConfig::new("ftp://rentals.example.com");
        assert_eq!(config.validate(), Err(ValidationError::InvalidDialogueUrl));
    }

    #[test]
    fn test_validation_rejects_empty_url() {
        let config = DialogueConfig::new("");
        assert_eq!(
            config.validate(),
            Err(ValidationError::MissingRequired("DIALOGUE__BASE_URL"))
        );
    }

    #[test]
    fn test_validation_rejects_zero_timeout() {
        let config = DialogueConfig {
            timeout_secs: 0,
            ..DialogueConfig::new("http://localhost")
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidTimeout));
    }

    #[test]
    fn test_validation_rejects_relative_path() {
        let config = DialogueConfig {
            respond_path: "api/respond".to_string(),
            ..DialogueConfig::new("http://localhost")
        };
        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidEndpointPath(_))
        ));
    }
}
