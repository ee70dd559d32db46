//! HTTP Dialogue Transport - `DialogueTransport` over JSON/HTTP.
//!
//! # Configuration
//!
//! ```ignore
//! let config = HttpTransportConfig::new("https://rentals.example.com")
//!     .with_timeout(Duration::from_secs(10));
//!
//! let transport = HttpDialogueTransport::new(config)?;
//! ```
//!
//! Every call is a single POST with a JSON body. The request timeout is the
//! only cancellation mechanism; it surfaces as `TransportError::Timeout`.

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

use crate::config::DialogueConfig;
use crate::ports::{
    DialogueTransport, RespondRequest, SatisfactionRequest, SatisfactionResponse, StartRequest,
    TransportError, TurnResponse,
};

/// Configuration for the HTTP transport.
#[derive(Debug, Clone)]
pub struct HttpTransportConfig {
    /// Base URL of the dialogue service.
    pub base_url: String,
    pub start_path: String,
    pub respond_path: String,
    pub satisfaction_path: String,
    /// Request timeout.
    pub timeout: Duration,
}

impl HttpTransportConfig {
    /// Creates a configuration with the default endpoint paths.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::from(&DialogueConfig::new(base_url))
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}

impl From<&DialogueConfig> for HttpTransportConfig {
    fn from(config: &DialogueConfig) -> Self {
        Self {
            base_url: config.base_url.clone(),
            start_path: config.start_path.clone(),
            respond_path: config.respond_path.clone(),
            satisfaction_path: config.satisfaction_path.clone(),
            timeout: config.timeout(),
        }
    }
}

/// Dialogue transport backed by `reqwest`.
pub struct HttpDialogueTransport {
    config: HttpTransportConfig,
    client: Client,
}

impl HttpDialogueTransport {
    /// Creates a new transport with the given configuration.
    ///
    /// # Errors
    ///
    /// - `Network` if the HTTP client cannot be built
    pub fn new(config: HttpTransportConfig) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| TransportError::network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    /// Sends a JSON POST and decodes the JSON body.
    async fn post<B, R>(&self, path: &str, body: &B) -> Result<R, TransportError>
    where
        B: Serialize + Sync,
        R: DeserializeOwned,
    {
        let url = self.config.url(path);
        tracing::debug!(%url, "dialogue request");

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let response = Self::handle_response_status(response).await?;

        response
            .json::<R>()
            .await
            .map_err(|e| TransportError::parse(format!("Failed to parse response: {}", e)))
    }

    fn map_send_error(&self, e: reqwest::Error) -> TransportError {
        if e.is_timeout() {
            TransportError::timeout(self.config.timeout.as_secs())
        } else if e.is_connect() {
            TransportError::network(format!("Connection failed: {}", e))
        } else {
            TransportError::network(e.to_string())
        }
    }

    /// Maps non-success statuses to `TransportError::Status`.
    async fn handle_response_status(response: Response) -> Result<Response, TransportError> {
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        let error_body = response.text().await.unwrap_or_default();
        Err(TransportError::status(
            status.as_u16(),
            Self::error_message(&error_body),
        ))
    }

    /// Prefers the service's `error`/`detail` field over the raw body.
    fn error_message(error_body: &str) -> String {
        if let Ok(parsed) = serde_json::from_str::<serde_json::Value>(error_body) {
            for key in ["error", "detail", "message"] {
                if let Some(message) = parsed.get(key).and_then(|v| v.as_str()) {
                    return message.to_string();
                }
            }
        }
        error_body.to_string()
    }
}

#[async_trait]
impl DialogueTransport for HttpDialogueTransport {
    async fn start(&self, request: StartRequest) -> Result<TurnResponse, TransportError> {
        let response: TurnResponse = self.post(&self.config.start_path, &request).await?;
        response.check()?;
        response.require_session_id()?;
        Ok(response)
    }

    async fn respond(&self, request: RespondRequest) -> Result<TurnResponse, TransportError> {
        let response: TurnResponse = self.post(&self.config.respond_path, &request).await?;
        response.check()?;
        Ok(response)
    }

    async fn submit_satisfaction(
        &self,
        request: SatisfactionRequest,
    ) -> Result<SatisfactionResponse, TransportError> {
        let response: SatisfactionResponse =
            self.post(&self.config.satisfaction_path, &request).await?;
        response.check()?;
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_builder_works() {
        let config = HttpTransportConfig::new("http://localhost:8000/")
            .with_timeout(Duration::from_secs(5));

        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(
            config.url(&config.start_path),
            "http://localhost:8000/api/chatbot/start"
        );
    }

    #[test]
    fn config_from_dialogue_config_keeps_paths() {
        let dialogue = DialogueConfig {
            respond_path: "/v2/respond".to_string(),
            timeout_secs: 12,
            ..DialogueConfig::new("https://rentals.example.com")
        };
        let config = HttpTransportConfig::from(&dialogue);
        assert_eq!(config.respond_path, "/v2/respond");
        assert_eq!(config.timeout, Duration::from_secs(12));
    }

    #[test]
    fn error_message_prefers_json_error_field() {
        assert_eq!(
            HttpDialogueTransport::error_message(r#"{"error": "session not found"}"#),
            "session not found"
        );
        assert_eq!(
            HttpDialogueTransport::error_message(r#"{"detail": "bad input"}"#),
            "bad input"
        );
        assert_eq!(
            HttpDialogueTransport::error_message("Internal Server Error"),
            "Internal Server Error"
        );
    }

    #[tokio::test]
    async fn unreachable_service_is_a_retryable_network_error() {
        let transport = HttpDialogueTransport::new(
            HttpTransportConfig::new("http://127.0.0.1:9").with_timeout(Duration::from_secs(2)),
        )
        .unwrap();

        let err = transport
            .start(StartRequest::new(None, "test-agent"))
            .await
            .unwrap_err();

        assert!(err.is_retryable(), "unexpected error: {:?}", err);
    }
}
