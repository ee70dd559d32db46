//! Dialogue Transport Port - Interface to the remote dialogue service.
//!
//! The dialogue service decides conversation content and flow routing; this
//! port only moves requests and responses. Implementations hold no
//! conversation state and never retry.
//!
//! # Example
//!
//! ```ignore
//! let response = transport
//!     .start(StartRequest::new(None, "rental-assistant/0.1"))
//!     .await?;
//! let session_id = response.require_session_id()?;
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::conversation::{
    deserialize_optional_id, FlowType, InputType, ResultItem, StepUpdate, Turn, TurnContext,
    TurnFlags,
};
use crate::domain::foundation::DialogueSessionId;

/// Port for the three dialogue service calls.
#[async_trait]
pub trait DialogueTransport: Send + Sync {
    /// Opens (or resumes) a session and returns the first bot turn.
    async fn start(&self, request: StartRequest) -> Result<TurnResponse, TransportError>;

    /// Sends a user answer and returns the next bot turn.
    async fn respond(&self, request: RespondRequest) -> Result<TurnResponse, TransportError>;

    /// Submits the end-of-conversation satisfaction verdict.
    async fn submit_satisfaction(
        &self,
        request: SatisfactionRequest,
    ) -> Result<SatisfactionResponse, TransportError>;
}

// ════════════════════════════════════════════════════════════════════════════════
// Requests
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<DialogueSessionId>,
    pub user_agent: String,
}

impl StartRequest {
    pub fn new(session_id: Option<DialogueSessionId>, user_agent: impl Into<String>) -> Self {
        Self {
            session_id,
            user_agent: user_agent.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RespondRequest {
    pub session_id: DialogueSessionId,
    pub user_response: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SatisfactionRequest {
    pub session_id: DialogueSessionId,
    pub is_satisfied: bool,
    pub feedback: String,
}

// ════════════════════════════════════════════════════════════════════════════════
// Responses
// ════════════════════════════════════════════════════════════════════════════════

/// One bot turn as returned by `start` and `respond`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TurnResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completion_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_options: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_type: Option<InputType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step_number: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flow_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<Vec<ResultItem>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_final: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_completed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_submitted: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub restart: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_keyword: Option<String>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_optional_id"
    )]
    pub selected_property_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TurnResponse {
    /// Creates a response carrying a question.
    pub fn question(text: impl Into<String>) -> Self {
        Self {
            question: Some(text.into()),
            ..Default::default()
        }
    }

    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn with_input_type(mut self, input_type: InputType) -> Self {
        self.input_type = Some(input_type);
        self
    }

    pub fn with_options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options = Some(options.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_properties(mut self, items: Vec<ResultItem>) -> Self {
        self.properties = Some(items);
        self
    }

    pub fn with_step(mut self, step_number: u32) -> Self {
        self.step_number = Some(step_number);
        self
    }

    pub fn with_flow_type(mut self, flow_type: impl Into<String>) -> Self {
        self.flow_type = Some(flow_type.into());
        self
    }

    pub fn marked_final(mut self) -> Self {
        self.is_final = Some(true);
        self
    }

    pub fn marked_restart(mut self) -> Self {
        self.restart = Some(true);
        self
    }

    /// Rejects bodies carrying a service-side error.
    ///
    /// # Errors
    ///
    /// - `InvalidResponse` if `error` is set
    pub fn check(&self) -> Result<(), TransportError> {
        match &self.error {
            Some(error) => Err(TransportError::invalid_response(error.clone())),
            None => Ok(()),
        }
    }

    /// Session id a `start` response must carry.
    ///
    /// # Errors
    ///
    /// - `InvalidResponse` if absent or blank
    pub fn require_session_id(&self) -> Result<DialogueSessionId, TransportError> {
        self.session_id
            .as_deref()
            .ok_or_else(|| TransportError::invalid_response("missing session_id"))
            .and_then(|id| {
                DialogueSessionId::new(id)
                    .map_err(|_| TransportError::invalid_response("blank session_id"))
            })
    }

    /// Bot text: the question, or the completion message on final turns.
    pub fn content(&self) -> Option<&str> {
        self.question
            .as_deref()
            .filter(|q| !q.trim().is_empty())
            .or(self.completion_message.as_deref())
    }

    /// Options followed by additional options, duplicates dropped.
    pub fn merged_options(&self) -> Option<Vec<String>> {
        if self.options.is_none() && self.additional_options.is_none() {
            return None;
        }
        let mut merged: Vec<String> = Vec::new();
        for option in self
            .options
            .iter()
            .flatten()
            .chain(self.additional_options.iter().flatten())
        {
            if !merged.contains(option) {
                merged.push(option.clone());
            }
        }
        Some(merged)
    }

    pub fn flags(&self) -> TurnFlags {
        TurnFlags {
            is_final: self.is_final.unwrap_or(false),
            conversation_completed: self.conversation_completed.unwrap_or(false),
            contact_submitted: self.contact_submitted.unwrap_or(false),
            restart: self.restart.unwrap_or(false),
        }
    }

    pub fn step_update(&self) -> StepUpdate {
        StepUpdate {
            step_number: self.step_number,
            flow_type: self.flow_type.clone().and_then(FlowType::parse),
            flags: self.flags(),
        }
    }

    /// Materializes the bot turn. `fallback_step` is used when the
    /// response carries no step number.
    pub fn to_bot_turn(&self, fallback_step: u32) -> Turn {
        Turn::bot(
            self.step_number.unwrap_or(fallback_step),
            self.input_type.unwrap_or_default(),
            self.content().map(str::to_string),
        )
        .with_options(self.merged_options())
        .with_items(self.properties.clone())
        .with_flags(self.flags())
        .with_context(TurnContext {
            search_keyword: self.search_keyword.clone(),
            selected_property_id: self.selected_property_id.clone(),
        })
    }
}

/// Response to a satisfaction submission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SatisfactionResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub conversation_completed: bool,
    pub escalated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SatisfactionResponse {
    pub fn acknowledged(message: impl Into<String>, escalated: bool) -> Self {
        Self {
            message: Some(message.into()),
            conversation_completed: true,
            escalated,
            error: None,
        }
    }

    /// # Errors
    ///
    /// - `InvalidResponse` if `error` is set
    pub fn check(&self) -> Result<(), TransportError> {
        match &self.error {
            Some(error) => Err(TransportError::invalid_response(error.clone())),
            None => Ok(()),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Errors
// ════════════════════════════════════════════════════════════════════════════════

/// Dialogue transport errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// Connection failed or dropped.
    #[error("network error: {0}")]
    Network(String),

    /// Request timed out.
    #[error("request timed out after {timeout_secs}s")]
    Timeout {
        /// Configured timeout.
        timeout_secs: u64,
    },

    /// Non-success HTTP status.
    #[error("dialogue service returned {status}: {message}")]
    Status { status: u16, message: String },

    /// Body could not be decoded.
    #[error("parse error: {0}")]
    Parse(String),

    /// Body decoded but is unusable (service error, missing session id).
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl TransportError {
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }

    pub fn timeout(timeout_secs: u64) -> Self {
        Self::Timeout { timeout_secs }
    }

    pub fn status(status: u16, message: impl Into<String>) -> Self {
        Self::Status {
            status,
            message: message.into(),
        }
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }

    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::InvalidResponse(message.into())
    }

    /// Returns true if repeating the same call may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            TransportError::Network(_) | TransportError::Timeout { .. } => true,
            TransportError::Status { status, .. } => *status >= 500,
            TransportError::Parse(_) | TransportError::InvalidResponse(_) => false,
        }
    }
}
