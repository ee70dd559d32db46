//! Feedback value object and the closed satisfaction record.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::ValidationError;

/// Maximum feedback length in characters.
pub const MAX_FEEDBACK_LENGTH: usize = 500;

/// Non-empty free-text feedback, at most `MAX_FEEDBACK_LENGTH` characters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Feedback(String);

impl Feedback {
    /// Creates feedback from raw input.
    ///
    /// Surrounding whitespace is trimmed and overlong input is truncated
    /// on a character boundary.
    ///
    /// # Errors
    ///
    /// - `EmptyField` if nothing is left after trimming
    pub fn new(text: impl AsRef<str>) -> Result<Self, ValidationError> {
        let trimmed = text.as_ref().trim();
        if trimmed.is_empty() {
            return Err(ValidationError::empty_field("feedback"));
        }
        let bounded: String = trimmed.chars().take(MAX_FEEDBACK_LENGTH).collect();
        Ok(Self(bounded))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Outcome of a closed satisfaction sub-flow.
///
/// `escalated` comes from the dialogue service, never inferred locally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SatisfactionRecord {
    pub is_satisfied: bool,
    pub feedback_text: String,
    pub escalated: bool,
}
