//! Strongly-typed identifier value objects.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::ValidationError;

/// Locally unique, time-ordered identifier for a turn in the message log.
///
/// Backed by a UUIDv7, so ids generated later sort after ids generated
/// earlier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TurnId(Uuid);

impl TurnId {
    /// Creates a new time-ordered TurnId.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for TurnId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TurnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Session identifier issued by the dialogue service.
///
/// Opaque to the engine; only ever assigned from a service response.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DialogueSessionId(String);

impl DialogueSessionId {
    /// Creates a new DialogueSessionId, returning error if blank.
    pub fn new(id: impl Into<String>) -> Result<Self, ValidationError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(ValidationError::empty_field("session_id"));
        }
        Ok(Self(id))
    }

    /// Returns the inner string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DialogueSessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn turn_id_generates_unique_values() {
        let id1 = TurnId::new();
        let id2 = TurnId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn turn_ids_are_time_ordered() {
        let ids: Vec<TurnId> = (0..50).map(|_| TurnId::new()).collect();
        let mut sorted = ids.clone();
        sorted.sort();
        assert_eq!(ids, sorted);
    }

    #[test]
    fn turn_id_displays_as_uuid() {
        let id = TurnId::new();
        assert_eq!(id.to_string().len(), 36);
        assert_eq!(serde_json::to_string(&id).unwrap(), format!("\"{}\"", id));
    }

    #[test]
    fn dialogue_session_id_accepts_non_empty_string() {
        let id = DialogueSessionId::new("abc").unwrap();
        assert_eq!(id.as_str(), "abc");
        assert_eq!(id.to_string(), "abc");
    }

    #[test]
    fn dialogue_session_id_rejects_blank_string() {
        match DialogueSessionId::new("   ") {
            Err(ValidationError::EmptyField { field }) => assert_eq!(field, "session_id"),
            other => panic!("Expected EmptyField error, got {:?}", other),
        }
    }

    #[test]
    fn dialogue_session_id_serializes_transparently() {
        let id = DialogueSessionId::new("abc").unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"abc\"");
    }
}
