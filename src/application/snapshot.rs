//! Immutable engine snapshots and intent outcomes.

use serde::Serialize;
use std::fmt;

use crate::domain::conversation::{InteractionMode, Session, SessionStatus, Turn};
use crate::domain::satisfaction::{SatisfactionFlow, SatisfactionRecord, SatisfactionState};

/// Everything the presentation layer needs to render the assistant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngineSnapshot {
    /// None until the first successful `start`.
    pub session: Option<Session>,
    /// Committed message log.
    pub turns: Vec<Turn>,
    /// User turn staged while its call is outstanding.
    pub pending_user_turn: Option<Turn>,
    /// What the caller must collect next.
    pub mode: InteractionMode,
    /// True exactly while a received bot turn is held back.
    pub is_typing: bool,
    pub input_locked: bool,
    /// Present once the session has completed.
    pub satisfaction: Option<SatisfactionFlow>,
}

impl EngineSnapshot {
    pub fn status(&self) -> Option<SessionStatus> {
        self.session.as_ref().map(Session::status)
    }

    pub fn current_step(&self) -> Option<u32> {
        self.session.as_ref().map(Session::current_step)
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.session_id().as_str())
    }

    pub fn last_turn(&self) -> Option<&Turn> {
        self.turns.last()
    }

    pub fn satisfaction_state(&self) -> Option<SatisfactionState> {
        self.satisfaction.as_ref().map(SatisfactionFlow::state)
    }

    pub fn satisfaction_record(&self) -> Option<&SatisfactionRecord> {
        self.satisfaction.as_ref().and_then(SatisfactionFlow::record)
    }
}

/// Local guard rejections. None of these touch the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IgnoreReason {
    /// Another call is outstanding.
    InputLocked,
    NotStarted,
    AlreadyStarted,
    SessionNotActive,
    /// The current interaction mode does not take this input.
    InputNotAccepted,
    UnknownItem,
    EmptyFeedback,
    SatisfactionUnavailable,
}

impl fmt::Display for IgnoreReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            IgnoreReason::InputLocked => "input locked while a turn is outstanding",
            IgnoreReason::NotStarted => "session not started",
            IgnoreReason::AlreadyStarted => "session already started",
            IgnoreReason::SessionNotActive => "session is no longer active",
            IgnoreReason::InputNotAccepted => "input not accepted in current mode",
            IgnoreReason::UnknownItem => "item is not on offer",
            IgnoreReason::EmptyFeedback => "feedback is empty",
            IgnoreReason::SatisfactionUnavailable => "satisfaction step not available",
        };
        write!(f, "{}", s)
    }
}

/// Result of an intent that did not fail.
#[derive(Debug, Clone, PartialEq)]
pub enum TurnOutcome {
    /// State changed; the snapshot after the change.
    Applied(EngineSnapshot),
    /// Dropped by a local guard; nothing changed.
    Ignored(IgnoreReason),
}

impl TurnOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, TurnOutcome::Applied(_))
    }

    pub fn snapshot(&self) -> Option<&EngineSnapshot> {
        match self {
            TurnOutcome::Applied(snapshot) => Some(snapshot),
            TurnOutcome::Ignored(_) => None,
        }
    }

    pub fn ignore_reason(&self) -> Option<IgnoreReason> {
        match self {
            TurnOutcome::Applied(_) => None,
            TurnOutcome::Ignored(reason) => Some(*reason),
        }
    }
}
