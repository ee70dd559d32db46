//! SessionStatus enum for tracking the lifecycle of an assistant session.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::StateMachine;

/// Lifecycle status of an assistant session.
///
/// - `Active`: accepting user turns
/// - `Completed`: the service marked a turn final; satisfaction may follow
/// - `Escalated`: the satisfaction sub-flow asked for human follow-up
/// - `Abandoned`: inferred by observers when input stops; never set by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    #[default]
    Active,
    Completed,
    Escalated,
    Abandoned,
}

impl SessionStatus {
    /// Returns true if user turns may be submitted.
    pub fn accepts_user_input(&self) -> bool {
        matches!(self, SessionStatus::Active)
    }
}

impl StateMachine for SessionStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use SessionStatus::*;
        matches!(
            (self, target),
            // Restart-marked response keeps the session active
            (Active, Active)
                | (Active, Completed)
                | (Active, Abandoned)
                // Only the satisfaction sub-flow escalates
                | (Completed, Escalated)
                | (Completed, Abandoned)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use SessionStatus::*;
        match self {
            Active => vec![Active, Completed, Abandoned],
            Completed => vec![Escalated, Abandoned],
            Escalated => vec![],
            Abandoned => vec![],
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SessionStatus::Active => "active",
            SessionStatus::Completed => "completed",
            SessionStatus::Escalated => "escalated",
            SessionStatus::Abandoned => "abandoned",
        };
        write!(f, "{}", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_active() {
        assert_eq!(SessionStatus::default(), SessionStatus::Active);
    }

    #[test]
    fn only_active_accepts_user_input() {
        assert!(SessionStatus::Active.accepts_user_input());
        assert!(!SessionStatus::Completed.accepts_user_input());
        assert!(!SessionStatus::Escalated.accepts_user_input());
        assert!(!SessionStatus::Abandoned.accepts_user_input());
    }

    #[test]
    fn active_can_loop_on_restart() {
        assert!(SessionStatus::Active.can_transition_to(&SessionStatus::Active));
    }

    #[test]
    fn escalation_requires_completion_first() {
        assert!(!SessionStatus::Active.can_transition_to(&SessionStatus::Escalated));
        assert!(SessionStatus::Completed.can_transition_to(&SessionStatus::Escalated));
    }

    #[test]
    fn closed_states_never_return_to_active() {
        for status in [
            SessionStatus::Completed,
            SessionStatus::Escalated,
            SessionStatus::Abandoned,
        ] {
            assert!(!status.can_transition_to(&SessionStatus::Active));
        }
    }

    #[test]
    fn escalated_and_abandoned_are_terminal() {
        assert!(SessionStatus::Escalated.is_terminal());
        assert!(SessionStatus::Abandoned.is_terminal());
        assert!(!SessionStatus::Completed.is_terminal());
    }

    #[test]
    fn valid_transitions_matches_can_transition_to() {
        for status in [
            SessionStatus::Active,
            SessionStatus::Completed,
            SessionStatus::Escalated,
            SessionStatus::Abandoned,
        ] {
            for target in status.valid_transitions() {
                assert!(status.can_transition_to(&target));
            }
        }
    }

    #[test]
    fn serializes_to_snake_case_json() {
        assert_eq!(
            serde_json::to_string(&SessionStatus::Escalated).unwrap(),
            "\"escalated\""
        );
        let status: SessionStatus = serde_json::from_str("\"completed\"").unwrap();
        assert_eq!(status, SessionStatus::Completed);
    }

    #[test]
    fn display_works_correctly() {
        assert_eq!(SessionStatus::Active.to_string(), "active");
        assert_eq!(SessionStatus::Abandoned.to_string(), "abandoned");
    }
}
