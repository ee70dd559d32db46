//! Session aggregate for one assistant conversation.
//!
//! The session is created from the first successful `start` response and
//! advanced by every bot turn. It owns the forward-looking state only
//! (step, flow, status); turn history lives in the message log.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::status::SessionStatus;
use super::turn::TurnFlags;
use crate::domain::foundation::{DialogueSessionId, StateMachine, Timestamp, ValidationError};

/// Conversation branch the dialogue service routed the session into
/// (property search, rent inquiry, visit scheduling, ...). Opaque to the engine.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FlowType(String);

impl FlowType {
    /// Returns None for blank values.
    pub fn parse(value: impl Into<String>) -> Option<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            None
        } else {
            Some(Self(value))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FlowType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Forward-looking fields a bot turn carries into the session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepUpdate {
    pub step_number: Option<u32>,
    pub flow_type: Option<FlowType>,
    pub flags: TurnFlags,
}

/// What applying a bot turn did to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Continued,
    Restarted,
    Completed,
}

/// Session state for one widget activation.
///
/// # Invariants
///
/// - `current_step` never decreases except on a restart-marked turn (reset to 0)
/// - status only leaves `Active` through `Completed`
/// - `Escalated` is only reachable from `Completed`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    session_id: DialogueSessionId,
    current_step: u32,
    flow_type: Option<FlowType>,
    status: SessionStatus,
    started_at: Timestamp,
}

impl Session {
    /// Creates an active session at step 0. The first response's step and
    /// flow are applied through `apply_step`.
    pub fn start(session_id: DialogueSessionId) -> Self {
        Self {
            session_id,
            current_step: 0,
            flow_type: None,
            status: SessionStatus::Active,
            started_at: Timestamp::now(),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────────

    pub fn session_id(&self) -> &DialogueSessionId {
        &self.session_id
    }

    pub fn current_step(&self) -> u32 {
        self.current_step
    }

    pub fn flow_type(&self) -> Option<&FlowType> {
        self.flow_type.as_ref()
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn is_active(&self) -> bool {
        self.status.accepts_user_input()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Transitions
    // ─────────────────────────────────────────────────────────────────────────

    /// Applies a bot turn's step, flow and flags.
    ///
    /// A restart flag wins over completion flags on the same turn.
    ///
    /// # Errors
    ///
    /// - `InvalidFormat` if the session is no longer active
    pub fn apply_step(&mut self, update: &StepUpdate) -> Result<StepOutcome, ValidationError> {
        if update.flags.restart {
            self.status = self.status.transition_to(SessionStatus::Active)?;
            self.current_step = 0;
            if let Some(flow_type) = &update.flow_type {
                self.flow_type = Some(flow_type.clone());
            }
            return Ok(StepOutcome::Restarted);
        }

        let next_status = if update.flags.ends_session() {
            SessionStatus::Completed
        } else {
            SessionStatus::Active
        };
        self.status = self.status.transition_to(next_status)?;

        if let Some(step) = update.step_number {
            self.current_step = self.current_step.max(step);
        }
        if let Some(flow_type) = &update.flow_type {
            self.flow_type = Some(flow_type.clone());
        }

        Ok(match next_status {
            SessionStatus::Completed => StepOutcome::Completed,
            _ => StepOutcome::Continued,
        })
    }

    /// Marks the session escalated after the satisfaction sub-flow.
    ///
    /// # Errors
    ///
    /// - `InvalidFormat` unless the session is `Completed`
    pub fn escalate(&mut self) -> Result<(), ValidationError> {
        self.status = self.status.transition_to(SessionStatus::Escalated)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> Session {
        Session::start(DialogueSessionId::new("abc").unwrap())
    }

    fn step(n: u32) -> StepUpdate {
        StepUpdate {
            step_number: Some(n),
            ..Default::default()
        }
    }

    mod start {
        use super::*;

        #[test]
        fn defaults_step_to_zero() {
            let session = session();
            assert_eq!(session.current_step(), 0);
            assert_eq!(session.status(), SessionStatus::Active);
            assert!(session.flow_type().is_none());
        }

        #[test]
        fn first_response_sets_step_and_flow() {
            let mut session = session();
            session
                .apply_step(&StepUpdate {
                    step_number: Some(2),
                    flow_type: FlowType::parse("rent_inquiry"),
                    ..Default::default()
                })
                .unwrap();
            assert_eq!(session.current_step(), 2);
            assert_eq!(session.flow_type().map(FlowType::as_str), Some("rent_inquiry"));
        }

        #[test]
        fn blank_flow_type_is_absent() {
            assert!(FlowType::parse("  ").is_none());
        }
    }

    mod apply_step {
        use super::*;

        #[test]
        fn advances_step() {
            let mut session = session();
            assert_eq!(session.apply_step(&step(3)), Ok(StepOutcome::Continued));
            assert_eq!(session.current_step(), 3);
        }

        #[test]
        fn never_moves_step_backwards() {
            let mut session = session();
            session.apply_step(&step(5)).unwrap();
            session.apply_step(&step(2)).unwrap();
            assert_eq!(session.current_step(), 5);
        }

        #[test]
        fn missing_step_keeps_current() {
            let mut session = session();
            session.apply_step(&step(4)).unwrap();
            session.apply_step(&StepUpdate::default()).unwrap();
            assert_eq!(session.current_step(), 4);
        }

        #[test]
        fn updates_flow_type_only_when_present() {
            let mut session = session();
            session
                .apply_step(&StepUpdate {
                    flow_type: FlowType::parse("visit_scheduling"),
                    ..Default::default()
                })
                .unwrap();
            session.apply_step(&StepUpdate::default()).unwrap();
            assert_eq!(
                session.flow_type().map(FlowType::as_str),
                Some("visit_scheduling")
            );
        }

        #[test]
        fn is_final_completes_session() {
            let mut session = session();
            let outcome = session.apply_step(&StepUpdate {
                flags: TurnFlags {
                    is_final: true,
                    ..Default::default()
                },
                ..Default::default()
            });
            assert_eq!(outcome, Ok(StepOutcome::Completed));
            assert_eq!(session.status(), SessionStatus::Completed);
        }

        #[test]
        fn conversation_completed_completes_session() {
            let mut session = session();
            session
                .apply_step(&StepUpdate {
                    flags: TurnFlags {
                        conversation_completed: true,
                        ..Default::default()
                    },
                    ..Default::default()
                })
                .unwrap();
            assert_eq!(session.status(), SessionStatus::Completed);
        }

        #[test]
        fn restart_resets_step_and_stays_active() {
            let mut session = session();
            session.apply_step(&step(7)).unwrap();
            let outcome = session.apply_step(&StepUpdate {
                step_number: Some(9),
                flags: TurnFlags {
                    restart: true,
                    is_final: true,
                    ..Default::default()
                },
                ..Default::default()
            });
            assert_eq!(outcome, Ok(StepOutcome::Restarted));
            assert_eq!(session.current_step(), 0);
            assert_eq!(session.status(), SessionStatus::Active);
        }

        #[test]
        fn rejects_turns_after_completion() {
            let mut session = session();
            session
                .apply_step(&StepUpdate {
                    flags: TurnFlags {
                        is_final: true,
                        ..Default::default()
                    },
                    ..Default::default()
                })
                .unwrap();
            assert!(session.apply_step(&step(1)).is_err());
        }
    }

    mod escalate {
        use super::*;

        #[test]
        fn requires_completed_session() {
            let mut session = session();
            assert!(session.escalate().is_err());
            assert_eq!(session.status(), SessionStatus::Active);
        }

        #[test]
        fn escalates_completed_session() {
            let mut session = session();
            session
                .apply_step(&StepUpdate {
                    flags: TurnFlags {
                        is_final: true,
                        ..Default::default()
                    },
                    ..Default::default()
                })
                .unwrap();
            session.escalate().unwrap();
            assert_eq!(session.status(), SessionStatus::Escalated);
        }
    }
}
