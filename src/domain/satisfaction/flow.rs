//! Satisfaction sub-flow state machine.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::record::{Feedback, SatisfactionRecord};
use crate::domain::foundation::{StateMachine, ValidationError};

/// State of the satisfaction sub-flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SatisfactionState {
    /// Waiting for satisfied / unsatisfied.
    #[default]
    AwaitingChoice,
    /// Unsatisfied; collecting feedback text.
    AwaitingFeedback,
    /// Submitted and acknowledged by the service.
    Closed,
}

impl StateMachine for SatisfactionState {
    fn can_transition_to(&self, target: &Self) -> bool {
        use SatisfactionState::*;
        matches!(
            (self, target),
            (AwaitingChoice, Closed)
                | (AwaitingChoice, AwaitingFeedback)
                // Cancel is local only
                | (AwaitingFeedback, AwaitingChoice)
                | (AwaitingFeedback, Closed)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use SatisfactionState::*;
        match self {
            AwaitingChoice => vec![AwaitingFeedback, Closed],
            AwaitingFeedback => vec![AwaitingChoice, Closed],
            Closed => vec![],
        }
    }
}

impl fmt::Display for SatisfactionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SatisfactionState::AwaitingChoice => "awaiting_choice",
            SatisfactionState::AwaitingFeedback => "awaiting_feedback",
            SatisfactionState::Closed => "closed",
        };
        write!(f, "{}", s)
    }
}

/// Payload ready to be sent to the dialogue service.
///
/// Produced without changing the flow's state; the flow only closes once
/// the service has acknowledged the submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SatisfactionSubmission {
    is_satisfied: bool,
    feedback: Option<Feedback>,
}

impl SatisfactionSubmission {
    pub fn is_satisfied(&self) -> bool {
        self.is_satisfied
    }

    /// Feedback text as sent on the wire; empty when satisfied.
    pub fn feedback_text(&self) -> &str {
        self.feedback.as_ref().map(Feedback::as_str).unwrap_or("")
    }
}

/// The satisfaction sub-flow for one completed session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SatisfactionFlow {
    state: SatisfactionState,
    record: Option<SatisfactionRecord>,
}

impl SatisfactionFlow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SatisfactionState {
        self.state
    }

    /// Set once the flow is closed.
    pub fn record(&self) -> Option<&SatisfactionRecord> {
        self.record.as_ref()
    }

    /// Prepares a satisfied submission. Feedback is always empty.
    ///
    /// # Errors
    ///
    /// - `InvalidFormat` unless awaiting the initial choice
    pub fn choose_satisfied(&self) -> Result<SatisfactionSubmission, ValidationError> {
        if self.state != SatisfactionState::AwaitingChoice {
            return Err(not_awaiting("choice", self.state));
        }
        Ok(SatisfactionSubmission {
            is_satisfied: true,
            feedback: None,
        })
    }

    /// Moves to feedback collection. Local only.
    ///
    /// # Errors
    ///
    /// - `InvalidFormat` unless awaiting the initial choice
    pub fn choose_unsatisfied(&mut self) -> Result<(), ValidationError> {
        self.state = self.state.transition_to(SatisfactionState::AwaitingFeedback)?;
        Ok(())
    }

    /// Returns to the initial choice. Local only.
    ///
    /// # Errors
    ///
    /// - `InvalidFormat` unless collecting feedback
    pub fn cancel_feedback(&mut self) -> Result<(), ValidationError> {
        self.state = self.state.transition_to(SatisfactionState::AwaitingChoice)?;
        Ok(())
    }

    /// Prepares an unsatisfied submission with validated feedback.
    ///
    /// # Errors
    ///
    /// - `InvalidFormat` unless collecting feedback
    /// - `EmptyField` if the feedback is blank
    pub fn prepare_feedback(&self, text: &str) -> Result<SatisfactionSubmission, ValidationError> {
        if self.state != SatisfactionState::AwaitingFeedback {
            return Err(not_awaiting("feedback", self.state));
        }
        let feedback = Feedback::new(text)?;
        Ok(SatisfactionSubmission {
            is_satisfied: false,
            feedback: Some(feedback),
        })
    }

    /// Closes the flow with the service's escalation verdict.
    ///
    /// # Errors
    ///
    /// - `InvalidFormat` if the submission does not match the current state
    pub fn close(
        &mut self,
        submission: SatisfactionSubmission,
        escalated: bool,
    ) -> Result<&SatisfactionRecord, ValidationError> {
        let expected = if submission.is_satisfied {
            SatisfactionState::AwaitingChoice
        } else {
            SatisfactionState::AwaitingFeedback
        };
        if self.state != expected {
            return Err(not_awaiting(
                if submission.is_satisfied { "choice" } else { "feedback" },
                self.state,
            ));
        }
        self.state = self.state.transition_to(SatisfactionState::Closed)?;
        Ok(self.record.insert(SatisfactionRecord {
            is_satisfied: submission.is_satisfied,
            feedback_text: submission.feedback_text().to_string(),
            escalated,
        }))
    }
}

fn not_awaiting(what: &str, state: SatisfactionState) -> ValidationError {
    ValidationError::invalid_format(
        "satisfaction_state",
        format!("not awaiting {} (state: {})", what, state),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    mod state_machine {
        use super::*;

        #[test]
        fn closed_is_terminal() {
            assert!(SatisfactionState::Closed.is_terminal());
            assert!(!SatisfactionState::AwaitingChoice.is_terminal());
        }

        #[test]
        fn valid_transitions_match_can_transition_to() {
            for state in [
                SatisfactionState::AwaitingChoice,
                SatisfactionState::AwaitingFeedback,
                SatisfactionState::Closed,
            ] {
                for target in state.valid_transitions() {
                    assert!(state.can_transition_to(&target));
                }
            }
        }
    }

    mod satisfied_path {
        use super::*;

        #[test]
        fn closes_without_visiting_feedback() {
            let mut flow = SatisfactionFlow::new();
            let submission = flow.choose_satisfied().unwrap();
            assert!(submission.is_satisfied());
            assert_eq!(submission.feedback_text(), "");
            assert_eq!(flow.state(), SatisfactionState::AwaitingChoice);

            let record = flow.close(submission, false).unwrap().clone();
            assert_eq!(
                record,
                SatisfactionRecord {
                    is_satisfied: true,
                    feedback_text: String::new(),
                    escalated: false,
                }
            );
            assert_eq!(flow.state(), SatisfactionState::Closed);
        }

        #[test]
        fn not_available_while_collecting_feedback() {
            let mut flow = SatisfactionFlow::new();
            flow.choose_unsatisfied().unwrap();
            assert!(flow.choose_satisfied().is_err());
        }
    }

    mod unsatisfied_path {
        use super::*;

        #[test]
        fn collects_feedback_then_closes() {
            let mut flow = SatisfactionFlow::new();
            flow.choose_unsatisfied().unwrap();
            assert_eq!(flow.state(), SatisfactionState::AwaitingFeedback);

            let submission = flow.prepare_feedback("Still lost").unwrap();
            assert!(!submission.is_satisfied());
            let record = flow.close(submission, true).unwrap();
            assert_eq!(record.feedback_text, "Still lost");
            assert!(record.escalated);
        }

        #[test]
        fn blank_feedback_is_rejected_without_state_change() {
            let mut flow = SatisfactionFlow::new();
            flow.choose_unsatisfied().unwrap();
            assert!(flow.prepare_feedback("  ").is_err());
            assert_eq!(flow.state(), SatisfactionState::AwaitingFeedback);
        }

        #[test]
        fn cancel_returns_to_choice() {
            let mut flow = SatisfactionFlow::new();
            flow.choose_unsatisfied().unwrap();
            flow.cancel_feedback().unwrap();
            assert_eq!(flow.state(), SatisfactionState::AwaitingChoice);
        }

        #[test]
        fn feedback_requires_unsatisfied_choice() {
            let flow = SatisfactionFlow::new();
            assert!(flow.prepare_feedback("text").is_err());
        }
    }

    #[test]
    fn closed_flow_rejects_everything() {
        let mut flow = SatisfactionFlow::new();
        let submission = flow.choose_satisfied().unwrap();
        flow.close(submission.clone(), false).unwrap();

        assert!(flow.choose_satisfied().is_err());
        assert!(flow.choose_unsatisfied().is_err());
        assert!(flow.cancel_feedback().is_err());
        assert!(flow.close(submission, true).is_err());
        assert!(!flow.record().unwrap().escalated);
    }
}
