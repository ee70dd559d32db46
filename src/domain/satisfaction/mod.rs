//! Satisfaction and escalation sub-flow.
//!
//! Entered once a session completes. The user either confirms satisfaction
//! (closes immediately) or leaves feedback, which the dialogue service may
//! escalate to a human follow-up.

mod flow;
mod record;

pub use flow::{SatisfactionFlow, SatisfactionState, SatisfactionSubmission};
pub use record::{Feedback, SatisfactionRecord, MAX_FEEDBACK_LENGTH};
