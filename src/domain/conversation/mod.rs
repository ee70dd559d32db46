//! Conversation domain module.
//!
//! Turn state machine, append-only message log and the input-type
//! dispatcher for the rental assistant dialogue.

mod dispatch;
mod log;
mod session;
mod status;
mod turn;

pub use dispatch::{dispatch, FormatHint, InteractionMode};
pub use log::MessageLog;
pub use session::{FlowType, Session, StepOutcome, StepUpdate};
pub use status::SessionStatus;
pub use turn::{Author, InputType, ResultItem, Turn, TurnContext, TurnFlags};
pub(crate) use turn::deserialize_optional_id;

pub use crate::domain::foundation::DialogueSessionId;
