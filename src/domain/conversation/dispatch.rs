//! Input-type dispatcher.
//!
//! Maps the most recent bot turn onto the interaction mode the caller must
//! offer next. `dispatch` is a pure function of the turn's input type and
//! payload; session status is overlaid by the engine, not here.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::turn::{InputType, ResultItem, Turn};

/// Format annotation shown next to a free-text field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormatHint {
    Email,
    Phone,
}

impl fmt::Display for FormatHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatHint::Email => write!(f, "email address"),
            FormatHint::Phone => write!(f, "phone number"),
        }
    }
}

/// What the caller must collect after a bot turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum InteractionMode {
    /// Free-text entry, optionally annotated with a format hint. The engine
    /// never validates the format itself.
    FreeText { hint: Option<FormatHint> },
    /// Single-choice buttons; free text is blocked.
    Choice { options: Vec<String> },
    /// Selectable result items plus supplementary options.
    Results {
        items: Vec<ResultItem>,
        options: Vec<String>,
    },
    /// Plain text with no actionable input.
    Informational { text: Option<String> },
    /// Conversation over; only restart is offered.
    Terminal,
    /// Nothing to answer; waiting for a restart.
    Blocked,
}

impl InteractionMode {
    /// Returns true if `text` is an acceptable user response in this mode.
    pub fn accepts(&self, text: &str) -> bool {
        let text = text.trim();
        if text.is_empty() {
            return false;
        }
        match self {
            InteractionMode::FreeText { .. } | InteractionMode::Results { .. } => true,
            InteractionMode::Choice { options } => options.iter().any(|o| o == text),
            InteractionMode::Informational { .. }
            | InteractionMode::Terminal
            | InteractionMode::Blocked => false,
        }
    }

    /// Looks up a presented result item by id.
    pub fn item(&self, id: &str) -> Option<&ResultItem> {
        match self {
            InteractionMode::Results { items, .. } => items.iter().find(|i| i.id() == id),
            _ => None,
        }
    }

    /// Options the caller can present as buttons, if any.
    pub fn options(&self) -> &[String] {
        match self {
            InteractionMode::Choice { options } | InteractionMode::Results { options, .. } => {
                options
            }
            _ => &[],
        }
    }

    pub fn accepts_input(&self) -> bool {
        matches!(
            self,
            InteractionMode::FreeText { .. }
                | InteractionMode::Choice { .. }
                | InteractionMode::Results { .. }
        )
    }
}

/// Selects the interaction mode for a bot turn.
pub fn dispatch(turn: &Turn) -> InteractionMode {
    let input_type = turn.input_type();
    if input_type.is_terminal() {
        return InteractionMode::Terminal;
    }

    let options = turn.options().unwrap_or_default();
    let items = turn.items().unwrap_or_default();

    // Declared-but-empty options: show the text, offer nothing.
    if turn.options().is_some() && options.is_empty() && items.is_empty() {
        return informational(turn);
    }

    match input_type {
        InputType::Choice | InputType::TerminalChoicePrompt => {
            if options.is_empty() {
                informational(turn)
            } else {
                InteractionMode::Choice {
                    options: options.to_vec(),
                }
            }
        }
        InputType::StructuredResults => {
            if items.is_empty() && options.is_empty() {
                informational(turn)
            } else {
                InteractionMode::Results {
                    items: items.to_vec(),
                    options: options.to_vec(),
                }
            }
        }
        InputType::Email => InteractionMode::FreeText {
            hint: Some(FormatHint::Email),
        },
        InputType::Phone => InteractionMode::FreeText {
            hint: Some(FormatHint::Phone),
        },
        InputType::NoResults | InputType::Info => {
            if options.is_empty() {
                InteractionMode::FreeText { hint: None }
            } else {
                InteractionMode::Choice {
                    options: options.to_vec(),
                }
            }
        }
        InputType::FreeText => InteractionMode::FreeText { hint: None },
        InputType::Default | InputType::TerminalMessage | InputType::TerminalCompletion => {
            if turn.content().is_some() {
                InteractionMode::FreeText { hint: None }
            } else {
                InteractionMode::Blocked
            }
        }
    }
}

fn informational(turn: &Turn) -> InteractionMode {
    InteractionMode::Informational {
        text: turn.content().map(str::to_string),
    }
}
