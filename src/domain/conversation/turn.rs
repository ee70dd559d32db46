//! Turn entity for the assistant conversation.
//!
//! Turns are immutable records of one bot or user message. Bot turns carry
//! the input-type discriminator declared by the dialogue service plus the
//! structured payload (options, result items, flags) the dispatcher reads.

use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use crate::domain::foundation::{Timestamp, TurnId, ValidationError};

/// Who authored a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Author {
    Bot,
    User,
}

/// Input-type discriminator declared by the dialogue service on a bot turn.
///
/// Closed set with a single fallback arm; unknown wire strings map to
/// `Default` rather than failing deserialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum InputType {
    FreeText,
    Choice,
    Email,
    Phone,
    StructuredResults,
    NoResults,
    Info,
    TerminalChoicePrompt,
    TerminalMessage,
    TerminalCompletion,
    #[default]
    Default,
}

impl InputType {
    /// Parses the service's wire value.
    pub fn from_wire(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "free_text" | "text" => Self::FreeText,
            "choice" | "options" => Self::Choice,
            "email" => Self::Email,
            "phone" => Self::Phone,
            "structured_results" | "property_results" | "property_browse" => {
                Self::StructuredResults
            }
            "no_results" | "property_search_no_results" => Self::NoResults,
            "info" => Self::Info,
            "terminal_choice_prompt" => Self::TerminalChoicePrompt,
            "terminal_message" => Self::TerminalMessage,
            "terminal_completion" => Self::TerminalCompletion,
            _ => Self::Default,
        }
    }

    /// Canonical wire value.
    pub fn as_wire(&self) -> &'static str {
        match self {
            Self::FreeText => "free_text",
            Self::Choice => "choice",
            Self::Email => "email",
            Self::Phone => "phone",
            Self::StructuredResults => "structured_results",
            Self::NoResults => "no_results",
            Self::Info => "info",
            Self::TerminalChoicePrompt => "terminal_choice_prompt",
            Self::TerminalMessage => "terminal_message",
            Self::TerminalCompletion => "terminal_completion",
            Self::Default => "default",
        }
    }

    /// Returns true for input types after which no further input is accepted.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::TerminalMessage | Self::TerminalCompletion)
    }
}

impl From<String> for InputType {
    fn from(value: String) -> Self {
        Self::from_wire(&value)
    }
}

impl From<InputType> for String {
    fn from(value: InputType) -> Self {
        value.as_wire().to_string()
    }
}

impl fmt::Display for InputType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_wire())
    }
}

/// Independent completion/control flags carried by a bot turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TurnFlags {
    pub is_final: bool,
    pub conversation_completed: bool,
    pub contact_submitted: bool,
    pub restart: bool,
}

impl TurnFlags {
    /// Either completion signal ends the session.
    pub fn ends_session(&self) -> bool {
        self.is_final || self.conversation_completed
    }
}

/// A structured result entity (e.g. a listing summary).
///
/// `id` is sent verbatim as the next user input when the item is selected.
/// All other attributes are kept as the service sent them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawResultItem")]
pub struct ResultItem {
    id: String,
    #[serde(flatten)]
    attributes: Map<String, Value>,
}

#[derive(Deserialize)]
struct RawResultItem {
    id: Value,
    #[serde(flatten)]
    attributes: Map<String, Value>,
}

impl TryFrom<RawResultItem> for ResultItem {
    type Error = ValidationError;

    fn try_from(raw: RawResultItem) -> Result<Self, Self::Error> {
        let id = id_from_value(raw.id).map_err(|other| {
            ValidationError::invalid_format(
                "id",
                format!("expected string or number, got {}", other),
            )
        })?;
        Self::new(id, raw.attributes)
    }
}

/// Property ids arrive as strings or numbers; both become strings.
fn id_from_value(value: Value) -> Result<String, Value> {
    match value {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(other),
    }
}

/// `deserialize_with` helper for optional string-or-number ids.
pub(crate) fn deserialize_optional_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(value) => id_from_value(value).map(Some).map_err(|other| {
            de::Error::custom(format!("expected string or number id, got {}", other))
        }),
    }
}

impl ResultItem {
    /// Creates a result item.
    ///
    /// # Errors
    ///
    /// - `EmptyField` if the id is blank
    pub fn new(id: impl Into<String>, attributes: Map<String, Value>) -> Result<Self, ValidationError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(ValidationError::empty_field("id"));
        }
        Ok(Self { id, attributes })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn attributes(&self) -> &Map<String, Value> {
        &self.attributes
    }

    /// Returns a string attribute, if present.
    pub fn attribute_str(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).and_then(Value::as_str)
    }
}

/// Extra context the service attaches to a bot turn.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TurnContext {
    pub search_keyword: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_id")]
    pub selected_property_id: Option<String>,
}

impl TurnContext {
    pub fn is_empty(&self) -> bool {
        self.search_keyword.is_none() && self.selected_property_id.is_none()
    }
}

/// An immutable turn in the conversation.
///
/// # Invariants
///
/// - `id` is locally unique and time-ordered
/// - user turns always have non-blank content
/// - `options` is only present on choice-shaped turns, `items` only on
///   result-shaped turns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    id: TurnId,
    author: Author,
    step_number: u32,
    input_type: InputType,
    content: Option<String>,
    options: Option<Vec<String>>,
    items: Option<Vec<ResultItem>>,
    flags: TurnFlags,
    #[serde(default, skip_serializing_if = "TurnContext::is_empty")]
    context: TurnContext,
    created_at: Timestamp,
}

impl Turn {
    /// Creates a user turn answering a prompt of the given input type.
    ///
    /// # Errors
    ///
    /// - `EmptyField` if content is blank
    pub fn user(
        step_number: u32,
        input_type: InputType,
        content: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let content = content.into();
        if content.trim().is_empty() {
            return Err(ValidationError::empty_field("content"));
        }
        Ok(Self {
            id: TurnId::new(),
            author: Author::User,
            step_number,
            input_type,
            content: Some(content),
            options: None,
            items: None,
            flags: TurnFlags::default(),
            context: TurnContext::default(),
            created_at: Timestamp::now(),
        })
    }

    /// Creates a bot turn. Payload is attached with the `with_*` builders
    /// before the turn is appended to the log.
    pub fn bot(step_number: u32, input_type: InputType, content: Option<String>) -> Self {
        Self {
            id: TurnId::new(),
            author: Author::Bot,
            step_number,
            input_type,
            content: content.filter(|c| !c.trim().is_empty()),
            options: None,
            items: None,
            flags: TurnFlags::default(),
            context: TurnContext::default(),
            created_at: Timestamp::now(),
        }
    }

    pub fn with_options(mut self, options: Option<Vec<String>>) -> Self {
        self.options = options;
        self
    }

    pub fn with_items(mut self, items: Option<Vec<ResultItem>>) -> Self {
        self.items = items;
        self
    }

    pub fn with_flags(mut self, flags: TurnFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn with_context(mut self, context: TurnContext) -> Self {
        self.context = context;
        self
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────────

    pub fn id(&self) -> &TurnId {
        &self.id
    }

    pub fn author(&self) -> Author {
        self.author
    }

    pub fn step_number(&self) -> u32 {
        self.step_number
    }

    pub fn input_type(&self) -> InputType {
        self.input_type
    }

    pub fn content(&self) -> Option<&str> {
        self.content.as_deref()
    }

    /// Options as declared; `Some(empty)` differs from `None` for the dispatcher.
    pub fn options(&self) -> Option<&[String]> {
        self.options.as_deref()
    }

    pub fn items(&self) -> Option<&[ResultItem]> {
        self.items.as_deref()
    }

    pub fn flags(&self) -> TurnFlags {
        self.flags
    }

    pub fn context(&self) -> &TurnContext {
        &self.context
    }

    pub fn created_at(&self) -> &Timestamp {
        &self.created_at
    }

    pub fn is_bot(&self) -> bool {
        self.author == Author::Bot
    }

    pub fn is_user(&self) -> bool {
        self.author == Author::User
    }
}
