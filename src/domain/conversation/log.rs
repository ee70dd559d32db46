//! Append-only message log.

use serde::{Deserialize, Serialize};

use super::turn::Turn;

/// Ordered sequence of turns for one widget activation.
///
/// The only mutation is `append`; turns are never edited or removed, and the
/// log survives session restarts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageLog {
    turns: Vec<Turn>,
}

impl MessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a turn to the end of the log.
    pub fn append(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    /// Most recent bot turn; the dispatcher reads this one.
    pub fn last_bot_turn(&self) -> Option<&Turn> {
        self.turns.iter().rev().find(|t| t.is_bot())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Turn> {
        self.turns.iter()
    }
}

impl<'a> IntoIterator for &'a MessageLog {
    type Item = &'a Turn;
    type IntoIter = std::slice::Iter<'a, Turn>;

    fn into_iter(self) -> Self::IntoIter {
        self.turns.iter()
    }
}
