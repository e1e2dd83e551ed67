//! The drawing timeline: a linear undo stack of command groups.
//!
//! [`HistoryState`] is a value. Every transition consumes the old state and
//! returns the next one through [`HistoryState::reduce`]; nothing edits it
//! in place. The cursor splits the history into the visible part (up to and
//! including the cursor) and the redo buffer (everything after it).
//!
//! Applying a new group while the cursor sits before the end discards the
//! redo buffer for good. There is no branching.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::model::{CommandGroup, DrawCommand};

/// A transition of the timeline.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Truncate everything after the cursor, then append a new group and
    /// move the cursor onto it. Commands must already be validated.
    Apply {
        commands: Vec<DrawCommand>,
        prompt: String,
    },

    /// Step the cursor back. Stops at "nothing visible".
    Undo,

    /// Step the cursor forward. Stops at the last group.
    Redo,

    /// Drop the whole timeline. Saved drawings and the user flag stay.
    Clear,

    /// Replace the saved-drawings list wholesale.
    LoadSavedDrawings(Vec<CommandGroup>),

    /// Set whether a user is selected.
    SetUserIn(bool),
}

/// The timeline plus the saved-drawings list and the user flag.
///
/// Invariant: `cursor` is `None` or an index into `history`.
/// `None` means nothing is visible.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "HistoryStateParts")]
pub struct HistoryState {
    history: Vec<CommandGroup>,
    cursor: Option<usize>,
    saved_drawings: Vec<CommandGroup>,
    user_in: bool,
}

/// Unchecked serialized form, validated on the way in.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct HistoryStateParts {
    history: Vec<CommandGroup>,
    cursor: Option<usize>,
    #[serde(default)]
    saved_drawings: Vec<CommandGroup>,
    #[serde(default)]
    user_in: bool,
}

impl TryFrom<HistoryStateParts> for HistoryState {
    type Error = String;

    fn try_from(parts: HistoryStateParts) -> Result<Self, Self::Error> {
        if let Some(cursor) = parts.cursor
            && cursor >= parts.history.len()
        {
            return Err(format!(
                "cursor {cursor} is out of range for a history of {}",
                parts.history.len()
            ));
        }
        Ok(Self {
            history: parts.history,
            cursor: parts.cursor,
            saved_drawings: parts.saved_drawings,
            user_in: parts.user_in,
        })
    }
}

impl HistoryState {
    /// Applies one action, producing the next state.
    #[must_use]
    pub fn reduce(self, action: Action) -> Self {
        match action {
            Action::Apply { commands, prompt } => {
                let mut history = self.history;
                history.truncate(self.cursor.map_or(0, |i| i + 1));
                history.push(CommandGroup { prompt, commands });
                let cursor = Some(history.len() - 1);
                debug!(len = history.len(), "applied group");
                Self {
                    history,
                    cursor,
                    ..self
                }
            }
            Action::Undo => Self {
                cursor: self.cursor.and_then(|i| i.checked_sub(1)),
                ..self
            },
            Action::Redo => {
                let cursor = match self.history.len() {
                    0 => None,
                    len => Some(self.cursor.map_or(0, |i| i + 1).min(len - 1)),
                };
                Self { cursor, ..self }
            }
            Action::Clear => Self {
                history: Vec::new(),
                cursor: None,
                ..self
            },
            Action::LoadSavedDrawings(saved_drawings) => Self {
                saved_drawings,
                ..self
            },
            Action::SetUserIn(user_in) => Self { user_in, ..self },
        }
    }

    // ── Derived views ──

    /// The groups up to and including the cursor.
    pub fn visible_groups(&self) -> &[CommandGroup] {
        match self.cursor {
            Some(i) => &self.history[..=i],
            None => &[],
        }
    }

    /// The visible groups' commands, flattened in order.
    pub fn visible_commands(&self) -> Vec<DrawCommand> {
        self.visible_groups()
            .iter()
            .flat_map(|group| group.commands.iter().cloned())
            .collect()
    }

    /// The visible groups' prompts joined by newlines.
    pub fn visible_prompt_transcript(&self) -> String {
        self.visible_groups()
            .iter()
            .map(|group| group.prompt.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn can_undo(&self) -> bool {
        self.cursor.is_some()
    }

    pub fn can_redo(&self) -> bool {
        self.cursor.map_or(0, |i| i + 1) < self.history.len()
    }

    // ── Accessors ──

    pub fn history(&self) -> &[CommandGroup] {
        &self.history
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    /// The cursor as a signed index, `-1` when nothing is visible.
    pub fn current_index(&self) -> i64 {
        self.cursor
            .and_then(|i| i64::try_from(i).ok())
            .unwrap_or(-1)
    }

    pub fn saved_drawings(&self) -> &[CommandGroup] {
        &self.saved_drawings
    }

    pub fn user_in(&self) -> bool {
        self.user_in
    }
}
