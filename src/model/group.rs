//! Command groups: one prompt's worth of commands.

use serde::{Deserialize, Serialize};

use super::DrawCommand;

/// One atomic timeline entry: the prompt and the commands it produced.
///
/// Created once per AI round-trip or loaded save, never edited afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandGroup {
    pub prompt: String,
    pub commands: Vec<DrawCommand>,
}

impl CommandGroup {
    pub fn new(prompt: impl Into<String>, commands: Vec<DrawCommand>) -> Self {
        Self {
            prompt: prompt.into(),
            commands,
        }
    }
}
