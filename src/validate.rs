//! Command validation: untrusted text in, closed command set out.
//!
//! Two kinds of failure are kept apart:
//!
//! - Envelope failures (empty text, unparseable JSON, a top-level value that
//!   is not an array) are errors and end the operation.
//! - Element failures (unknown `type`, missing or mistyped required fields)
//!   are not errors. The element is dropped and the rest of the batch is kept.
//!
//! Optional fields are defaulted here, so nothing downstream has to handle
//! a missing color or line width.

use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use crate::model::{CommandGroup, DrawCommand, Drawing};

/// Ceiling on the serialized size of a batch headed for storage, in characters.
pub const MAX_STORED_CHARS: usize = 50_000;

/// Errors raised for malformed envelopes and oversized batches.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("AI returned empty response")]
    EmptyResponse,

    #[error("AI returned invalid JSON format: {0}")]
    InvalidFormat(#[source] serde_json::Error),

    #[error("AI response is not an array")]
    NotAnArray,

    #[error("commands data is too large: {len} characters (limit {limit})")]
    PayloadTooLarge { len: usize, limit: usize },

    #[error("drawing data is corrupted: {0}")]
    CorruptedData(#[source] serde_json::Error),

    #[error("failed to encode commands: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Validates raw AI output into a batch of commands.
///
/// Fails on the envelope: [`ValidationError::EmptyResponse`] for blank text,
/// [`ValidationError::InvalidFormat`] when the text is not JSON, and
/// [`ValidationError::NotAnArray`] when the top level is not an array.
/// Invalid elements are skipped.
pub fn validate_batch(raw: &str) -> Result<Vec<DrawCommand>, ValidationError> {
    if raw.trim().is_empty() {
        return Err(ValidationError::EmptyResponse);
    }
    let value: Value = serde_json::from_str(raw).map_err(ValidationError::InvalidFormat)?;
    decode_elements(value)
}

/// Decodes a batch read back from storage.
///
/// Same element policy as [`validate_batch`], but unparseable text is
/// [`ValidationError::CorruptedData`].
pub fn decode_stored_batch(raw: &str) -> Result<Vec<DrawCommand>, ValidationError> {
    let value: Value = serde_json::from_str(raw).map_err(ValidationError::CorruptedData)?;
    decode_elements(value)
}

/// Decodes a single stored drawing into a command group.
pub fn decode_drawing(drawing: &Drawing) -> Result<CommandGroup, ValidationError> {
    let commands = decode_stored_batch(&drawing.commands_json)?;
    Ok(CommandGroup::new(drawing.prompt_text.clone(), commands))
}

/// Decodes a list of stored drawings, skipping any that fail.
///
/// Order of the surviving drawings is preserved.
pub fn decode_stored_list(drawings: &[Drawing]) -> Vec<CommandGroup> {
    drawings
        .iter()
        .filter_map(|drawing| match decode_drawing(drawing) {
            Ok(group) => Some(group),
            Err(e) => {
                debug!(drawing_id = %drawing.id, error = %e, "skipping undecodable drawing");
                None
            }
        })
        .collect()
}

/// Serializes a batch for storage, enforcing [`MAX_STORED_CHARS`].
pub fn encode_for_storage(commands: &[DrawCommand]) -> Result<String, ValidationError> {
    let json = serde_json::to_string(commands).map_err(ValidationError::Encode)?;
    let len = json.chars().count();
    if len > MAX_STORED_CHARS {
        return Err(ValidationError::PayloadTooLarge {
            len,
            limit: MAX_STORED_CHARS,
        });
    }
    Ok(json)
}

/// Parses a drawing id typed by a user. Only syntactically valid UUIDs pass.
pub fn parse_drawing_id(text: &str) -> Option<Uuid> {
    Uuid::parse_str(text).ok()
}

/// Decodes each array element independently, keeping the ones that match a variant.
fn decode_elements(value: Value) -> Result<Vec<DrawCommand>, ValidationError> {
    let Value::Array(elements) = value else {
        return Err(ValidationError::NotAnArray);
    };

    let total = elements.len();
    let commands: Vec<DrawCommand> = elements
        .into_iter()
        .enumerate()
        .filter_map(|(index, element)| {
            serde_json::from_value::<DrawCommand>(element)
                .inspect_err(|e| debug!(index, error = %e, "dropping invalid command"))
                .ok()
        })
        .collect();

    if commands.len() < total {
        debug!(
            kept = commands.len(),
            dropped = total - commands.len(),
            "batch decoded with drops"
        );
    }
    Ok(commands)
}
