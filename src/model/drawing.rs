//! Drawing records: what the store keeps for each save.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A saved drawing as the store holds it.
///
/// `commands_json` is opaque to the store. Its meaning belongs to
/// the validator, which decodes it back into commands on load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Drawing {
    pub id: Uuid,
    pub user_id: Uuid,
    pub prompt_text: String,
    pub commands_json: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
