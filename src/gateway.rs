//! Sync gateway: the contract the session uses to persist and restore drawings.
//!
//! The session never talks to a store directly. It goes through this trait,
//! so the SQLite store and test doubles are interchangeable.
//!
//! Nothing behind this trait retries. A failure is reported once and ends
//! that operation.

use uuid::Uuid;

use crate::model::{CommandGroup, DrawCommand};
use crate::validate::ValidationError;

/// Most drawings returned by [`SyncGateway::restore_all_for_user`].
pub const USER_DRAWINGS_LIMIT: usize = 100;

/// Errors surfaced by a gateway operation.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("save failed: {0}")]
    SaveFailed(String),

    #[error("load failed: {0}")]
    LoadFailed(String),

    #[error("drawing not found: {0}")]
    NotFound(Uuid),

    #[error("user id is required")]
    MissingUser,

    #[error("invalid drawing id")]
    InvalidDrawingId,

    /// The batch was too large to store, or a stored batch no longer decodes.
    #[error(transparent)]
    Rejected(#[from] ValidationError),
}

/// Persistence for drawings, keyed by drawing id and user id.
pub trait SyncGateway {
    /// Stores a drawing and returns its new id.
    fn persist(
        &self,
        user_id: Uuid,
        prompt: &str,
        commands: &[DrawCommand],
    ) -> Result<Uuid, GatewayError>;

    /// Loads one drawing by id.
    fn restore(&self, drawing_id: Uuid) -> Result<CommandGroup, GatewayError>;

    /// Loads a user's drawings, newest first, at most [`USER_DRAWINGS_LIMIT`].
    ///
    /// Drawings that fail to decode are left out.
    fn restore_all_for_user(&self, user_id: Uuid) -> Result<Vec<CommandGroup>, GatewayError>;
}
