//! Session orchestration: the layer above the history reducer.
//!
//! A [`Session`] owns a [`HistoryState`] and a reference to a gateway. It
//! turns user-level operations (draw, save, load, switch user) into reducer
//! actions and gateway calls. The reducer stays pure; side effects such as
//! clearing the timeline on a user switch live here.
//!
//! Each operation kind carries its own request sequence. Completing a
//! request whose ticket is not the latest issued for that kind is refused
//! with [`SessionError::Stale`] and leaves the state untouched, so a slow
//! response cannot overwrite a newer one.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::gateway::{GatewayError, SyncGateway};
use crate::history::{Action, HistoryState};
use crate::model::{CommandGroup, DrawCommand};
use crate::validate::{self, ValidationError};

/// The kinds of asynchronous request a session issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Generate,
    Save,
    /// Loading one drawing onto the timeline.
    LoadDrawing,
    /// Refreshing the saved-drawings list.
    LoadSaved,
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Generate => "generate",
            Self::Save => "save",
            Self::LoadDrawing => "load",
            Self::LoadSaved => "saved-list",
        })
    }
}

/// Proof that a request was issued, checked when its response arrives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    kind: RequestKind,
    seq: u64,
}

/// Latest sequence number issued per request kind.
#[derive(Debug, Default)]
struct Sequencer {
    generate: u64,
    save: u64,
    load_drawing: u64,
    load_saved: u64,
}

impl Sequencer {
    fn latest(&self, kind: RequestKind) -> u64 {
        match kind {
            RequestKind::Generate => self.generate,
            RequestKind::Save => self.save,
            RequestKind::LoadDrawing => self.load_drawing,
            RequestKind::LoadSaved => self.load_saved,
        }
    }

    fn slot(&mut self, kind: RequestKind) -> &mut u64 {
        match kind {
            RequestKind::Generate => &mut self.generate,
            RequestKind::Save => &mut self.save,
            RequestKind::LoadDrawing => &mut self.load_drawing,
            RequestKind::LoadSaved => &mut self.load_saved,
        }
    }

    fn issue(&mut self, kind: RequestKind) -> Ticket {
        let slot = self.slot(kind);
        *slot += 1;
        Ticket { kind, seq: *slot }
    }

    fn is_latest(&self, ticket: Ticket) -> bool {
        self.latest(ticket.kind) == ticket.seq
    }
}

/// Errors from session operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("a newer {0} request superseded this one")]
    Stale(RequestKind),

    #[error("no user selected")]
    NoUser,

    #[error("ticket is for a {actual} request, expected {expected}")]
    WrongTicket {
        expected: RequestKind,
        actual: RequestKind,
    },

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

pub type Result<T> = core::result::Result<T, SessionError>;

/// What survives between runs: the timeline and the selected user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub user: Option<Uuid>,
    pub state: HistoryState,
}

/// A drawing session bound to one gateway.
pub struct Session<'g, G: SyncGateway> {
    state: HistoryState,
    user: Option<Uuid>,
    gateway: &'g G,
    sequencer: Sequencer,
}

impl<'g, G: SyncGateway> Session<'g, G> {
    /// Starts an empty session.
    pub fn new(gateway: &'g G) -> Self {
        Self::resume(gateway, SessionSnapshot::default())
    }

    /// Continues from a saved snapshot.
    pub fn resume(gateway: &'g G, snapshot: SessionSnapshot) -> Self {
        Self {
            state: snapshot.state,
            user: snapshot.user,
            gateway,
            sequencer: Sequencer::default(),
        }
    }

    /// The state worth persisting.
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            user: self.user,
            state: self.state.clone(),
        }
    }

    pub fn state(&self) -> &HistoryState {
        &self.state
    }

    pub fn user(&self) -> Option<Uuid> {
        self.user
    }

    fn dispatch(&mut self, action: Action) {
        let state = std::mem::take(&mut self.state);
        self.state = state.reduce(action);
    }

    // ── Timeline ──

    pub fn undo(&mut self) {
        self.dispatch(Action::Undo);
    }

    pub fn redo(&mut self) {
        self.dispatch(Action::Redo);
    }

    pub fn clear(&mut self) {
        self.dispatch(Action::Clear);
    }

    // ── Users ──

    /// Switches the selected user.
    ///
    /// Selecting a user empties the saved-drawings list and the timeline.
    /// Deselecting only drops the user flag. Re-selecting the current user
    /// does nothing.
    pub fn select_user(&mut self, user: Option<Uuid>) {
        if user == self.user {
            return;
        }
        self.user = user;
        match user {
            Some(id) => {
                info!(user = %id, "user selected");
                self.dispatch(Action::SetUserIn(true));
                self.dispatch(Action::LoadSavedDrawings(Vec::new()));
                self.dispatch(Action::Clear);
            }
            None => {
                info!("user deselected");
                self.dispatch(Action::SetUserIn(false));
            }
        }
    }

    fn require_user(&self) -> Result<Uuid> {
        self.user.ok_or(SessionError::NoUser)
    }

    // ── Requests ──

    /// Issues a ticket for a new request of the given kind.
    ///
    /// Any ticket previously issued for the same kind becomes stale.
    pub fn begin(&mut self, kind: RequestKind) -> Ticket {
        let ticket = self.sequencer.issue(kind);
        debug!(%kind, seq = ticket.seq, "request issued");
        ticket
    }

    fn accept(&mut self, ticket: Ticket, expected: RequestKind) -> Result<()> {
        if ticket.kind != expected {
            return Err(SessionError::WrongTicket {
                expected,
                actual: ticket.kind,
            });
        }
        if !self.sequencer.is_latest(ticket) {
            warn!(kind = %ticket.kind, seq = ticket.seq, "discarding stale response");
            return Err(SessionError::Stale(ticket.kind));
        }
        Ok(())
    }

    /// Completes a generate request with the raw AI text.
    ///
    /// The text is validated; on success the batch is applied as a new group.
    pub fn complete_generate(&mut self, ticket: Ticket, prompt: &str, raw: &str) -> Result<()> {
        self.accept(ticket, RequestKind::Generate)?;
        let commands = validate::validate_batch(raw)?;
        info!(commands = commands.len(), "applying generated batch");
        self.dispatch(Action::Apply {
            commands,
            prompt: prompt.to_string(),
        });
        Ok(())
    }

    /// Validates and applies raw AI text in one step.
    pub fn generate(&mut self, prompt: &str, raw: &str) -> Result<()> {
        let ticket = self.begin(RequestKind::Generate);
        self.complete_generate(ticket, prompt, raw)
    }

    /// Completes a save request with the gateway's answer.
    ///
    /// On success the saved group is appended to the saved-drawings list.
    pub fn complete_save(
        &mut self,
        ticket: Ticket,
        saved: CommandGroup,
        outcome: core::result::Result<Uuid, GatewayError>,
    ) -> Result<Uuid> {
        self.accept(ticket, RequestKind::Save)?;
        let id = outcome?;
        let mut drawings = self.state.saved_drawings().to_vec();
        drawings.push(saved);
        self.dispatch(Action::LoadSavedDrawings(drawings));
        Ok(id)
    }

    /// Saves the visible transcript and commands for the selected user.
    pub fn save(&mut self) -> Result<Uuid> {
        let user = self.require_user()?;
        let ticket = self.begin(RequestKind::Save);
        let group = self.visible_group();
        let outcome = self.gateway.persist(user, &group.prompt, &group.commands);
        self.complete_save(ticket, group, outcome)
    }

    /// Completes a load-by-id request: the timeline is replaced by the drawing.
    pub fn complete_load(
        &mut self,
        ticket: Ticket,
        outcome: core::result::Result<CommandGroup, GatewayError>,
    ) -> Result<()> {
        self.accept(ticket, RequestKind::LoadDrawing)?;
        let group = outcome?;
        self.dispatch(Action::Clear);
        self.dispatch(Action::Apply {
            commands: group.commands,
            prompt: group.prompt,
        });
        Ok(())
    }

    /// Loads a drawing by id onto a fresh timeline.
    pub fn load(&mut self, drawing_id: Uuid) -> Result<()> {
        let ticket = self.begin(RequestKind::LoadDrawing);
        let outcome = self.gateway.restore(drawing_id);
        self.complete_load(ticket, outcome)
    }

    /// Completes a load-for-user request: the saved-drawings list is replaced.
    pub fn complete_load_for_user(
        &mut self,
        ticket: Ticket,
        outcome: core::result::Result<Vec<CommandGroup>, GatewayError>,
    ) -> Result<usize> {
        self.accept(ticket, RequestKind::LoadSaved)?;
        let groups = outcome?;
        let count = groups.len();
        self.dispatch(Action::LoadSavedDrawings(groups));
        Ok(count)
    }

    /// Refreshes the saved-drawings list from the gateway.
    pub fn load_for_user(&mut self) -> Result<usize> {
        let user = self.require_user()?;
        let ticket = self.begin(RequestKind::LoadSaved);
        let outcome = self.gateway.restore_all_for_user(user);
        self.complete_load_for_user(ticket, outcome)
    }

    /// The visible timeline as one group: joined prompts and flattened commands.
    fn visible_group(&self) -> CommandGroup {
        CommandGroup::new(
            self.state.visible_prompt_transcript(),
            self.state.visible_commands(),
        )
    }

    /// Visible commands, in paint order.
    pub fn visible_commands(&self) -> Vec<DrawCommand> {
        self.state.visible_commands()
    }
}
