//! Session storage: the working timeline between CLI runs.
//!
//! The snapshot is written to `session.json` after every command that
//! changes it. A missing file means there is no session yet.

use std::{fs, io};

use tracing::debug;

use crate::session::SessionSnapshot;

use super::{Result, Storage};

impl Storage {
    /// Loads the saved session, or `None` if there isn't one.
    pub fn load_session(&self) -> Result<Option<SessionSnapshot>> {
        let json = match fs::read_to_string(self.session_path()) {
            Ok(json) => json,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_str(&json)?))
    }

    /// Writes the session snapshot, replacing any previous one.
    pub fn save_session(&self, snapshot: &SessionSnapshot) -> Result<()> {
        let json = serde_json::to_string_pretty(snapshot)?;
        let path = self.session_path();
        // Write then rename: readers never see a partial file.
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &path)?;
        debug!(path = %path.display(), "session saved");
        Ok(())
    }
}
