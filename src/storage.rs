//! Local persistence for drawings and the working session.
//!
//! Everything lives under one data directory:
//!
//! ```text
//! <root>/
//!   drawings.sqlite   # Saved drawings, one row per save
//!   session.json      # The current timeline, cursor, and selected user
//! ```

mod drawing;
mod session;

use std::{fs, io, path::PathBuf};

use rusqlite::Connection;
use uuid::Uuid;

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("drawing not found: {0}")]
    DrawingNotFound(Uuid),

    #[error("corrupt storage: {0}")]
    Corrupt(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

pub type Result<T> = core::result::Result<T, StorageError>;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS drawings (
        id            TEXT PRIMARY KEY,
        user_id       TEXT NOT NULL,
        prompt_text   TEXT NOT NULL,
        commands_json TEXT NOT NULL,
        created_at    INTEGER NOT NULL,
        updated_at    INTEGER NOT NULL
    );
    CREATE INDEX IF NOT EXISTS drawings_by_user ON drawings (user_id, created_at);
";

/// Local `SQLite` and file-based storage.
pub struct Storage {
    root: PathBuf,
    conn: Connection,
}

impl Storage {
    /// Opens storage rooted at the given directory.
    ///
    /// The directory and the drawings table are created if missing.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        let conn = Connection::open(root.join("drawings.sqlite"))?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { root, conn })
    }

    /// Returns the default storage root: `~/.drawbot/data/`.
    pub fn default_root() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".drawbot").join("data"))
    }

    fn session_path(&self) -> PathBuf {
        self.root.join("session.json")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use tempfile::TempDir;

    #[test]
    fn creates_root_and_database() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("nested").join("data");

        let _storage = Storage::new(&root).unwrap();

        assert!(root.join("drawings.sqlite").is_file());
    }

    #[test]
    fn reopening_keeps_existing_schema() {
        let dir = TempDir::new().unwrap();
        drop(Storage::new(dir.path()).unwrap());
        Storage::new(dir.path()).unwrap();
    }
}
