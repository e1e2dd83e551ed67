//! Drawing storage: insert, load, and list saved drawings.
//!
//! Also the [`SyncGateway`] implementation the session talks to.

use jiff::Timestamp;
use rusqlite::{OptionalExtension, Row};
use tracing::{info, warn};
use uuid::Uuid;

use crate::gateway::{GatewayError, SyncGateway, USER_DRAWINGS_LIMIT};
use crate::model::{CommandGroup, DrawCommand, Drawing};
use crate::validate;

use super::{Result, Storage, StorageError};

/// Raw column values of one `drawings` row.
type DrawingRow = (String, String, String, String, i64, i64);

impl Storage {
    /// Inserts a new drawing row.
    pub fn insert_drawing(&self, drawing: &Drawing) -> Result<()> {
        self.conn.execute(
            "INSERT INTO drawings (id, user_id, prompt_text, commands_json, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            rusqlite::params![
                drawing.id.to_string(),
                drawing.user_id.to_string(),
                &drawing.prompt_text,
                &drawing.commands_json,
                drawing.created_at.as_millisecond(),
                drawing.updated_at.as_millisecond(),
            ],
        )?;
        Ok(())
    }

    /// Loads a single drawing.
    pub fn load_drawing(&self, id: Uuid) -> Result<Drawing> {
        let row = self
            .conn
            .query_row(
                "SELECT id, user_id, prompt_text, commands_json, created_at, updated_at
                 FROM drawings WHERE id = ?1",
                [id.to_string()],
                read_row,
            )
            .optional()?
            .ok_or(StorageError::DrawingNotFound(id))?;
        parse_row(row)
    }

    /// Lists a user's drawings, newest first, at most `limit`.
    ///
    /// Rows whose id or user id no longer parse are skipped.
    pub fn list_drawings_for_user(&self, user_id: Uuid, limit: usize) -> Result<Vec<Drawing>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, user_id, prompt_text, commands_json, created_at, updated_at
             FROM drawings WHERE user_id = ?1
             ORDER BY created_at DESC, rowid DESC
             LIMIT ?2",
        )?;
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = stmt.query_map(rusqlite::params![user_id.to_string(), limit], read_row)?;

        let mut drawings = Vec::new();
        for row in rows {
            match parse_row(row?) {
                Ok(drawing) => drawings.push(drawing),
                Err(e) => warn!(error = %e, "skipping unreadable drawing row"),
            }
        }
        Ok(drawings)
    }
}

impl SyncGateway for Storage {
    fn persist(
        &self,
        user_id: Uuid,
        prompt: &str,
        commands: &[DrawCommand],
    ) -> core::result::Result<Uuid, GatewayError> {
        if user_id.is_nil() {
            return Err(GatewayError::MissingUser);
        }
        let commands_json = validate::encode_for_storage(commands)?;

        let now = Timestamp::now();
        let drawing = Drawing {
            id: Uuid::new_v4(),
            user_id,
            prompt_text: prompt.to_string(),
            commands_json,
            created_at: now,
            updated_at: now,
        };
        self.insert_drawing(&drawing)
            .map_err(|e| GatewayError::SaveFailed(e.to_string()))?;

        info!(drawing_id = %drawing.id, %user_id, commands = commands.len(), "drawing saved");
        Ok(drawing.id)
    }

    fn restore(&self, drawing_id: Uuid) -> core::result::Result<CommandGroup, GatewayError> {
        if drawing_id.is_nil() {
            return Err(GatewayError::InvalidDrawingId);
        }
        let drawing = self.load_drawing(drawing_id).map_err(|e| match e {
            StorageError::DrawingNotFound(id) => GatewayError::NotFound(id),
            other => GatewayError::LoadFailed(other.to_string()),
        })?;
        Ok(validate::decode_drawing(&drawing)?)
    }

    fn restore_all_for_user(
        &self,
        user_id: Uuid,
    ) -> core::result::Result<Vec<CommandGroup>, GatewayError> {
        if user_id.is_nil() {
            return Err(GatewayError::MissingUser);
        }
        let drawings = self
            .list_drawings_for_user(user_id, USER_DRAWINGS_LIMIT)
            .map_err(|e| GatewayError::LoadFailed(e.to_string()))?;
        Ok(validate::decode_stored_list(&drawings))
    }
}

fn read_row(row: &Row<'_>) -> rusqlite::Result<DrawingRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
    ))
}

/// Converts raw column values into a [`Drawing`].
fn parse_row(
    (id, user_id, prompt_text, commands_json, created_at, updated_at): DrawingRow,
) -> Result<Drawing> {
    let id = id
        .parse::<Uuid>()
        .map_err(|e| StorageError::Corrupt(format!("invalid drawing id: {e}")))?;
    let user_id = user_id
        .parse::<Uuid>()
        .map_err(|e| StorageError::Corrupt(format!("invalid user id: {e}")))?;
    let created_at = Timestamp::from_millisecond(created_at)
        .map_err(|e| StorageError::Corrupt(format!("invalid created_at: {e}")))?;
    let updated_at = Timestamp::from_millisecond(updated_at)
        .map_err(|e| StorageError::Corrupt(format!("invalid updated_at: {e}")))?;

    Ok(Drawing {
        id,
        user_id,
        prompt_text,
        commands_json,
        created_at,
        updated_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    use tempfile::TempDir;

    use crate::validate::{MAX_STORED_CHARS, ValidationError};

    fn test_storage() -> (TempDir, Storage) {
        let dir = TempDir::new().unwrap();
        let storage = Storage::new(dir.path().join("data")).unwrap();
        (dir, storage)
    }

    fn sample_drawing(user_id: Uuid, prompt: &str, seconds: i64) -> Drawing {
        let at = Timestamp::new(seconds, 0).unwrap();
        Drawing {
            id: Uuid::new_v4(),
            user_id,
            prompt_text: prompt.into(),
            commands_json: r#"[{"type":"circle","x":1,"y":1,"radius":1}]"#.into(),
            created_at: at,
            updated_at: at,
        }
    }

    fn circle() -> DrawCommand {
        DrawCommand::Circle {
            x: 10.0,
            y: 20.0,
            radius: 5.0,
            color: "red".into(),
        }
    }

    #[test]
    fn insert_and_load_drawing() {
        let (_dir, storage) = test_storage();
        let drawing = sample_drawing(Uuid::new_v4(), "a sun", 1_700_000_000);

        storage.insert_drawing(&drawing).unwrap();
        let loaded = storage.load_drawing(drawing.id).unwrap();

        assert_eq!(loaded, drawing);
    }

    #[test]
    fn load_nonexistent_drawing_fails() {
        let (_dir, storage) = test_storage();
        let err = storage.load_drawing(Uuid::new_v4()).unwrap_err();

        assert!(matches!(err, StorageError::DrawingNotFound(_)));
    }

    #[test]
    fn list_is_newest_first_and_scoped_to_user() {
        let (_dir, storage) = test_storage();
        let user = Uuid::new_v4();

        // Insert out of order to verify sorting.
        storage
            .insert_drawing(&sample_drawing(user, "second", 2_000_000_000))
            .unwrap();
        storage
            .insert_drawing(&sample_drawing(user, "first", 1_000_000_000))
            .unwrap();
        storage
            .insert_drawing(&sample_drawing(user, "third", 3_000_000_000))
            .unwrap();
        storage
            .insert_drawing(&sample_drawing(Uuid::new_v4(), "other user", 4_000_000_000))
            .unwrap();

        let drawings = storage.list_drawings_for_user(user, 100).unwrap();
        let prompts: Vec<&str> = drawings.iter().map(|d| d.prompt_text.as_str()).collect();
        assert_eq!(prompts, vec!["third", "second", "first"]);
    }

    #[test]
    fn list_respects_limit() {
        let (_dir, storage) = test_storage();
        let user = Uuid::new_v4();
        for i in 0..5 {
            storage
                .insert_drawing(&sample_drawing(user, &format!("d{i}"), 1_000_000_000 + i))
                .unwrap();
        }

        let drawings = storage.list_drawings_for_user(user, 3).unwrap();
        assert_eq!(drawings.len(), 3);
        assert_eq!(drawings[0].prompt_text, "d4");
    }

    #[test]
    fn gateway_persist_then_restore() {
        let (_dir, storage) = test_storage();
        let user = Uuid::new_v4();

        let id = storage.persist(user, "a red dot", &[circle()]).unwrap();
        let group = storage.restore(id).unwrap();

        assert_eq!(group, CommandGroup::new("a red dot", vec![circle()]));
    }

    #[test]
    fn gateway_rejects_nil_ids() {
        let (_dir, storage) = test_storage();

        assert!(matches!(
            storage.persist(Uuid::nil(), "p", &[]),
            Err(GatewayError::MissingUser)
        ));
        assert!(matches!(
            storage.restore(Uuid::nil()),
            Err(GatewayError::InvalidDrawingId)
        ));
        assert!(matches!(
            storage.restore_all_for_user(Uuid::nil()),
            Err(GatewayError::MissingUser)
        ));
    }

    #[test]
    fn gateway_rejects_oversized_batch_before_storing() {
        let (_dir, storage) = test_storage();
        let user = Uuid::new_v4();
        let commands = vec![
            DrawCommand::Rect {
                x: 0.0,
                y: 0.0,
                width: 1.0,
                height: 1.0,
                color: "x".repeat(MAX_STORED_CHARS),
            },
        ];

        let err = storage.persist(user, "huge", &commands).unwrap_err();
        assert!(matches!(
            err,
            GatewayError::Rejected(ValidationError::PayloadTooLarge { .. })
        ));
        assert!(storage.list_drawings_for_user(user, 100).unwrap().is_empty());
    }

    #[test]
    fn gateway_restore_missing_is_not_found() {
        let (_dir, storage) = test_storage();
        let id = Uuid::new_v4();

        assert!(matches!(
            storage.restore(id),
            Err(GatewayError::NotFound(missing)) if missing == id
        ));
    }

    #[test]
    fn gateway_restore_corrupted_fails() {
        let (_dir, storage) = test_storage();
        let mut drawing = sample_drawing(Uuid::new_v4(), "broken", 1_000_000_000);
        drawing.commands_json = "{{{".into();
        storage.insert_drawing(&drawing).unwrap();

        assert!(matches!(
            storage.restore(drawing.id),
            Err(GatewayError::Rejected(ValidationError::CorruptedData(_)))
        ));
    }

    #[test]
    fn gateway_restore_all_skips_corrupted() {
        let (_dir, storage) = test_storage();
        let user = Uuid::new_v4();

        storage
            .insert_drawing(&sample_drawing(user, "oldest", 1_000_000_000))
            .unwrap();
        let mut broken = sample_drawing(user, "broken", 2_000_000_000);
        broken.commands_json = "not json".into();
        storage.insert_drawing(&broken).unwrap();
        storage
            .insert_drawing(&sample_drawing(user, "newest", 3_000_000_000))
            .unwrap();

        let groups = storage.restore_all_for_user(user).unwrap();
        let prompts: Vec<&str> = groups.iter().map(|g| g.prompt.as_str()).collect();
        assert_eq!(prompts, vec!["newest", "oldest"]);
    }
}
