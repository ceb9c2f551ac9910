//! Backup/restore codec for portable JSON note documents.
use chrono::{DateTime, Utc};
use log::{debug, info, warn};

use crate::{Note, NotepadError, Result};

/// Serializes the whole collection into a pretty-printed JSON array.
///
/// Refuses to produce an empty backup.
pub fn export_document(notes: &[Note]) -> Result<String> {
    if notes.is_empty() {
        warn!("Refusing to export an empty collection");
        return Err(NotepadError::EmptyCollection);
    }

    let document = serde_json::to_string_pretty(notes)?;
    info!("Exported {} notes ({} bytes)", notes.len(), document.len());
    Ok(document)
}

/// Parses and validates a backup document.
///
/// Returns the notes in document order. Records whose `lastModified`
/// predates their `createdAt` are raised to `createdAt`.
pub fn parse_document(document: &str) -> Result<Vec<Note>> {
    let value: serde_json::Value =
        serde_json::from_str(document).map_err(|e| NotepadError::ParseFailure {
            message: format!("backup is not valid JSON: {}", e),
        })?;

    let records = match value {
        serde_json::Value::Array(records) => records,
        other => {
            return Err(NotepadError::InvalidFormat {
                message: format!("expected an array of notes, found {}", kind_of(&other)),
            })
        }
    };

    let mut notes = Vec::with_capacity(records.len());
    for (index, record) in records.into_iter().enumerate() {
        let mut note: Note =
            serde_json::from_value(record).map_err(|e| NotepadError::InvalidFormat {
                message: format!("entry {} is not a note: {}", index, e),
            })?;

        if note.normalize_timestamps() {
            debug!("Note {} was modified before it was created, clamping", note.id);
        }
        notes.push(note);
    }

    debug!("Parsed {} notes from backup document", notes.len());
    Ok(notes)
}

/// File name for a backup taken at `timestamp_millis`.
pub fn backup_file_name(timestamp_millis: i64) -> String {
    let date = DateTime::<Utc>::from_timestamp_millis(timestamp_millis)
        .unwrap_or_default()
        .format("%Y-%m-%d");
    format!("notepad-backup-{}.json", date)
}

fn kind_of(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}
