//! Error types for the notepad application.
//!
//! This module defines the error taxonomy shared by the note store, the
//! persistence adapter, the backup codec and the command-line front end.

use std::io;

use thiserror::Error;

/// The main error type for the notepad application.
#[derive(Error, Debug)]
pub enum NotepadError {
    /// A mutation referenced a note id that is not in the collection.
    #[error("Note not found: {id}")]
    NotFound { id: String },

    /// Persisted or imported data is not well-formed.
    #[error("Parse failure: {message}")]
    ParseFailure { message: String },

    /// Well-formed data that does not have the expected shape.
    #[error("Invalid format: {message}")]
    InvalidFormat { message: String },

    /// Export attempted on a collection without notes.
    #[error("There are no notes to export")]
    EmptyCollection,

    /// The durable store rejected a write.
    #[error("Failed to persist {key}: {message}")]
    PersistenceWriteFailure { key: String, message: String },

    /// Errors related to file I/O operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Errors related to serialization/deserialization operations.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Errors related to configuration.
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("{message}")]
    EditorError { message: String },
}

impl NotepadError {
    /// Short, user-facing description of the outcome.
    ///
    /// The presentation layer shows this instead of the raw error detail.
    pub fn user_message(&self) -> &'static str {
        match self {
            NotepadError::NotFound { .. } => "Note not found",
            NotepadError::ParseFailure { .. } => "Could not read backup file",
            NotepadError::InvalidFormat { .. } => "Invalid backup format",
            NotepadError::EmptyCollection => "No notes to export",
            NotepadError::PersistenceWriteFailure { .. } => {
                "Could not save changes; they are kept for this session only"
            }
            NotepadError::Io(_) => "File operation failed",
            NotepadError::Serialization(_) => "Could not encode notes",
            NotepadError::ConfigError { .. } => "Invalid configuration",
            NotepadError::EditorError { .. } => "Editor failed",
        }
    }
}
