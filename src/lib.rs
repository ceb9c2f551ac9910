//! Offline note-taking library
//!
//! This library holds the note collection state manager: an in-memory list
//! of notes and a user profile, written through to a durable key-value store
//! after every change, plus the filtered/sorted view and JSON backups.

mod backup;
mod cli;
mod config;
mod errors;
mod helper;
mod note;
mod storage;
mod store;
mod types;
mod view;

// Re-export key components
pub use backup::*;
pub use cli::*;
pub use config::*;
pub use errors::*;
pub use helper::*;
pub use note::*;
pub use storage::*;
pub use store::*;
pub use types::*;
pub use view::project;
