//! Shared types for the notepad application.
//!
//! This module contains the request/response types used by the note store,
//! the sort options of the view projection and the CLI command set.
use std::{fmt, path::PathBuf, str::FromStr};

use clap::Subcommand;
use serde::{Deserialize, Serialize};

use crate::{NoteColor, NotepadError};

/// A specialized Result type for notepad operations.
pub type Result<T> = std::result::Result<T, NotepadError>;

/// Ordering applied inside the pinned and unpinned partitions of the view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortOption {
    /// `createdAt` descending
    #[default]
    #[serde(rename = "newest")]
    CreatedNewest,
    /// `createdAt` ascending
    #[serde(rename = "oldest")]
    CreatedOldest,
    /// `lastModified` descending
    #[serde(rename = "modified")]
    ModifiedRecent,
    /// Title ascending, case-aware
    #[serde(rename = "title")]
    AlphabeticalTitle,
}

impl SortOption {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOption::CreatedNewest => "newest",
            SortOption::CreatedOldest => "oldest",
            SortOption::ModifiedRecent => "modified",
            SortOption::AlphabeticalTitle => "title",
        }
    }
}

impl fmt::Display for SortOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortOption {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "newest" => Ok(SortOption::CreatedNewest),
            "oldest" => Ok(SortOption::CreatedOldest),
            "modified" => Ok(SortOption::ModifiedRecent),
            "title" => Ok(SortOption::AlphabeticalTitle),
            other => Err(format!(
                "unknown sort option '{}', expected newest, oldest, modified or title",
                other
            )),
        }
    }
}

/// Partial update applied by `NoteStore::update`.
///
/// `None` leaves a field unchanged. For `color`, `Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteChanges {
    pub title: Option<String>,
    pub content: Option<String>,
    pub is_pinned: Option<bool>,
    pub color: Option<Option<NoteColor>>,
}

impl NoteChanges {
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn pinned(mut self, pinned: bool) -> Self {
        self.is_pinned = Some(pinned);
        self
    }

    pub fn color(mut self, color: Option<NoteColor>) -> Self {
        self.color = Some(color);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.content.is_none()
            && self.is_pinned.is_none()
            && self.color.is_none()
    }
}

/// Partial update applied by `NoteStore::set_profile`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileChanges {
    pub name: Option<String>,
    /// `Some(None)` removes the avatar
    pub avatar: Option<Option<String>>,
}

/// Summary of an import operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportSummary {
    /// Number of notes prepended from the document
    pub imported: usize,
    /// Collection size after the import
    pub total: usize,
}

/// Change notification delivered to store subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    Created { id: String },
    Updated { id: String },
    Deleted { id: String },
    PinToggled { id: String, pinned: bool },
    Imported { count: usize },
    Cleared,
    ProfileChanged,
    ViewChanged,
}

/// Available subcommands for the notepad application
#[derive(Subcommand)]
pub enum Commands {
    /// Create a new note
    New {
        /// Title of the note
        #[clap(short = 'T', long)]
        title: Option<String>,

        /// Content of the note
        #[clap(short, long)]
        content: Option<String>,

        /// Palette color for the note
        #[clap(long)]
        color: Option<NoteColor>,

        /// Pin the note right away
        #[clap(short, long)]
        pin: bool,

        /// Write the content in the configured editor
        #[clap(short, long)]
        editor: bool,
    },

    /// Edit an existing note
    Edit {
        /// ID of the note to edit
        id: String,

        /// New title for the note
        #[clap(short = 'T', long)]
        title: Option<String>,

        /// New content for the note
        #[clap(short, long)]
        content: Option<String>,

        /// New palette color
        #[clap(long, conflicts_with = "no_color")]
        color: Option<NoteColor>,

        /// Remove the color tag
        #[clap(long)]
        no_color: bool,

        /// Edit the content in the configured editor
        #[clap(short, long)]
        editor: bool,
    },

    /// Delete a note by ID
    Delete {
        /// ID of the note to delete
        id: String,
    },

    /// Pin or unpin a note
    Pin {
        /// ID of the note to toggle
        id: String,
    },

    /// List notes, pinned first
    List {
        /// Only show notes whose title or content contains this text
        #[clap(short, long)]
        search: Option<String>,

        /// Sort order: newest, oldest, modified or title
        #[clap(long)]
        sort: Option<SortOption>,

        /// Format output as JSON
        #[clap(short, long)]
        json: bool,

        /// Print full note content
        #[clap(short, long)]
        detailed: bool,
    },

    /// Show a single note
    Show {
        /// ID of the note to show
        id: String,

        /// Format output as raw JSON
        #[clap(short, long)]
        json: bool,
    },

    /// Export all notes to a JSON backup file
    Export {
        /// Path for the backup file (defaults to the export directory)
        #[clap(short, long)]
        output: Option<PathBuf>,
    },

    /// Import notes from a JSON backup file
    Import {
        /// Path to the backup file
        backup_file: PathBuf,

        /// Skip confirmation prompt
        #[clap(short, long)]
        force: bool,
    },

    /// Delete every note and reset the profile
    Clear {
        /// Skip confirmation prompt
        #[clap(short, long)]
        force: bool,
    },

    /// Show or change the local profile
    Profile {
        /// New display name
        #[clap(short, long)]
        name: Option<String>,

        /// Image file to use as avatar
        #[clap(short, long, conflicts_with = "clear_avatar")]
        avatar: Option<PathBuf>,

        /// Remove the avatar
        #[clap(long)]
        clear_avatar: bool,
    },

    /// Configuration management
    Config {
        /// Show current configuration
        #[clap(short = 'S', long)]
        show: bool,

        /// Update a configuration setting (key=value)
        #[clap(short, long)]
        set: Option<String>,

        /// Reset configuration to defaults
        #[clap(short, long)]
        reset: bool,
    },
}
