//! Core data structures for the notepad application.
//!
//! This module contains the persisted records: `Note`, its palette `NoteColor`
//! and the single `UserProfile`.
use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize};

/// Display name used when the profile has no name.
pub const DEFAULT_PROFILE_NAME: &str = "Guest";

/// Title shown for notes whose title is empty.
pub const UNTITLED: &str = "Untitled";

/// Represents a single note in our system
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    /// Unique identifier for the note
    pub id: String,
    /// Note title, may be empty
    #[serde(default)]
    pub title: String,
    /// Note body, may be empty
    #[serde(default)]
    pub content: String,
    /// Pinned notes are listed before everything else
    #[serde(default)]
    pub is_pinned: bool,
    /// Creation time in milliseconds since the Unix epoch
    pub created_at: i64,
    /// Last edit time in milliseconds since the Unix epoch
    pub last_modified: i64,
    /// Optional palette tag
    #[serde(default, deserialize_with = "lenient_color")]
    pub color: Option<NoteColor>,
}

impl Note {
    /// Creates an empty note stamped with `now` for both timestamps.
    pub fn new(id: String, now: i64) -> Self {
        Note {
            id,
            title: String::new(),
            content: String::new(),
            is_pinned: false,
            created_at: now,
            last_modified: now,
            color: None,
        }
    }

    /// Raises `last_modified` to `created_at` if it predates it.
    ///
    /// Returns whether the note was changed.
    pub fn normalize_timestamps(&mut self) -> bool {
        if self.last_modified < self.created_at {
            self.last_modified = self.created_at;
            true
        } else {
            false
        }
    }

    /// Title as it should be displayed.
    pub fn display_title(&self) -> &str {
        if self.title.trim().is_empty() {
            UNTITLED
        } else {
            &self.title
        }
    }

    /// Case-insensitive substring match against title and content.
    ///
    /// `needle` must already be lower-cased.
    pub(crate) fn matches_lowercase(&self, needle: &str) -> bool {
        needle.is_empty()
            || self.title.to_lowercase().contains(needle)
            || self.content.to_lowercase().contains(needle)
    }
}

/// Fixed palette of note colors. Purely cosmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoteColor {
    Yellow,
    Green,
    Blue,
    Pink,
    Purple,
    Orange,
    Gray,
}

impl NoteColor {
    pub const ALL: [NoteColor; 7] = [
        NoteColor::Yellow,
        NoteColor::Green,
        NoteColor::Blue,
        NoteColor::Pink,
        NoteColor::Purple,
        NoteColor::Orange,
        NoteColor::Gray,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            NoteColor::Yellow => "yellow",
            NoteColor::Green => "green",
            NoteColor::Blue => "blue",
            NoteColor::Pink => "pink",
            NoteColor::Purple => "purple",
            NoteColor::Orange => "orange",
            NoteColor::Gray => "gray",
        }
    }
}

impl fmt::Display for NoteColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NoteColor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        NoteColor::ALL
            .into_iter()
            .find(|color| color.as_str() == wanted)
            .ok_or_else(|| {
                let names: Vec<&str> = NoteColor::ALL.iter().map(|c| c.as_str()).collect();
                format!("unknown color '{}', expected one of: {}", s, names.join(", "))
            })
    }
}

// Colors outside the palette are dropped rather than failing the whole record.
fn lenient_color<'de, D>(deserializer: D) -> Result<Option<NoteColor>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<serde_json::Value> = Option::deserialize(deserializer)?;
    Ok(match raw {
        Some(serde_json::Value::String(name)) => name.parse().ok(),
        _ => None,
    })
}

/// The single local user profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Display name, never blank once normalized
    #[serde(default)]
    pub name: String,
    /// Embedded image data (usually a data URL)
    #[serde(default)]
    pub avatar: Option<String>,
}

impl UserProfile {
    /// Replaces a blank name with the default one.
    pub fn normalized(mut self) -> Self {
        if self.name.trim().is_empty() {
            self.name = DEFAULT_PROFILE_NAME.to_string();
        }
        self
    }
}

impl Default for UserProfile {
    fn default() -> Self {
        UserProfile {
            name: DEFAULT_PROFILE_NAME.to_string(),
            avatar: None,
        }
    }
}
