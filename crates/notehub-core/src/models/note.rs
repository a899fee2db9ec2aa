//! Note model

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::attachment::Attachment;
use crate::util::unix_millis_now;

/// Title given to freshly created notes.
pub const DEFAULT_NOTE_TITLE: &str = "Untitled Note";

const PROVISIONAL_ID_PREFIX: &str = "note-";

/// Opaque note identifier.
///
/// Client-generated ids use a `note-` prefix followed by a UUID v7 so they
/// stay time-sortable and never collide; server-issued ids are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NoteId(String);

impl NoteId {
    /// Create a new provisional note ID
    #[must_use]
    pub fn generate() -> Self {
        Self(format!("{PROVISIONAL_ID_PREFIX}{}", Uuid::now_v7()))
    }

    /// Get the string representation of this ID
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for NoteId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for NoteId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A note in the system
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    /// Unique identifier
    pub id: NoteId,
    /// Note title
    pub title: String,
    /// Formatted content, stored as-is
    pub content: String,
    /// Creation timestamp (Unix ms)
    pub created_at: i64,
    /// Last update timestamp (Unix ms)
    pub updated_at: i64,
    /// Favorite flag, server-authoritative
    pub is_favorite: bool,
    /// Soft delete flag (trash)
    pub is_deleted: bool,
    /// Attachments in upload order
    pub attachments: Vec<Attachment>,
}

impl Note {
    /// Create a new untitled, empty note with a provisional id
    #[must_use]
    pub fn new() -> Self {
        Self::with_id(NoteId::generate())
    }

    /// Create a new untitled, empty note with the given id
    #[must_use]
    pub fn with_id(id: NoteId) -> Self {
        let now = unix_millis_now();
        Self {
            id,
            title: DEFAULT_NOTE_TITLE.to_string(),
            content: String::new(),
            created_at: now,
            updated_at: now,
            is_favorite: false,
            is_deleted: false,
            attachments: Vec::new(),
        }
    }

    /// Refresh `updated_at`, never moving it backwards.
    pub fn touch(&mut self, now_ms: i64) {
        self.updated_at = self.updated_at.max(now_ms);
    }

    /// Shallow-merge the provided fields and stamp `updated_at`.
    pub fn apply(&mut self, update: &NoteUpdate, now_ms: i64) {
        if let Some(title) = &update.title {
            self.title.clone_from(title);
        }
        if let Some(content) = &update.content {
            self.content.clone_from(content);
        }
        if let Some(attachments) = &update.attachments {
            self.attachments.clone_from(attachments);
        }
        self.touch(now_ms);
    }

    /// Case-insensitive substring match on title or content
    #[must_use]
    pub fn matches_query(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        query.is_empty()
            || self.title.to_lowercase().contains(&query)
            || self.content.to_lowercase().contains(&query)
    }
}

impl Default for Note {
    fn default() -> Self {
        Self::new()
    }
}

/// Partial set of editable note fields; `None` leaves the field untouched.
///
/// Favorite and trash flags are not editable here: the favorite flag changes
/// only through the server toggle and the trash flag comes from the listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachments: Option<Vec<Attachment>>,
}

impl NoteUpdate {
    #[must_use]
    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn content(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Self::default()
        }
    }

    /// Fold a newer update into this one; fields set in `newer` win.
    pub fn merge(&mut self, newer: Self) {
        if newer.title.is_some() {
            self.title = newer.title;
        }
        if newer.content.is_some() {
            self.content = newer.content;
        }
        if newer.attachments.is_some() {
            self.attachments = newer.attachments;
        }
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.content.is_none()
            && self.attachments.is_none()
    }
}
