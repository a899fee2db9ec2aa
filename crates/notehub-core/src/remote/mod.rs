//! Remote note service contract.
//!
//! `NoteBackend` is the seam between the note store and the cloud backend.
//! `HttpNoteBackend` is the production implementation; tests substitute an
//! in-memory fake.

use std::future::Future;

use crate::models::{Attachment, Note, NoteId};
use crate::session::SessionContext;
use crate::Result;

mod http;
mod wire;

pub use http::HttpNoteBackend;

/// Note metadata as returned by the list endpoint.
///
/// `content` is `None` when the backend only returned summary data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteSummary {
    pub id: NoteId,
    pub title: String,
    pub content: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
    pub is_favorite: bool,
    pub is_deleted: bool,
    pub attachments: Vec<Attachment>,
}

impl NoteSummary {
    /// Whether the summary already carries the full note content.
    pub const fn is_complete(&self) -> bool {
        self.content.is_some()
    }

    pub fn into_note(self) -> Note {
        Note {
            id: self.id,
            title: self.title,
            content: self.content.unwrap_or_default(),
            created_at: self.created_at,
            updated_at: self.updated_at,
            is_favorite: self.is_favorite,
            is_deleted: self.is_deleted,
            attachments: self.attachments,
        }
    }
}

/// Full note content fetched when a note is opened.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteDetail {
    pub title: String,
    pub content: String,
    pub attachments: Vec<Attachment>,
}

/// Write-capable upload locator issued by the backend.
#[derive(Clone, PartialEq, Eq)]
pub struct UploadSlot {
    /// Presigned URL the raw bytes are sent to
    pub upload_url: String,
    /// Storage key the object will live under
    pub storage_key: String,
    /// File name as recorded by the backend
    pub file_name: String,
}

impl std::fmt::Debug for UploadSlot {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("UploadSlot")
            .field("upload_url", &"[REDACTED]")
            .field("storage_key", &self.storage_key)
            .field("file_name", &self.file_name)
            .finish()
    }
}

/// Operations the note service must support.
///
/// Every call requires a live session and fails with `Error::Auth` when the
/// credential is missing, expired, or rejected.
pub trait NoteBackend: Send + Sync + 'static {
    /// Lists every note of the session's user; empty when the user has none.
    fn list_notes(
        &self,
        session: &SessionContext,
    ) -> impl Future<Output = Result<Vec<NoteSummary>>> + Send;

    /// Idempotent upsert keyed by note id.
    fn save_note(
        &self,
        session: &SessionContext,
        note: &Note,
    ) -> impl Future<Output = Result<()>> + Send;

    fn fetch_full_note(
        &self,
        session: &SessionContext,
        id: &NoteId,
    ) -> impl Future<Output = Result<NoteDetail>> + Send;

    /// Flips the favorite flag server-side and returns the new server state.
    fn toggle_favorite(
        &self,
        session: &SessionContext,
        id: &NoteId,
    ) -> impl Future<Output = Result<bool>> + Send;

    fn delete_note(
        &self,
        session: &SessionContext,
        id: &NoteId,
    ) -> impl Future<Output = Result<()>> + Send;

    fn request_upload_slot(
        &self,
        session: &SessionContext,
        note_id: &NoteId,
        file_name: &str,
        content_type: &str,
    ) -> impl Future<Output = Result<UploadSlot>> + Send;

    /// Sends raw bytes to a previously issued upload slot.
    fn upload_bytes(
        &self,
        slot: &UploadSlot,
        content_type: &str,
        bytes: &[u8],
    ) -> impl Future<Output = Result<()>> + Send;
}
