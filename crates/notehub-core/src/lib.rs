//! notehub-core - Core library for notehub
//!
//! This crate holds the note model, the remote note service client, the
//! in-memory note store with its per-note write ordering, debounced autosave,
//! and presigned attachment uploads. The `notehub` CLI is a thin layer on top.

pub mod attachments;
pub mod autosave;
pub mod config;
pub mod error;
pub mod models;
pub mod remote;
pub mod session;
pub mod store;
pub mod util;
pub mod workspace;

#[cfg(test)]
mod testing;

pub use attachments::{AttachmentUploader, UploadFile, UploadReport};
pub use autosave::{AutosaveScheduler, AutosaveSink, StoreSink};
pub use config::{AuthHeaderStyle, ClientConfig};
pub use error::{Error, Result};
pub use models::{Attachment, Note, NoteId, NoteUpdate, ViewFilter};
pub use remote::{HttpNoteBackend, NoteBackend, NoteDetail, NoteSummary, UploadSlot};
pub use session::SessionContext;
pub use store::{NoteStore, StoreSnapshot};
pub use workspace::Workspace;
