//! Data models for notehub

mod attachment;
mod note;
mod view;

pub use attachment::Attachment;
pub use note::{Note, NoteId, NoteUpdate, DEFAULT_NOTE_TITLE};
pub use view::ViewFilter;
