//! In-memory `NoteBackend` that records every call, for store and scheduler tests.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use crate::error::{Error, Result};
use crate::models::{Note, NoteId};
use crate::remote::{NoteBackend, NoteDetail, NoteSummary, UploadSlot};
use crate::session::SessionContext;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteCall {
    List,
    Save(Note),
    FetchFull(NoteId),
    ToggleFavorite(NoteId),
    Delete(NoteId),
    UploadSlot(String),
    UploadBytes(String),
}

#[derive(Default)]
struct FakeState {
    calls: Vec<RemoteCall>,
    listing: Vec<NoteSummary>,
    details: HashMap<NoteId, NoteDetail>,
    favorites: HashMap<NoteId, bool>,
    save_delays: VecDeque<Duration>,
    delete_delay: Option<Duration>,
    fail_saves: bool,
    fail_toggle: bool,
    fail_delete: bool,
    fail_upload_bytes: HashSet<String>,
}

#[derive(Default)]
pub struct FakeBackend {
    state: Mutex<FakeState>,
}

impl FakeBackend {
    fn lock(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }

    pub fn calls(&self) -> Vec<RemoteCall> {
        self.lock().calls.clone()
    }

    pub fn saved_notes(&self) -> Vec<Note> {
        self.lock()
            .calls
            .iter()
            .filter_map(|call| match call {
                RemoteCall::Save(note) => Some(note.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    pub fn set_listing(&self, listing: Vec<NoteSummary>) {
        self.lock().listing = listing;
    }

    pub fn set_detail(&self, id: &str, detail: NoteDetail) {
        self.lock().details.insert(NoteId::from(id), detail);
    }

    pub fn set_server_favorite(&self, id: &str, favorite: bool) {
        self.lock().favorites.insert(NoteId::from(id), favorite);
    }

    /// Each save pops one delay before it completes.
    pub fn push_save_delay(&self, delay: Duration) {
        self.lock().save_delays.push_back(delay);
    }

    pub fn set_delete_delay(&self, delay: Duration) {
        self.lock().delete_delay = Some(delay);
    }

    pub fn fail_saves(&self, fail: bool) {
        self.lock().fail_saves = fail;
    }

    pub fn fail_toggle(&self, fail: bool) {
        self.lock().fail_toggle = fail;
    }

    pub fn fail_delete(&self, fail: bool) {
        self.lock().fail_delete = fail;
    }

    pub fn fail_upload_bytes_for(&self, file_name: &str) {
        self.lock().fail_upload_bytes.insert(file_name.to_string());
    }
}

fn injected(operation: &str) -> Error {
    Error::Network(format!("injected {operation} failure"))
}

impl NoteBackend for FakeBackend {
    async fn list_notes(&self, session: &SessionContext) -> Result<Vec<NoteSummary>> {
        session.require_credential()?;
        let mut state = self.lock();
        state.calls.push(RemoteCall::List);
        Ok(state.listing.clone())
    }

    async fn save_note(&self, session: &SessionContext, note: &Note) -> Result<()> {
        session.require_credential()?;
        let delay = self.lock().save_delays.pop_front();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let mut state = self.lock();
        state.calls.push(RemoteCall::Save(note.clone()));
        if state.fail_saves {
            return Err(injected("save"));
        }
        if let Some(listed) = state.listing.iter_mut().find(|listed| listed.id == note.id) {
            listed.title.clone_from(&note.title);
            listed.updated_at = note.updated_at;
        }
        Ok(())
    }

    async fn fetch_full_note(&self, session: &SessionContext, id: &NoteId) -> Result<NoteDetail> {
        session.require_credential()?;
        let mut state = self.lock();
        state.calls.push(RemoteCall::FetchFull(id.clone()));
        state
            .details
            .get(id)
            .cloned()
            .ok_or_else(|| Error::from_status(404, "note not found"))
    }

    async fn toggle_favorite(&self, session: &SessionContext, id: &NoteId) -> Result<bool> {
        session.require_credential()?;
        let mut state = self.lock();
        state.calls.push(RemoteCall::ToggleFavorite(id.clone()));
        if state.fail_toggle {
            return Err(injected("toggle"));
        }
        let favorite = state.favorites.entry(id.clone()).or_insert(false);
        *favorite = !*favorite;
        Ok(*favorite)
    }

    async fn delete_note(&self, session: &SessionContext, id: &NoteId) -> Result<()> {
        session.require_user()?;
        session.require_credential()?;
        let delay = self.lock().delete_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let mut state = self.lock();
        state.calls.push(RemoteCall::Delete(id.clone()));
        if state.fail_delete {
            return Err(injected("delete"));
        }
        Ok(())
    }

    async fn request_upload_slot(
        &self,
        session: &SessionContext,
        note_id: &NoteId,
        file_name: &str,
        _content_type: &str,
    ) -> Result<UploadSlot> {
        session.require_credential()?;
        self.lock()
            .calls
            .push(RemoteCall::UploadSlot(file_name.to_string()));
        let storage_key = format!("uploads/{note_id}/{file_name}");
        Ok(UploadSlot {
            upload_url: format!("https://storage.invalid/{storage_key}"),
            storage_key,
            file_name: file_name.to_string(),
        })
    }

    async fn upload_bytes(&self, slot: &UploadSlot, _content_type: &str, _bytes: &[u8]) -> Result<()> {
        let mut state = self.lock();
        state
            .calls
            .push(RemoteCall::UploadBytes(slot.storage_key.clone()));
        if state.fail_upload_bytes.contains(&slot.file_name) {
            return Err(Error::from_status(403, "signature expired"));
        }
        Ok(())
    }
}
