//! In-memory note collection kept in step with the note service.
//!
//! Every mutation is applied locally first and then persisted. Persistence for
//! a given note id runs through that id's write lane: a FIFO lock that
//! serializes saves and deletes. A lane send always carries the note as it is
//! *at send time*, and is skipped when the note is gone or when its current
//! revision was already saved, so an older write can never overtake a newer
//! one and an in-flight save can never resurrect a deleted note.
//!
//! A note whose latest revision has not been saved is dirty. Refreshing from
//! the server keeps the local title, content and attachments of dirty notes
//! until a save goes through.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};

use crate::attachments::{AttachmentUploader, UploadFile, UploadReport};
use crate::error::{Error, Result};
use crate::models::{Note, NoteId, NoteUpdate, ViewFilter};
use crate::remote::{NoteBackend, NoteDetail, NoteSummary};
use crate::session::SessionContext;
use crate::util::unix_millis_now;

/// Read-only copy of the store for renderers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreSnapshot {
    pub notes: Vec<Note>,
    pub selected_note_id: Option<NoteId>,
}

impl StoreSnapshot {
    pub fn filtered(&self, filter: ViewFilter) -> Vec<&Note> {
        self.notes.iter().filter(|note| filter.includes(note)).collect()
    }

    pub fn selected_note(&self) -> Option<&Note> {
        let selected = self.selected_note_id.as_ref()?;
        self.notes.iter().find(|note| &note.id == selected)
    }
}

struct Entry {
    note: Note,
    /// Bumped on every local change that must reach the backend.
    revision: u64,
    /// Highest revision the backend has acknowledged.
    saved_revision: u64,
    /// Full content has been fetched or authored locally.
    loaded: bool,
    /// At least one save of this note has succeeded, or it came from the server.
    synced: bool,
}

impl Entry {
    const fn local(note: Note) -> Self {
        Self {
            note,
            revision: 1,
            saved_revision: 0,
            loaded: true,
            synced: false,
        }
    }

    const fn is_dirty(&self) -> bool {
        self.revision > self.saved_revision
    }
}

#[derive(Default)]
struct StoreState {
    notes: Vec<Entry>,
    selected: Option<NoteId>,
    lanes: HashMap<NoteId, Arc<Mutex<()>>>,
}

impl StoreState {
    fn entry(&self, id: &NoteId) -> Option<&Entry> {
        self.notes.iter().find(|entry| &entry.note.id == id)
    }

    fn entry_mut(&mut self, id: &NoteId) -> Option<&mut Entry> {
        self.notes.iter_mut().find(|entry| &entry.note.id == id)
    }

    fn contains(&self, id: &NoteId) -> bool {
        self.entry(id).is_some()
    }

    fn lane(&mut self, id: &NoteId) -> Arc<Mutex<()>> {
        Arc::clone(self.lanes.entry(id.clone()).or_default())
    }

    /// Drops idle lanes of notes that are no longer stored.
    fn prune_lanes(&mut self) {
        let stored: HashSet<NoteId> = self.notes.iter().map(|entry| entry.note.id.clone()).collect();
        self.lanes
            .retain(|id, lane| stored.contains(id) || Arc::strong_count(lane) > 1);
    }

    /// Drops a selection that no longer resolves to a stored note.
    fn repair_selection(&mut self) {
        if let Some(selected) = self.selected.clone() {
            if !self.contains(&selected) {
                self.selected = None;
            }
        }
    }
}

struct StoreInner<B> {
    backend: Arc<B>,
    uploader: AttachmentUploader<B>,
    state: RwLock<StoreState>,
}

/// Single source of truth for the notes of the current session.
pub struct NoteStore<B> {
    inner: Arc<StoreInner<B>>,
}

impl<B> Clone for NoteStore<B> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<B: NoteBackend> NoteStore<B> {
    pub fn new(backend: B) -> Self {
        Self::with_shared_backend(Arc::new(backend))
    }

    pub fn with_shared_backend(backend: Arc<B>) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                uploader: AttachmentUploader::new(Arc::clone(&backend)),
                backend,
                state: RwLock::new(StoreState::default()),
            }),
        }
    }

    pub fn backend(&self) -> &B {
        &self.inner.backend
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    pub async fn snapshot(&self) -> StoreSnapshot {
        let state = self.inner.state.read().await;
        StoreSnapshot {
            notes: state.notes.iter().map(|entry| entry.note.clone()).collect(),
            selected_note_id: state.selected.clone(),
        }
    }

    pub async fn get_note(&self, id: &NoteId) -> Option<Note> {
        let state = self.inner.state.read().await;
        state.entry(id).map(|entry| entry.note.clone())
    }

    pub async fn selected_note_id(&self) -> Option<NoteId> {
        self.inner.state.read().await.selected.clone()
    }

    /// Whether the note's full content is present locally.
    pub async fn is_loaded(&self, id: &NoteId) -> bool {
        let state = self.inner.state.read().await;
        state.entry(id).is_some_and(|entry| entry.loaded)
    }

    /// Notes visible under `filter`, in collection order.
    pub async fn get_filtered_notes(&self, filter: ViewFilter) -> Vec<Note> {
        let state = self.inner.state.read().await;
        state
            .notes
            .iter()
            .map(|entry| &entry.note)
            .filter(|note| filter.includes(note))
            .cloned()
            .collect()
    }

    /// `get_filtered_notes` narrowed by a case-insensitive title/content match.
    pub async fn search(&self, filter: ViewFilter, query: &str) -> Vec<Note> {
        let state = self.inner.state.read().await;
        state
            .notes
            .iter()
            .map(|entry| &entry.note)
            .filter(|note| filter.includes(note) && note.matches_query(query))
            .cloned()
            .collect()
    }

    // -----------------------------------------------------------------------
    // Selection
    // -----------------------------------------------------------------------

    /// Selects a note that is already in the store.
    pub async fn select(&self, id: &NoteId) -> Result<()> {
        let mut state = self.inner.state.write().await;
        if !state.contains(id) {
            return Err(Error::NotFound(format!("note {id}")));
        }
        state.selected = Some(id.clone());
        Ok(())
    }

    pub async fn clear_selection(&self) {
        self.inner.state.write().await.selected = None;
    }

    // -----------------------------------------------------------------------
    // Mutations
    // -----------------------------------------------------------------------

    /// Replaces the collection with the server listing.
    ///
    /// Locally created notes that have never been saved successfully are kept
    /// at the front. Dirty notes keep their unsaved fields; a summary without
    /// content keeps the locally loaded body when the local copy is at least
    /// as recent. `updated_at` never moves backwards.
    pub async fn refresh(&self, session: &SessionContext) -> Result<usize> {
        let summaries = self.inner.backend.list_notes(session).await?;
        let mut state = self.inner.state.write().await;

        let server_ids: HashSet<NoteId> = summaries.iter().map(|summary| summary.id.clone()).collect();
        let mut previous: HashMap<NoteId, Entry> = HashMap::new();
        let mut notes = Vec::with_capacity(summaries.len());
        for entry in state.notes.drain(..) {
            if !entry.synced && !server_ids.contains(&entry.note.id) {
                notes.push(entry);
            } else {
                previous.insert(entry.note.id.clone(), entry);
            }
        }

        let count = summaries.len();
        let mut seen = HashSet::new();
        for summary in summaries {
            if !seen.insert(summary.id.clone()) {
                tracing::warn!("Server listing contains duplicate note id {}", summary.id);
                continue;
            }
            let local = previous.remove(&summary.id);
            notes.push(merge_summary(summary, local));
        }

        state.notes = notes;
        state.repair_selection();
        state.prune_lanes();
        tracing::info!("Loaded {} notes from server", count);
        Ok(count)
    }

    /// Creates an untitled note, selects it, and saves it.
    ///
    /// The note is inserted and selected before the save is attempted; when
    /// the save fails the error is returned and the note stays local.
    pub async fn create_note(&self, session: &SessionContext) -> Result<Note> {
        let note = {
            let mut state = self.inner.state.write().await;
            let mut note = Note::new();
            while state.contains(&note.id) {
                note.id = NoteId::generate();
            }
            state.notes.insert(0, Entry::local(note.clone()));
            state.selected = Some(note.id.clone());
            note
        };
        tracing::info!("Created note {}", note.id);

        self.persist(session, &note.id).await?;
        Ok(note)
    }

    /// Shallow-merges `update` into the note and saves it.
    ///
    /// Unknown ids are a silent no-op; save failures are returned.
    pub async fn update_note(
        &self,
        session: &SessionContext,
        id: &NoteId,
        update: NoteUpdate,
    ) -> Result<()> {
        if !self.stage_update(id, &update).await {
            tracing::debug!("Ignoring update for unknown note {}", id);
            return Ok(());
        }
        self.persist(session, id).await
    }

    /// Applies `update` locally without saving. Returns whether the note exists.
    pub async fn stage_update(&self, id: &NoteId, update: &NoteUpdate) -> bool {
        let mut state = self.inner.state.write().await;
        let Some(entry) = state.entry_mut(id) else {
            return false;
        };
        entry.note.apply(update, unix_millis_now());
        entry.revision += 1;
        true
    }

    /// Saves the note's current local state.
    pub async fn save(&self, session: &SessionContext, id: &NoteId) -> Result<()> {
        self.persist(session, id).await
    }

    /// Deletes the note on the server, then removes it locally.
    ///
    /// The remote delete is attempted even when the id is not stored locally.
    pub async fn delete_note(&self, session: &SessionContext, id: &NoteId) -> Result<()> {
        session.require_user()?;

        let lane = self.inner.state.write().await.lane(id);
        let _lane = lane.lock().await;

        self.inner.backend.delete_note(session, id).await?;

        let mut state = self.inner.state.write().await;
        state.notes.retain(|entry| &entry.note.id != id);
        if state.selected.as_ref() == Some(id) {
            state.selected = None;
        }
        state.lanes.remove(id);
        tracing::info!("Deleted note {}", id);
        Ok(())
    }

    /// Flips the favorite flag optimistically, then adopts the server's answer.
    ///
    /// On failure the optimistic flip is reverted and the error returned.
    pub async fn toggle_favorite(&self, session: &SessionContext, id: &NoteId) -> Result<()> {
        let previous = {
            let mut state = self.inner.state.write().await;
            state.entry_mut(id).map(|entry| {
                let previous = entry.note.is_favorite;
                entry.note.is_favorite = !previous;
                entry.note.touch(unix_millis_now());
                previous
            })
        };

        match self.inner.backend.toggle_favorite(session, id).await {
            Ok(favorite) => {
                let mut state = self.inner.state.write().await;
                if let Some(entry) = state.entry_mut(id) {
                    entry.note.is_favorite = favorite;
                }
                Ok(())
            }
            Err(error) => {
                if let Some(previous) = previous {
                    let mut state = self.inner.state.write().await;
                    if let Some(entry) = state.entry_mut(id) {
                        if entry.note.is_favorite != previous {
                            entry.note.is_favorite = previous;
                        }
                    }
                    tracing::warn!("Reverted favorite toggle for note {}: {}", id, error);
                }
                Err(error)
            }
        }
    }

    /// Clears the trash flag locally. Returns whether the note exists.
    pub async fn restore_note(&self, id: &NoteId) -> bool {
        let mut state = self.inner.state.write().await;
        let Some(entry) = state.entry_mut(id) else {
            return false;
        };
        entry.note.is_deleted = false;
        entry.note.touch(unix_millis_now());
        true
    }

    /// Permanently deletes every trashed note, stopping at the first failure.
    pub async fn empty_trash(&self, session: &SessionContext) -> Result<usize> {
        let trashed: Vec<NoteId> = self
            .get_filtered_notes(ViewFilter::Trash)
            .await
            .into_iter()
            .map(|note| note.id)
            .collect();
        for id in &trashed {
            self.delete_note(session, id).await?;
        }
        Ok(trashed.len())
    }

    /// Fetches full content and selects the note.
    ///
    /// Fetched title/content/attachments overwrite an existing entry, or a new
    /// entry is inserted at the front. Selection changes only after the merge.
    pub async fn open_and_select_note(&self, session: &SessionContext, id: &NoteId) -> Result<()> {
        let detail = self.inner.backend.fetch_full_note(session, id).await?;

        let mut state = self.inner.state.write().await;
        let now = unix_millis_now();
        if let Some(entry) = state.entry_mut(id) {
            let NoteDetail {
                title,
                content,
                attachments,
            } = detail;
            entry.note.title = title;
            entry.note.content = content;
            entry.note.attachments = attachments;
            entry.note.touch(now);
            entry.loaded = true;
        } else {
            let note = Note {
                title: detail.title,
                content: detail.content,
                attachments: detail.attachments,
                ..Note::with_id(id.clone())
            };
            state.notes.insert(
                0,
                Entry {
                    note,
                    revision: 0,
                    saved_revision: 0,
                    loaded: true,
                    synced: true,
                },
            );
        }
        state.selected = Some(id.clone());
        Ok(())
    }

    /// Uploads files and appends the ones that made it to the note.
    ///
    /// Attachments are added together once every upload has finished; earlier
    /// successes are kept when a later file fails. The note is then saved.
    pub async fn add_attachments(
        &self,
        session: &SessionContext,
        id: &NoteId,
        files: Vec<UploadFile>,
    ) -> Result<UploadReport> {
        if !self.inner.state.read().await.contains(id) {
            return Err(Error::NotFound(format!("note {id}")));
        }

        let report = self.inner.uploader.upload_all(session, id, files).await;
        if report.uploaded.is_empty() {
            return Ok(report);
        }

        let applied = {
            let mut state = self.inner.state.write().await;
            match state.entry_mut(id) {
                Some(entry) => {
                    entry.note.attachments.extend(report.uploaded.iter().cloned());
                    entry.note.touch(unix_millis_now());
                    entry.revision += 1;
                    true
                }
                None => false,
            }
        };
        if applied {
            self.persist(session, id).await?;
        } else {
            tracing::warn!(
                "Note {} was removed while {} attachment(s) uploaded",
                id,
                report.uploaded.len()
            );
        }
        Ok(report)
    }

    /// Removes attachment metadata from the note and saves it.
    pub async fn remove_attachment(
        &self,
        session: &SessionContext,
        id: &NoteId,
        attachment_id: &str,
    ) -> Result<()> {
        {
            let mut state = self.inner.state.write().await;
            let entry = state
                .entry_mut(id)
                .ok_or_else(|| Error::NotFound(format!("note {id}")))?;
            let before = entry.note.attachments.len();
            entry
                .note
                .attachments
                .retain(|attachment| attachment.id != attachment_id);
            if entry.note.attachments.len() == before {
                return Err(Error::NotFound(format!("attachment {attachment_id}")));
            }
            entry.note.touch(unix_millis_now());
            entry.revision += 1;
        }
        self.persist(session, id).await
    }

    // -----------------------------------------------------------------------
    // Write lanes
    // -----------------------------------------------------------------------

    async fn persist(&self, session: &SessionContext, id: &NoteId) -> Result<()> {
        let lane = self.inner.state.write().await.lane(id);
        let _lane = lane.lock().await;

        let (note, revision) = {
            let state = self.inner.state.read().await;
            match state.entry(id) {
                Some(entry) if entry.is_dirty() => (entry.note.clone(), entry.revision),
                Some(entry) => {
                    tracing::debug!("Note {} revision {} already saved", id, entry.revision);
                    return Ok(());
                }
                None => {
                    tracing::debug!("Skipping save for removed note {}", id);
                    return Ok(());
                }
            }
        };

        self.inner.backend.save_note(session, &note).await?;

        if let Some(entry) = self.inner.state.write().await.entry_mut(id) {
            entry.saved_revision = entry.saved_revision.max(revision);
            entry.synced = true;
        }
        tracing::debug!("Saved note {} at revision {}", id, revision);
        Ok(())
    }
}

fn merge_summary(summary: NoteSummary, local: Option<Entry>) -> Entry {
    let loaded = summary.is_complete();
    let mut entry = Entry {
        revision: 0,
        saved_revision: 0,
        loaded,
        synced: true,
        note: summary.into_note(),
    };
    let Some(local) = local else {
        return entry;
    };

    entry.revision = local.revision;
    entry.saved_revision = local.saved_revision;
    let local_updated_at = local.note.updated_at;
    if local.is_dirty() {
        entry.note.title = local.note.title;
        if local.loaded {
            entry.note.content = local.note.content;
            entry.note.attachments = local.note.attachments;
            entry.loaded = true;
        }
    } else if !loaded && local.loaded && local_updated_at >= entry.note.updated_at {
        entry.note.content = local.note.content;
        if entry.note.attachments.is_empty() {
            entry.note.attachments = local.note.attachments;
        }
        entry.loaded = true;
    }
    entry.note.touch(local_updated_at);
    entry
}
