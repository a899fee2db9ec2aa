//! Selection, view filter and autosave wiring for a single editing session.

use std::time::Duration;

use crate::autosave::{AutosaveScheduler, StoreSink};
use crate::error::{Error, Result};
use crate::models::{Note, NoteId, NoteUpdate, ViewFilter};
use crate::remote::NoteBackend;
use crate::session::SessionContext;
use crate::store::NoteStore;

/// What a note list plus editor needs: the store, the active view and the
/// autosave timers for the note being edited.
pub struct Workspace<B> {
    store: NoteStore<B>,
    session: SessionContext,
    autosave: AutosaveScheduler<StoreSink<B>>,
    filter: ViewFilter,
}

impl<B: NoteBackend> Workspace<B> {
    pub fn new(store: NoteStore<B>, session: SessionContext, quiet_window: Duration) -> Self {
        let sink = StoreSink::new(store.clone(), session.clone());
        Self {
            autosave: AutosaveScheduler::new(sink, quiet_window),
            store,
            session,
            filter: ViewFilter::default(),
        }
    }

    pub const fn store(&self) -> &NoteStore<B> {
        &self.store
    }

    pub const fn session(&self) -> &SessionContext {
        &self.session
    }

    pub const fn autosave(&self) -> &AutosaveScheduler<StoreSink<B>> {
        &self.autosave
    }

    pub const fn filter(&self) -> ViewFilter {
        self.filter
    }

    pub fn set_filter(&mut self, filter: ViewFilter) {
        if self.filter != filter {
            tracing::debug!("View filter changed to {}", filter);
        }
        self.filter = filter;
    }

    /// Notes in the active view, collection order.
    pub async fn visible_notes(&self) -> Vec<Note> {
        self.store.get_filtered_notes(self.filter).await
    }

    pub async fn search(&self, query: &str) -> Vec<Note> {
        self.store.search(self.filter, query).await
    }

    pub async fn selected_note(&self) -> Option<Note> {
        let id = self.store.selected_note_id().await?;
        self.store.get_note(&id).await
    }

    /// Loads the server listing after saving any pending edits.
    pub async fn refresh(&self) -> Result<usize> {
        self.autosave.flush_all().await?;
        self.store.refresh(&self.session).await
    }

    /// Switches the editor to `id`.
    ///
    /// Pending edits of the previously selected note are saved first; a save
    /// failure aborts the switch. Notes without full content are fetched.
    pub async fn open(&self, id: &NoteId) -> Result<()> {
        if let Some(previous) = self.store.selected_note_id().await {
            if &previous != id {
                self.autosave.flush(&previous).await?;
            }
        }

        if self.store.is_loaded(id).await {
            self.store.select(id).await
        } else {
            self.store.open_and_select_note(&self.session, id).await
        }
    }

    /// Creates a note and makes it the selected one.
    pub async fn create(&self) -> Result<Note> {
        if let Some(previous) = self.store.selected_note_id().await {
            self.autosave.flush(&previous).await?;
        }
        self.store.create_note(&self.session).await
    }

    /// Schedules an autosave of `update` on the selected note.
    pub async fn edit(&self, update: NoteUpdate) -> Result<()> {
        let id = self
            .store
            .selected_note_id()
            .await
            .ok_or_else(|| Error::Validation("No note is selected".to_string()))?;
        self.autosave.schedule(&id, update).await;
        Ok(())
    }

    /// Saves every pending edit.
    pub async fn flush(&self) -> Result<()> {
        self.autosave.flush_all().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::{NoteDetail, NoteSummary};
    use crate::testing::{FakeBackend, RemoteCall};
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    const QUIET: Duration = Duration::from_millis(500);

    fn session() -> SessionContext {
        SessionContext::new("a@example.com", "token", None)
    }

    fn workspace() -> (Workspace<FakeBackend>, Arc<FakeBackend>) {
        let backend = Arc::new(FakeBackend::default());
        let store = NoteStore::with_shared_backend(Arc::clone(&backend));
        (Workspace::new(store, session(), QUIET), backend)
    }

    fn summary(id: &str) -> NoteSummary {
        NoteSummary {
            id: NoteId::from(id),
            title: id.to_string(),
            content: None,
            created_at: 1,
            updated_at: 2,
            is_favorite: false,
            is_deleted: false,
            attachments: Vec::new(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn switching_notes_flushes_pending_edit_first() {
        let (workspace, backend) = workspace();
        let first = workspace.create().await.unwrap();
        backend.set_listing(vec![summary("remote")]);
        backend.set_detail(
            "remote",
            NoteDetail {
                title: "remote".to_string(),
                content: "full".to_string(),
                attachments: Vec::new(),
            },
        );
        backend.clear_calls();

        workspace.edit(NoteUpdate::content("typed")).await.unwrap();
        workspace.open(&NoteId::from("remote")).await.unwrap();

        let calls = backend.calls();
        assert!(matches!(&calls[0], RemoteCall::Save(note) if note.id == first.id && note.content == "typed"));
        assert_eq!(calls[1], RemoteCall::FetchFull(NoteId::from("remote")));
        assert!(!workspace.autosave().pending(&first.id).await);

        // The timer was cancelled by the flush.
        tokio::time::sleep(QUIET * 2).await;
        assert_eq!(backend.saved_notes().len(), 1);
        assert_eq!(workspace.selected_note().await.unwrap().content, "full");
    }

    #[tokio::test(start_paused = true)]
    async fn edit_that_failed_to_save_survives_refresh() {
        let (workspace, backend) = workspace();
        let note = workspace.create().await.unwrap();
        backend.set_listing(vec![summary(note.id.as_str())]);
        backend.fail_saves(true);

        workspace.edit(NoteUpdate::title("Important")).await.unwrap();
        tokio::time::sleep(QUIET * 2).await;
        assert!(workspace.autosave().last_error().await.is_some());

        // Still offline: the listing must not clobber the edit.
        assert!(workspace.refresh().await.is_err());
        workspace.store().refresh(workspace.session()).await.unwrap();
        assert_eq!(workspace.selected_note().await.unwrap().title, "Important");

        backend.fail_saves(false);
        backend.clear_calls();
        workspace.refresh().await.unwrap();

        let saved = backend.saved_notes();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].title, "Important");
        assert_eq!(workspace.selected_note().await.unwrap().title, "Important");
        assert!(!workspace.autosave().pending(&note.id).await);
    }

    #[tokio::test]
    async fn open_loaded_note_selects_without_fetch() {
        let (workspace, backend) = workspace();
        let first = workspace.create().await.unwrap();
        let second = workspace.create().await.unwrap();
        backend.clear_calls();

        workspace.open(&first.id).await.unwrap();

        assert!(backend.calls().is_empty());
        assert_eq!(workspace.selected_note().await.unwrap().id, first.id);
        assert_ne!(first.id, second.id);
    }

    #[tokio::test]
    async fn failed_open_keeps_previous_selection() {
        let (workspace, _backend) = workspace();
        let note = workspace.create().await.unwrap();

        assert!(workspace.open(&NoteId::from("missing")).await.is_err());
        assert_eq!(workspace.selected_note().await.unwrap().id, note.id);
    }

    #[tokio::test]
    async fn edit_requires_selection() {
        let (workspace, _backend) = workspace();
        assert!(matches!(
            workspace.edit(NoteUpdate::title("x")).await,
            Err(Error::Validation(_))
        ));
    }

    #[tokio::test]
    async fn filter_controls_visible_notes() {
        let (mut workspace, backend) = workspace();
        backend.set_listing(vec![
            NoteSummary {
                is_favorite: true,
                ..summary("fav")
            },
            NoteSummary {
                is_deleted: true,
                ..summary("gone")
            },
            summary("plain"),
        ]);
        workspace.refresh().await.unwrap();

        let ids = |notes: Vec<Note>| -> Vec<String> {
            notes.into_iter().map(|note| note.id.to_string()).collect()
        };
        assert_eq!(workspace.filter(), ViewFilter::All);
        assert_eq!(ids(workspace.visible_notes().await), vec!["fav", "plain"]);

        workspace.set_filter(ViewFilter::Favorites);
        assert_eq!(ids(workspace.visible_notes().await), vec!["fav"]);

        workspace.set_filter(ViewFilter::Trash);
        assert_eq!(ids(workspace.visible_notes().await), vec!["gone"]);
        assert_eq!(ids(workspace.search("pla").await), Vec::<String>::new());
    }
}
