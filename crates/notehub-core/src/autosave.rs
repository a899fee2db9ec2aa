//! Debounced autosave.
//!
//! Edits to a note are merged field-wise into one pending update. Each new
//! edit restarts that note's quiet-window timer; only when the timer runs out
//! is the merged update handed to the sink, so a burst of keystrokes produces
//! a single save carrying the latest value of every field.
//!
//! A save that fails goes back into the pending table underneath any edit made
//! meanwhile. It stays there without a timer until the next edit, flush or
//! cancel.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::error::Result;
use crate::models::{NoteId, NoteUpdate};
use crate::remote::NoteBackend;
use crate::session::SessionContext;
use crate::store::NoteStore;

/// Where debounced updates end up.
pub trait AutosaveSink: Clone + Send + Sync + 'static {
    /// Saves the merged update.
    fn persist(&self, id: &NoteId, update: NoteUpdate) -> impl Future<Output = Result<()>> + Send;

    /// Applies an edit locally as soon as it is scheduled.
    fn stage(&self, id: &NoteId, update: &NoteUpdate) -> impl Future<Output = ()> + Send {
        let _ = (id, update);
        async {}
    }
}

/// Sink that stages into and saves through a [`NoteStore`].
pub struct StoreSink<B> {
    store: NoteStore<B>,
    session: SessionContext,
}

impl<B> StoreSink<B> {
    pub const fn new(store: NoteStore<B>, session: SessionContext) -> Self {
        Self { store, session }
    }
}

impl<B> Clone for StoreSink<B> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            session: self.session.clone(),
        }
    }
}

impl<B: NoteBackend> AutosaveSink for StoreSink<B> {
    /// The update was staged into the store when scheduled; this sends the
    /// note's current state.
    async fn persist(&self, id: &NoteId, _update: NoteUpdate) -> Result<()> {
        self.store.save(&self.session, id).await
    }

    async fn stage(&self, id: &NoteId, update: &NoteUpdate) {
        self.store.stage_update(id, update).await;
    }
}

struct PendingSave {
    update: NoteUpdate,
    version: u64,
    timer: Option<JoinHandle<()>>,
}

#[derive(Default)]
struct SchedulerState {
    pending: HashMap<NoteId, PendingSave>,
    next_version: u64,
    last_error: Option<String>,
}

impl SchedulerState {
    fn take(&mut self, id: &NoteId) -> Option<NoteUpdate> {
        let pending = self.pending.remove(id)?;
        if let Some(timer) = pending.timer {
            timer.abort();
        }
        Some(pending.update)
    }

    /// Puts back an update whose save failed; a newer pending edit wins per field.
    fn requeue(&mut self, id: &NoteId, failed: NoteUpdate) {
        if let Some(newer) = self.pending.get_mut(id) {
            let mut update = failed;
            update.merge(std::mem::take(&mut newer.update));
            newer.update = update;
            return;
        }
        self.next_version += 1;
        let version = self.next_version;
        self.pending.insert(
            id.clone(),
            PendingSave {
                update: failed,
                version,
                timer: None,
            },
        );
    }
}

/// Per-note debounce timers in front of an [`AutosaveSink`].
pub struct AutosaveScheduler<S> {
    sink: S,
    quiet_window: Duration,
    state: Arc<Mutex<SchedulerState>>,
}

impl<S: Clone> Clone for AutosaveScheduler<S> {
    fn clone(&self) -> Self {
        Self {
            sink: self.sink.clone(),
            quiet_window: self.quiet_window,
            state: Arc::clone(&self.state),
        }
    }
}

impl<S: AutosaveSink> AutosaveScheduler<S> {
    pub fn new(sink: S, quiet_window: Duration) -> Self {
        Self {
            sink,
            quiet_window,
            state: Arc::new(Mutex::new(SchedulerState::default())),
        }
    }

    pub const fn quiet_window(&self) -> Duration {
        self.quiet_window
    }

    /// Records an edit and restarts the note's quiet window.
    pub async fn schedule(&self, id: &NoteId, update: NoteUpdate) {
        self.sink.stage(id, &update).await;

        let mut state = self.state.lock().await;
        state.next_version += 1;
        let version = state.next_version;

        let merged = match state.take(id) {
            Some(mut pending) => {
                pending.merge(update);
                pending
            }
            None => update,
        };
        let timer = tokio::spawn(self.clone().fire_after_quiet(id.clone(), version));
        state.pending.insert(
            id.clone(),
            PendingSave {
                update: merged,
                version,
                timer: Some(timer),
            },
        );
    }

    /// Saves the note's pending update now. A note with nothing pending is a no-op.
    ///
    /// On failure the update stays pending.
    pub async fn flush(&self, id: &NoteId) -> Result<()> {
        let Some(update) = self.state.lock().await.take(id) else {
            return Ok(());
        };
        self.persist_or_requeue(id, update).await
    }

    /// Saves every pending update; returns the first failure after trying all.
    pub async fn flush_all(&self) -> Result<()> {
        let pending: Vec<(NoteId, NoteUpdate)> = {
            let mut state = self.state.lock().await;
            let ids: Vec<NoteId> = state.pending.keys().cloned().collect();
            ids.into_iter()
                .filter_map(|id| state.take(&id).map(|update| (id, update)))
                .collect()
        };

        let mut first_error = None;
        for (id, update) in pending {
            if let Err(error) = self.persist_or_requeue(&id, update).await {
                tracing::error!("Autosave flush failed for note {}: {}", id, error);
                first_error.get_or_insert(error);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    async fn persist_or_requeue(&self, id: &NoteId, update: NoteUpdate) -> Result<()> {
        let result = self.sink.persist(id, update.clone()).await;
        if result.is_err() {
            self.state.lock().await.requeue(id, update);
        }
        result
    }

    /// Drops the pending update without saving it. Returns whether one existed.
    pub async fn cancel(&self, id: &NoteId) -> bool {
        self.state.lock().await.take(id).is_some()
    }

    pub async fn pending(&self, id: &NoteId) -> bool {
        self.state.lock().await.pending.contains_key(id)
    }

    /// Message of the most recent timer-driven save failure.
    pub async fn last_error(&self) -> Option<String> {
        self.state.lock().await.last_error.clone()
    }

    async fn fire_after_quiet(self, id: NoteId, version: u64) {
        tokio::time::sleep(self.quiet_window).await;

        let update = {
            let mut state = self.state.lock().await;
            // A newer edit restarted the window, or the save was flushed.
            if state.pending.get(&id).map(|pending| pending.version) != Some(version) {
                return;
            }
            state.pending.remove(&id).map(|pending| pending.update)
        };
        let Some(update) = update else {
            return;
        };

        match self.persist_or_requeue(&id, update).await {
            Ok(()) => {
                tracing::debug!("Autosaved note {}", id);
                self.state.lock().await.last_error = None;
            }
            Err(error) => {
                tracing::error!("Autosave failed for note {}: {}", id, error);
                self.state.lock().await.last_error = Some(error.to_string());
            }
        }
    }
}
