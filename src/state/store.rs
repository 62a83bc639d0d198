//! Project State Store
//!
//! Owns the live `ProjectState` and its history. Every edit enters through
//! `commit`, which validates the new document before history or observers
//! see it. View-only changes (frame/layer selection, playback ticks) go
//! through `navigate` and never add history entries.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::{debug, warn};
use tokio::sync::watch;

use crate::error::Result;
use crate::state::history::{EditAction, History, DEFAULT_HISTORY_CAPACITY};
use crate::state::project::ProjectState;

/// The single cell of record for the open document.
#[derive(Debug)]
pub struct ProjectStore {
    current: Arc<ProjectState>,
    history: History<Arc<ProjectState>>,
    notifier: watch::Sender<Arc<ProjectState>>,
}

impl Default for ProjectStore {
    fn default() -> Self {
        Self::new(ProjectState::default(), DEFAULT_HISTORY_CAPACITY)
    }
}

impl ProjectStore {
    /// Create a store around `initial` with an empty history.
    pub fn new(initial: ProjectState, history_capacity: usize) -> Self {
        let current = Arc::new(initial);
        let (notifier, _) = watch::channel(Arc::clone(&current));
        Self {
            current,
            history: History::new(history_capacity),
            notifier,
        }
    }

    /// The live document.
    pub fn state(&self) -> Arc<ProjectState> {
        Arc::clone(&self.current)
    }

    pub fn history(&self) -> &History<Arc<ProjectState>> {
        &self.history
    }

    /// Observe every change of the live document.
    pub fn subscribe(&self) -> watch::Receiver<Arc<ProjectState>> {
        self.notifier.subscribe()
    }

    /// Validate `next`, record it in history and make it live.
    ///
    /// An invalid document is rejected without touching history or the
    /// live state. The first commit into an empty history also records the
    /// document it replaces so that edit can be undone.
    pub fn commit(&mut self, action: EditAction, next: ProjectState) -> Result<Arc<ProjectState>> {
        if let Err(e) = next.validate() {
            warn!("[STORE] Rejected {}: {}", action, e);
            return Err(e);
        }

        if self.history.is_empty() {
            self.history.push(EditAction::Initial, Arc::clone(&self.current));
        }

        let next = Arc::new(next);
        self.history.push(action, Arc::clone(&next));
        self.set_current(next);
        debug!("[STORE] Committed {}", action);
        Ok(self.state())
    }

    /// Replace the live document without recording history.
    ///
    /// The snapshot under the history cursor follows the live document, so
    /// a later undo/redo pair lands back on the navigated view.
    pub fn navigate(&mut self, next: ProjectState) -> Result<()> {
        next.validate()?;
        let next = Arc::new(next);
        self.history.replace_current(Arc::clone(&next));
        self.set_current(next);
        Ok(())
    }

    /// Restore the previous snapshot. Returns false at the oldest snapshot.
    pub fn undo(&mut self) -> bool {
        match self.history.undo() {
            Some(state) => {
                let state = Arc::clone(state);
                self.set_current(state);
                true
            }
            None => {
                debug!("[STORE] Nothing to undo");
                false
            }
        }
    }

    /// Re-apply the next snapshot. Returns false at the newest snapshot.
    pub fn redo(&mut self) -> bool {
        match self.history.redo() {
            Some(state) => {
                let state = Arc::clone(state);
                self.set_current(state);
                true
            }
            None => {
                debug!("[STORE] Nothing to redo");
                false
            }
        }
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Replace the whole document (new or opened project) and forget history.
    pub fn reset(&mut self, state: ProjectState) -> Result<()> {
        state.validate()?;
        self.history.clear();
        self.set_current(Arc::new(state));
        debug!("[STORE] Reset, history cleared");
        Ok(())
    }

    fn set_current(&mut self, state: Arc<ProjectState>) {
        self.current = state;
        self.notifier.send_replace(Arc::clone(&self.current));
    }
}

/// Cloneable handle to a `ProjectStore` shared by the editor, the playback
/// task and export.
#[derive(Debug, Clone, Default)]
pub struct SharedStore(Arc<Mutex<ProjectStore>>);

impl SharedStore {
    pub fn new(store: ProjectStore) -> Self {
        Self(Arc::new(Mutex::new(store)))
    }

    /// Lock the store. A poisoned lock is recovered; the store only ever
    /// swaps whole validated snapshots, so it cannot be half-updated.
    pub fn lock(&self) -> MutexGuard<'_, ProjectStore> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `f` with exclusive access to the store.
    pub fn with<R>(&self, f: impl FnOnce(&mut ProjectStore) -> R) -> R {
        f(&mut self.lock())
    }

    /// The live document at this instant.
    pub fn state(&self) -> Arc<ProjectState> {
        self.lock().state()
    }
}
