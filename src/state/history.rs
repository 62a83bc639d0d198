//! Undo/Redo History
//!
//! A bounded, cursor-based list of state snapshots. The cursor always
//! points at the snapshot that matches the live document; undo and redo
//! only move the cursor, and pushing after an undo discards the redo branch.

use chrono::{DateTime, Utc};
use log::debug;

/// Default maximum number of snapshots kept.
pub const DEFAULT_HISTORY_CAPACITY: usize = 20;

/// Kinds of edits that create a history entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditAction {
    /// The document as it was before the first recorded edit.
    Initial,
    AddFrame,
    DeleteFrame,
    DuplicateFrame,
    ReorderFrames,
    /// Pixel data handed over by the drawing surface.
    Draw,
    /// Layer structure or attribute change.
    LayerChange,
    DynamicEffect,
    /// fps, canvas size or audio track.
    Settings,
}

impl std::fmt::Display for EditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EditAction::Initial => write!(f, "Initial"),
            EditAction::AddFrame => write!(f, "Add Frame"),
            EditAction::DeleteFrame => write!(f, "Delete Frame"),
            EditAction::DuplicateFrame => write!(f, "Duplicate Frame"),
            EditAction::ReorderFrames => write!(f, "Reorder Frames"),
            EditAction::Draw => write!(f, "Draw"),
            EditAction::LayerChange => write!(f, "Layer Change"),
            EditAction::DynamicEffect => write!(f, "Dynamic Effect"),
            EditAction::Settings => write!(f, "Settings"),
        }
    }
}

/// A single snapshot in the history.
#[derive(Debug, Clone)]
pub struct HistoryEntry<S> {
    /// What produced this snapshot.
    pub action: EditAction,

    /// When the snapshot was recorded.
    pub timestamp: DateTime<Utc>,

    /// The complete document at this point.
    pub state: S,
}

/// Bounded snapshot history with a cursor.
#[derive(Debug, Clone)]
pub struct History<S> {
    entries: Vec<HistoryEntry<S>>,

    /// Index of the live snapshot. Meaningless while `entries` is empty.
    cursor: usize,

    capacity: usize,
}

impl<S> Default for History<S> {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

impl<S> History<S> {
    /// Create an empty history holding at most `capacity` snapshots.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Vec::new(),
            cursor: 0,
            capacity: capacity.max(1),
        }
    }

    /// Record a new snapshot and make it current.
    ///
    /// Entries after the cursor are discarded first. When the history
    /// overflows, the oldest entry is evicted and the cursor shifts with it.
    /// Returns the number of entries dropped (truncated plus evicted).
    pub fn push(&mut self, action: EditAction, state: S) -> usize {
        let mut dropped = 0;

        if !self.entries.is_empty() {
            let keep = self.cursor + 1;
            dropped += self.entries.len() - keep;
            self.entries.truncate(keep);
        }

        self.entries.push(HistoryEntry {
            action,
            timestamp: Utc::now(),
            state,
        });
        self.cursor = self.entries.len() - 1;

        while self.entries.len() > self.capacity {
            self.entries.remove(0);
            self.cursor -= 1;
            dropped += 1;
        }

        debug!(
            "[HISTORY] Pushed {} ({} entries, cursor {}, {} dropped)",
            action,
            self.entries.len(),
            self.cursor,
            dropped
        );

        dropped
    }

    /// Overwrite the snapshot under the cursor without adding an entry.
    /// No-op on an empty history.
    pub fn replace_current(&mut self, state: S) {
        if let Some(entry) = self.entries.get_mut(self.cursor) {
            entry.state = state;
        }
    }

    /// Step back one snapshot. `None` when already at the oldest entry.
    pub fn undo(&mut self) -> Option<&S> {
        if !self.can_undo() {
            return None;
        }
        self.cursor -= 1;
        debug!("[HISTORY] Undo to {}", self.cursor);
        Some(&self.entries[self.cursor].state)
    }

    /// Step forward one snapshot. `None` when already at the newest entry.
    pub fn redo(&mut self) -> Option<&S> {
        if !self.can_redo() {
            return None;
        }
        self.cursor += 1;
        debug!("[HISTORY] Redo to {}", self.cursor);
        Some(&self.entries[self.cursor].state)
    }

    pub fn can_undo(&self) -> bool {
        !self.entries.is_empty() && self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        !self.entries.is_empty() && self.cursor + 1 < self.entries.len()
    }

    /// The snapshot under the cursor.
    pub fn current(&self) -> Option<&S> {
        self.entries.get(self.cursor).map(|e| &e.state)
    }

    /// The cursor position, or `None` for an empty history.
    pub fn cursor(&self) -> Option<usize> {
        (!self.entries.is_empty()).then_some(self.cursor)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn entries(&self) -> &[HistoryEntry<S>] {
        &self.entries
    }

    /// Drop every snapshot.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.cursor = 0;
    }
}
