//! # Undo/Redo History
//!
//! Snapshot-based history over any cloneable state.
//!
//! ```text
//! past: [s0, s1]   present: s2   future: [s3]
//!
//! undo  -> past: [s0]       present: s1   future: [s2, s3]
//! redo  -> past: [s0, s1]   present: s2   future: [s3]
//! record(s4) -> past: [s0, s1, s2]   present: s4   future: []
//! ```

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

/// Logical state of a history, as shown by undo/redo buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum HistoryStatus {
    /// Nothing to undo or redo.
    Clean,
    /// At least one undo step is available.
    HasUndo,
    /// Only redo steps are available.
    HasRedo,
}

/// Past, present and future snapshots of a state.
///
/// All transitions consume the history and return the next one, so a session
/// installs the result as its new current value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct History<T> {
    past: VecDeque<T>,
    present: T,
    future: VecDeque<T>,
    #[serde(default)]
    limit: usize,
}

impl<T> History<T> {
    /// Start a history with no past or future.
    #[must_use]
    pub fn new(initial: T) -> Self {
        Self::with_limit(initial, 0)
    }

    /// Start a history that keeps at most `limit` undo steps (0 = unbounded).
    #[must_use]
    pub fn with_limit(initial: T, limit: usize) -> Self {
        Self {
            past: VecDeque::new(),
            present: initial,
            future: VecDeque::new(),
            limit,
        }
    }

    /// Commit a new present. The future is discarded.
    #[must_use]
    pub fn record(mut self, present: T) -> Self {
        let previous = std::mem::replace(&mut self.present, present);
        self.past.push_back(previous);
        if self.limit > 0 {
            while self.past.len() > self.limit {
                self.past.pop_front();
            }
        }
        self.future.clear();
        tracing::debug!("History recorded, {} undo steps", self.past.len());
        self
    }

    /// Step back. No-op when there is nothing to undo.
    #[must_use]
    pub fn undo(mut self) -> Self {
        if let Some(previous) = self.past.pop_back() {
            let current = std::mem::replace(&mut self.present, previous);
            self.future.push_front(current);
            tracing::debug!("Undo, {} steps left", self.past.len());
        }
        self
    }

    /// Step forward. No-op when there is nothing to redo.
    #[must_use]
    pub fn redo(mut self) -> Self {
        if let Some(next) = self.future.pop_front() {
            let current = std::mem::replace(&mut self.present, next);
            self.past.push_back(current);
            tracing::debug!("Redo, {} steps left", self.future.len());
        }
        self
    }

    /// The current state.
    #[must_use]
    pub const fn present(&self) -> &T {
        &self.present
    }

    /// Consume the history, returning the current state.
    #[must_use]
    pub fn into_present(self) -> T {
        self.present
    }

    /// Earlier states, oldest first.
    #[must_use]
    pub fn past(&self) -> impl Iterator<Item = &T> {
        self.past.iter()
    }

    /// Undone states, next redo first.
    #[must_use]
    pub fn future(&self) -> impl Iterator<Item = &T> {
        self.future.iter()
    }

    /// Number of undo steps.
    #[must_use]
    pub fn len_past(&self) -> usize {
        self.past.len()
    }

    /// Number of redo steps.
    #[must_use]
    pub fn len_future(&self) -> usize {
        self.future.len()
    }

    /// Whether an undo step exists.
    #[must_use]
    pub fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    /// Whether a redo step exists.
    #[must_use]
    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    /// Retention cap (0 = unbounded).
    #[must_use]
    pub const fn limit(&self) -> usize {
        self.limit
    }

    /// Current logical state. `HasUndo` wins when both directions are open.
    #[must_use]
    pub fn status(&self) -> HistoryStatus {
        if self.can_undo() {
            HistoryStatus::HasUndo
        } else if self.can_redo() {
            HistoryStatus::HasRedo
        } else {
            HistoryStatus::Clean
        }
    }
}

impl<T: Default> Default for History<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}
