// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bounded undo/redo history
//!
//! The log is linear. `cursor` counts the entries currently applied, so
//! entries before it can be undone and entries after it can be redone.

use crate::HistoryError;
use std::collections::VecDeque;

/// Default number of entries kept
pub const DEFAULT_MAX_HISTORY: usize = 100;

/// An entry that may absorb the entry recorded right after it
pub trait Mergeable {
    /// Fold `next` into `self`. Returns false when the two cannot merge, in
    /// which case `self` must be left untouched.
    fn merge(&mut self, next: &Self) -> bool;
}

/// Entries dropped by `EditLog::record`
#[derive(Debug, Clone, PartialEq)]
pub struct Discarded<E> {
    /// The abandoned redo branch; these edits are not applied
    pub undone: Vec<E>,
    /// The oldest entries, pushed out by the bound; these edits stay applied
    pub evicted: Vec<E>,
}

impl<E> Default for Discarded<E> {
    fn default() -> Self {
        Self {
            undone: Vec::new(),
            evicted: Vec::new(),
        }
    }
}

impl<E> Discarded<E> {
    pub fn is_empty(&self) -> bool {
        self.undone.is_empty() && self.evicted.is_empty()
    }
}

/// Linear edit history with a current position
#[derive(Debug, Clone)]
pub struct EditLog<E> {
    entries: VecDeque<E>,
    cursor: usize,
    max_size: usize,
}

impl<E: Mergeable> EditLog<E> {
    pub fn new(max_size: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            cursor: 0,
            max_size,
        }
    }

    /// Record an edit that has just been performed.
    ///
    /// Returns the entries that fell out of the log, so the owner can release
    /// whatever only those entries could have restored.
    pub fn record(&mut self, edit: E) -> Discarded<E> {
        let mut discarded = Discarded::default();
        if self.cursor == self.entries.len() {
            if let Some(top) = self.entries.back_mut() {
                if top.merge(&edit) {
                    tracing::trace!("merged edit into top of history");
                    return discarded;
                }
            }
        }

        // A new edit abandons everything that could have been redone
        discarded.undone = self.entries.drain(self.cursor..).collect();
        self.entries.push_back(edit);
        self.cursor += 1;

        while self.entries.len() > self.max_size {
            if let Some(oldest) = self.entries.pop_front() {
                discarded.evicted.push(oldest);
            }
            self.cursor = self.cursor.saturating_sub(1);
            tracing::debug!(max = self.max_size, "evicted oldest history entry");
        }
        discarded
    }

    /// Step back, returning the entry that must be rolled back
    pub fn undo(&mut self) -> Result<&E, HistoryError> {
        if self.cursor == 0 {
            return Err(HistoryError::NothingToUndo);
        }
        self.cursor -= 1;
        Ok(&self.entries[self.cursor])
    }

    /// Step forward, returning the entry that must be performed again
    pub fn redo(&mut self) -> Result<&E, HistoryError> {
        if self.cursor >= self.entries.len() {
            return Err(HistoryError::NothingToRedo);
        }
        self.cursor += 1;
        Ok(&self.entries[self.cursor - 1])
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor < self.entries.len()
    }

    /// Change the bound. All history is dropped.
    pub fn set_max_size(&mut self, max_size: usize) {
        self.max_size = max_size;
        self.clear();
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.cursor = 0;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries currently applied
    pub fn position(&self) -> usize {
        self.cursor
    }

    pub fn entries(&self) -> impl Iterator<Item = &E> {
        self.entries.iter()
    }
}

impl<E: Mergeable> Default for EditLog<E> {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_HISTORY)
    }
}
