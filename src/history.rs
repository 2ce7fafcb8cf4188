//! Bounded undo history.

use std::collections::VecDeque;

use crate::offset::CursorPosition;
use crate::{Error, Result};

/// Default number of snapshots kept.
pub const HISTORY_CAPACITY: usize = 20;

/// One snapshot: the full document and where the cursor was.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    /// Document text.
    pub content: String,
    /// Cursor at snapshot time.
    pub cursor: CursorPosition,
}

/// Undo stack holding at most `capacity` snapshots; the oldest is evicted
/// first.
#[derive(Debug, Clone)]
pub struct HistoryRing {
    entries: VecDeque<HistoryEntry>,
    capacity: usize,
}

impl Default for HistoryRing {
    fn default() -> Self {
        Self::new(HISTORY_CAPACITY)
    }
}

impl HistoryRing {
    /// Ring with the given capacity (at least 1).
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Record a snapshot.
    pub fn push(&mut self, content: impl Into<String>, cursor: CursorPosition) {
        self.entries.push_back(HistoryEntry {
            content: content.into(),
            cursor,
        });
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
    }

    /// Take the most recent snapshot.
    pub fn pop(&mut self) -> Result<HistoryEntry> {
        self.entries.pop_back().ok_or(Error::EmptyHistory)
    }

    /// Number of snapshots held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there is nothing to undo.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Maximum number of snapshots.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifo() {
        let mut ring = HistoryRing::default();
        ring.push("a", CursorPosition::new(1, 0));
        ring.push("b", CursorPosition::new(1, 1));
        assert_eq!(ring.pop().unwrap().content, "b");
        assert_eq!(ring.pop().unwrap().content, "a");
        assert!(matches!(ring.pop(), Err(Error::EmptyHistory)));
    }

    #[test]
    fn test_bound_evicts_oldest() {
        let mut ring = HistoryRing::default();
        for i in 0..25 {
            ring.push(format!("v{i}"), CursorPosition::START);
        }
        assert_eq!(ring.len(), HISTORY_CAPACITY);

        let mut popped = Vec::new();
        while let Ok(entry) = ring.pop() {
            popped.push(entry.content);
        }
        assert_eq!(popped.len(), 20);
        assert_eq!(popped.first().map(String::as_str), Some("v24"));
        assert_eq!(popped.last().map(String::as_str), Some("v5"));
    }

    #[test]
    fn test_zero_capacity_clamped() {
        let mut ring = HistoryRing::new(0);
        ring.push("x", CursorPosition::START);
        ring.push("y", CursorPosition::START);
        assert_eq!(ring.capacity(), 1);
        assert_eq!(ring.len(), 1);
        assert_eq!(ring.pop().unwrap().content, "y");
    }
}
