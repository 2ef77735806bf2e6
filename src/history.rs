//! # Bounded error history.
//!
//! [`ErrorHistory`] retains the last N errors recorded during a retry
//! session. It is a fixed-capacity ring over an index-addressed circular
//! array: once full, each append overwrites the oldest slot in O(1) — the
//! buffer is never reallocated and never exceeds its capacity.
//!
//! ## Rules
//! - Insertion order is preserved among retained entries.
//! - [`ErrorHistory::iter`] yields oldest first.
//! - Capacity 0 records nothing (every append is a no-op).
//!
//! Entries are `Arc`-shared with the session so the most recent error can be
//! handed to callbacks without cloning the underlying error value.

use std::sync::Arc;

use crate::error::AttemptError;

/// Fixed-capacity, oldest-eviction-first log of recorded attempt failures.
///
/// ## Example
/// ```
/// use std::sync::Arc;
/// use tryvisor::{AttemptError, ErrorHistory};
///
/// let mut history = ErrorHistory::new(2);
/// for msg in ["first", "second", "third"] {
///     history.push(Arc::new(AttemptError::Failed { error: msg.into() }));
/// }
///
/// // Capacity 2: "first" was evicted, order preserved.
/// let retained: Vec<String> = history.iter().map(|e| e.to_string()).collect();
/// assert_eq!(retained, vec!["second", "third"]);
/// ```
#[derive(Clone, Debug)]
pub struct ErrorHistory {
    slots: Vec<Arc<AttemptError>>,
    /// Index of the oldest entry once the ring has wrapped.
    head: usize,
    capacity: usize,
}

impl ErrorHistory {
    /// Creates an empty history with the given capacity.
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: Vec::new(),
            head: 0,
            capacity,
        }
    }

    /// Appends an error, evicting the oldest entry if at capacity.
    pub fn push(&mut self, error: Arc<AttemptError>) {
        if self.capacity == 0 {
            return;
        }
        if self.slots.len() < self.capacity {
            self.slots.push(error);
        } else {
            self.slots[self.head] = error;
            self.head = (self.head + 1) % self.capacity;
        }
    }

    /// Number of retained entries.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// True if nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// The configured capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// The most recently recorded error, if any.
    pub fn last(&self) -> Option<&AttemptError> {
        if self.slots.is_empty() {
            return None;
        }
        let newest = (self.head + self.slots.len() - 1) % self.slots.len();
        Some(self.slots[newest].as_ref())
    }

    /// Iterates over retained errors, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &AttemptError> {
        self.slots[self.head..]
            .iter()
            .chain(self.slots[..self.head].iter())
            .map(Arc::as_ref)
    }
}
