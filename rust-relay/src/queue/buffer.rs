//! In-memory FIFO of pending submissions.
//!
//! The buffer and the drain state live behind a single mutex, so every
//! append, peek, pop and drain check-and-set is one critical section. The
//! lock is never held across an `.await`; callers get owned clones.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

use reqwest::header::HeaderValue;
use tracing::{debug, warn};

use super::types::{DrainState, QueueEntry};
use crate::error::QueueError;

/// Shared, cloneable handle to the relay queue.
#[derive(Clone)]
pub struct FactQueue {
    inner: Arc<QueueInner>,
}

struct QueueInner {
    capacity: Option<usize>,
    state: Mutex<QueueState>,
}

#[derive(Default)]
struct QueueState {
    entries: VecDeque<QueueEntry>,
    drain: DrainState,
    next_sequence: u64,
}

/// Holds the queue in [`DrainState::Draining`] for as long as it lives.
///
/// Dropping the guard returns the queue to [`DrainState::Idle`], which also
/// covers a drain task that unwinds.
#[must_use = "dropping the guard immediately ends the drain pass"]
pub struct DrainGuard {
    queue: FactQueue,
}

impl FactQueue {
    /// Create an unbounded queue.
    pub fn new() -> Self {
        Self::with_capacity(None)
    }

    /// Create a queue that refuses appends beyond `capacity` entries.
    pub fn with_capacity(capacity: Option<usize>) -> Self {
        Self {
            inner: Arc::new(QueueInner {
                capacity,
                state: Mutex::new(QueueState::default()),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, QueueState> {
        // A panic while holding the lock cannot leave the deque half-mutated,
        // so a poisoned lock is still usable.
        self.inner
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Append a submission to the tail and return the stored entry.
    pub fn push(
        &self,
        payload: String,
        auth_header: Option<HeaderValue>,
    ) -> Result<QueueEntry, QueueError> {
        let mut state = self.lock();

        if let Some(capacity) = self.inner.capacity {
            if state.entries.len() >= capacity {
                return Err(QueueError::Full(capacity));
            }
        }

        let entry = QueueEntry {
            sequence: state.next_sequence,
            payload,
            auth_header,
            enqueued_at: Instant::now(),
        };
        state.next_sequence += 1;
        state.entries.push_back(entry.clone());

        debug!(
            sequence = entry.sequence,
            queue_depth = state.entries.len(),
            "queue_entry_appended"
        );

        Ok(entry)
    }

    /// Clone of the entry at the head, if any.
    pub fn peek(&self) -> Option<QueueEntry> {
        self.lock().entries.front().cloned()
    }

    /// Remove the head, but only if it is the entry with `sequence`.
    ///
    /// Returns `true` when an entry was removed.
    pub fn pop_if_head(&self, sequence: u64) -> bool {
        let mut state = self.lock();
        let head_sequence = state.entries.front().map(|e| e.sequence);
        if head_sequence == Some(sequence) {
            state.entries.pop_front();
            true
        } else {
            warn!(
                expected_sequence = sequence,
                head_sequence = ?head_sequence,
                "queue_pop_head_mismatch"
            );
            false
        }
    }

    /// Number of queued entries.
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    /// Whether the queue holds no entries.
    pub fn is_empty(&self) -> bool {
        self.lock().entries.is_empty()
    }

    /// Current drain state.
    pub fn drain_state(&self) -> DrainState {
        self.lock().drain
    }

    /// Snapshot of every queued entry, head first.
    pub fn snapshot(&self) -> Vec<QueueEntry> {
        self.lock().entries.iter().cloned().collect()
    }

    /// Move to [`DrainState::Draining`] if the queue is idle and non-empty.
    ///
    /// Check and transition happen under one lock acquisition, so at most one
    /// guard exists at a time.
    pub fn try_begin_drain(&self) -> Option<DrainGuard> {
        let mut state = self.lock();
        if state.drain == DrainState::Idle && !state.entries.is_empty() {
            state.drain = DrainState::Draining;
            Some(DrainGuard {
                queue: self.clone(),
            })
        } else {
            None
        }
    }
}

impl Default for FactQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl DrainGuard {
    /// The queue this pass is draining.
    pub fn queue(&self) -> &FactQueue {
        &self.queue
    }
}

impl Drop for DrainGuard {
    fn drop(&mut self) {
        self.queue.lock().drain = DrainState::Idle;
    }
}
