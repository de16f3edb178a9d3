//! Pending-work queue

use crate::QueueError;
use std::collections::VecDeque;
#[cfg(test)]
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Concurrency-safe FIFO of URLs waiting to be fetched
///
/// Any number of threads may enqueue. Duplicates are kept; each copy is
/// fetched independently.
#[derive(Debug, Default)]
pub struct TaskQueue {
    items: Mutex<VecDeque<String>>,

    #[cfg(test)]
    refuse_next: AtomicBool,
}

impl TaskQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a URL to the back of the queue
    pub fn enqueue(&self, url: impl Into<String>) {
        self.lock().push_back(url.into());
    }

    /// Removes and returns the oldest URL
    ///
    /// # Returns
    ///
    /// * `Ok(String)` - The oldest URL
    /// * `Err(QueueError::Empty)` - Nothing is pending
    pub fn dequeue(&self) -> Result<String, QueueError> {
        #[cfg(test)]
        if self.refuse_next.swap(false, Ordering::SeqCst) {
            return Err(QueueError::Empty);
        }

        self.lock().pop_front().ok_or(QueueError::Empty)
    }

    /// Returns the number of pending URLs
    ///
    /// Under concurrent use this is a snapshot that may already be stale.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Makes the next dequeue fail while leaving the items in place
    #[cfg(test)]
    pub(crate) fn refuse_next_dequeue(&self) {
        self.refuse_next.store(true, Ordering::SeqCst);
    }

    // A panic while holding the lock cannot leave the deque half-modified
    fn lock(&self) -> MutexGuard<'_, VecDeque<String>> {
        self.items.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
