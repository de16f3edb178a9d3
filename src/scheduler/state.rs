//! State shared between the scheduler handle, its coordinator loop, and
//! in-flight fetch tasks

use crate::reader::{HttpReader, Reader};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

/// Counters and the active reader
pub(crate) struct SharedState {
    /// Fetches dispatched and not yet finished
    in_flight: AtomicUsize,

    /// Concurrency ceiling, 0 for unbounded
    limit: AtomicUsize,

    /// `None` until the default reader is first needed or a custom one is set
    reader: RwLock<Option<Arc<dyn Reader>>>,
}

impl SharedState {
    pub(crate) fn new(limit: usize) -> Self {
        Self {
            in_flight: AtomicUsize::new(0),
            limit: AtomicUsize::new(limit),
            reader: RwLock::new(None),
        }
    }

    pub(crate) fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    pub(crate) fn limit(&self) -> usize {
        self.limit.load(Ordering::SeqCst)
    }

    pub(crate) fn set_limit(&self, limit: usize) {
        self.limit.store(limit, Ordering::SeqCst);
    }

    /// Whether another fetch may be dispatched right now
    pub(crate) fn has_capacity(&self) -> bool {
        let limit = self.limit();
        limit == 0 || self.in_flight() < limit
    }

    pub(crate) fn set_reader(&self, reader: Arc<dyn Reader>) {
        *self.reader.write().unwrap_or_else(PoisonError::into_inner) = Some(reader);
    }

    /// Returns the active reader, installing the default HTTP reader on first use
    pub(crate) fn reader(&self) -> Result<Arc<dyn Reader>, reqwest::Error> {
        if let Some(reader) = self
            .reader
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
        {
            return Ok(Arc::clone(reader));
        }

        let mut slot = self.reader.write().unwrap_or_else(PoisonError::into_inner);
        match slot.as_ref() {
            Some(reader) => Ok(Arc::clone(reader)),
            None => {
                let reader: Arc<dyn Reader> = Arc::new(HttpReader::new()?);
                *slot = Some(Arc::clone(&reader));
                Ok(reader)
            }
        }
    }
}

/// Holds one unit of the in-flight count for as long as it lives
///
/// Dropping the guard, including when its fetch task is aborted, releases the unit.
pub(crate) struct InFlightGuard {
    state: Arc<SharedState>,
}

impl InFlightGuard {
    pub(crate) fn acquire(state: &Arc<SharedState>) -> Self {
        state.in_flight.fetch_add(1, Ordering::SeqCst);
        Self {
            state: Arc::clone(state),
        }
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.state.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}
