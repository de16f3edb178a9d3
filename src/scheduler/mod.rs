//! Self-throttling fetch scheduler
//!
//! This module contains the scheduling core, including:
//! - The pending-work queue
//! - The coordinator loop that dispatches fetches and backs off on failures
//! - The events published to the caller
//! - A batch driver that reads a fixed set of URLs to completion

mod coordinator;
mod event;
mod queue;
mod runner;
mod state;

pub use event::{Event, EventKind};
pub use queue::TaskQueue;
pub use runner::{run_to_completion, RunSummary};

use crate::config::SchedulerConfig;
use crate::reader::Reader;
use coordinator::{Control, Coordinator};
use state::SharedState;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Handle to a running scheduler
///
/// Creating a scheduler spawns its coordinator loop on the current tokio
/// runtime. URLs may be added at any time until [`Scheduler::stop`] is called.
/// Dropping the handle stops the loop as well.
///
/// Events are delivered on the channel passed at construction. Delivery waits
/// for channel capacity, so a caller that stops draining events stalls the
/// scheduler.
///
/// # Example
///
/// ```no_run
/// use sumi_ebb::scheduler::{Event, Scheduler};
/// use tokio::sync::mpsc;
///
/// # async fn example() {
/// let (tx, mut rx) = mpsc::channel(16);
/// let scheduler = Scheduler::new(10, tx);
/// scheduler.set_limit(4);
/// scheduler.add("http://localhost:3100/data1");
///
/// while let Some(event) = rx.recv().await {
///     if let Event::Data { url, body } = event {
///         println!("{}: {} bytes", url, body.len());
///         break;
///     }
/// }
///
/// scheduler.stop().await;
/// # }
/// ```
pub struct Scheduler {
    queue: Arc<TaskQueue>,
    state: Arc<SharedState>,
    control: mpsc::Sender<Control>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl Scheduler {
    /// Creates a scheduler and starts its loop
    ///
    /// # Arguments
    ///
    /// * `default_pause_secs` - Pause applied after a failure that carries no retry hint
    /// * `events` - Channel the scheduler publishes events on
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub fn new(default_pause_secs: u64, events: mpsc::Sender<Event>) -> Self {
        Self::with_config(&SchedulerConfig::with_pause(default_pause_secs), events)
    }

    /// Creates a scheduler from configuration and starts its loop
    pub fn with_config(config: &SchedulerConfig, events: mpsc::Sender<Event>) -> Self {
        let queue = Arc::new(TaskQueue::new());
        let state = Arc::new(SharedState::new(config.concurrency_limit));
        let (control_tx, control_rx) = mpsc::channel(1);

        let coordinator = Coordinator::new(
            Arc::clone(&queue),
            Arc::clone(&state),
            events,
            control_rx,
            config.default_pause_seconds,
            Duration::from_millis(config.idle_delay_ms),
        );
        let worker = tokio::spawn(coordinator.run());

        Self {
            queue,
            state,
            control: control_tx,
            worker: Mutex::new(Some(worker)),
        }
    }

    /// Replaces the default HTTP reader
    ///
    /// Fetches already in flight finish with the reader they started with.
    pub fn set_custom_reader(&self, reader: impl Reader + 'static) {
        self.state.set_reader(Arc::new(reader));
    }

    /// Sets the concurrency ceiling, 0 for unbounded
    ///
    /// Lowering the ceiling below the current in-flight count takes effect as
    /// those fetches finish.
    pub fn set_limit(&self, limit: usize) {
        self.state.set_limit(limit);
    }

    /// Queues a URL for fetching
    pub fn add(&self, url: impl Into<String>) {
        self.queue.enqueue(url);
    }

    /// Stops the scheduler and waits for its loop to finish
    ///
    /// Nothing is dispatched once the stop is observed. Fetches still in
    /// flight are cancelled without emitting events. Calling this more than
    /// once is harmless.
    pub async fn stop(&self) {
        // Err means the loop has already ended
        let _ = self.control.send(Control::Stop).await;

        let worker = self
            .worker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        if let Some(worker) = worker {
            if let Err(e) = worker.await {
                tracing::error!("Scheduler loop ended abnormally: {}", e);
            }
        }
    }

    /// True while fetches are in flight and more work is queued
    pub fn is_working(&self) -> bool {
        self.state.in_flight() > 0 && !self.queue.is_empty()
    }

    /// True when nothing is in flight and nothing is queued
    pub fn is_free(&self) -> bool {
        self.state.in_flight() == 0 && self.queue.is_empty()
    }

    /// Number of fetches currently in flight
    pub fn processes_quantity(&self) -> usize {
        self.state.in_flight()
    }

    /// Number of URLs waiting to be dispatched
    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// Current concurrency ceiling, 0 for unbounded
    pub fn limit(&self) -> usize {
        self.state.limit()
    }
}
