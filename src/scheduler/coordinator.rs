//! Scheduler coordinator - the dispatch and backoff loop
//!
//! One coordinator task runs per scheduler. Each tick it looks at, in order:
//! 1. The control channel - a stop request ends the loop for good
//! 2. The backoff channel - a failed fetch is re-enqueued, and unless a pause
//!    is already in effect the loop announces a pause and sleeps through it
//! 3. The queue - when there is capacity, one URL is dequeued and fetched on
//!    its own task
//!
//! The coordinator is the only task that dequeues, re-enqueues after a
//! failure, or touches the pause flag. Fetch tasks report back through
//! channels and the atomic in-flight counter only.

use crate::reader::{FetchResult, Reader};
use crate::scheduler::event::Event;
use crate::scheduler::queue::TaskQueue;
use crate::scheduler::state::{InFlightGuard, SharedState};
use crate::FetchError;
use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{self, error::TryRecvError};
use tokio::task::JoinSet;

/// Capacity of the channel fetch tasks use to hand failures back
pub(crate) const BACKOFF_CHANNEL_CAPACITY: usize = 64;

/// Floor for the idle wait, so an idle loop never spins
pub(crate) const MIN_IDLE_DELAY: Duration = Duration::from_millis(1);

/// Messages from the scheduler handle to its coordinator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Control {
    Stop,
}

/// A failed fetch reported back for re-enqueue and pause handling
#[derive(Debug)]
pub(crate) struct BackoffSignal {
    pub url: String,
    pub retry_after_secs: u64,
}

/// Effective pause for a failure: the remote's hint if it gave one, else the default
pub(crate) fn effective_pause_secs(retry_after_secs: u64, default_pause_secs: u64) -> u64 {
    if retry_after_secs > 0 {
        retry_after_secs
    } else {
        default_pause_secs
    }
}

/// What the default branch did this tick
enum Tick {
    Dispatched,
    Idle,
}

pub(crate) struct Coordinator {
    queue: Arc<TaskQueue>,
    state: Arc<SharedState>,
    events: mpsc::Sender<Event>,
    control: mpsc::Receiver<Control>,
    backoff_tx: mpsc::Sender<BackoffSignal>,
    backoff_rx: mpsc::Receiver<BackoffSignal>,
    fetches: JoinSet<()>,
    default_pause_secs: u64,
    idle_delay: Duration,
    on_pause_timer: bool,
}

impl Coordinator {
    pub(crate) fn new(
        queue: Arc<TaskQueue>,
        state: Arc<SharedState>,
        events: mpsc::Sender<Event>,
        control: mpsc::Receiver<Control>,
        default_pause_secs: u64,
        idle_delay: Duration,
    ) -> Self {
        let (backoff_tx, backoff_rx) = mpsc::channel(BACKOFF_CHANNEL_CAPACITY);

        Self {
            queue,
            state,
            events,
            control,
            backoff_tx,
            backoff_rx,
            fetches: JoinSet::new(),
            default_pause_secs,
            idle_delay: idle_delay.max(MIN_IDLE_DELAY),
            on_pause_timer: false,
        }
    }

    /// Runs the tick loop until a stop request arrives or the caller goes away
    pub(crate) async fn run(mut self) {
        tracing::info!(
            "Scheduler started (default pause {}s, limit {})",
            self.default_pause_secs,
            self.state.limit()
        );

        loop {
            self.reap_finished();

            match self.control.try_recv() {
                Ok(Control::Stop) => {
                    tracing::info!("Stop requested");
                    break;
                }
                Err(TryRecvError::Disconnected) => {
                    tracing::info!("Scheduler handle dropped");
                    break;
                }
                Err(TryRecvError::Empty) => {}
            }

            // The coordinator owns a sender, so this channel never disconnects
            if let Ok(signal) = self.backoff_rx.try_recv() {
                if self.handle_backoff(signal).await.is_break() {
                    break;
                }
                continue;
            }

            self.on_pause_timer = false;

            match self.dispatch_next().await {
                ControlFlow::Continue(Tick::Dispatched) => {}
                ControlFlow::Continue(Tick::Idle) => {
                    if self.idle().await.is_break() {
                        break;
                    }
                }
                ControlFlow::Break(()) => break,
            }
        }

        self.shutdown().await;
    }

    /// Re-enqueues a failed URL and pauses unless a pause is already in effect
    async fn handle_backoff(&mut self, signal: BackoffSignal) -> ControlFlow<()> {
        self.queue.enqueue(signal.url.clone());

        if self.on_pause_timer {
            tracing::debug!("Coalesced failure of {} into the current pause", signal.url);
            return ControlFlow::Continue(());
        }
        self.on_pause_timer = true;

        let pause_secs = effective_pause_secs(signal.retry_after_secs, self.default_pause_secs);
        tracing::warn!(
            "Backing off for {}s after failure of {}",
            pause_secs,
            signal.url
        );

        self.emit(Event::Pause {
            retry_after_secs: pause_secs,
        })
        .await?;
        self.pause(Duration::from_secs(pause_secs)).await
    }

    /// Dequeues and dispatches one URL if there is work and capacity
    async fn dispatch_next(&mut self) -> ControlFlow<(), Tick> {
        if self.queue.is_empty() || !self.state.has_capacity() {
            return ControlFlow::Continue(Tick::Idle);
        }

        // Length check and dequeue are separate steps; a miss is reported, not retried
        let url = match self.queue.dequeue() {
            Ok(url) => url,
            Err(error) => {
                tracing::error!("Dequeue failed after length check: {}", error);
                self.emit(Event::SysError { url: None, error }).await?;
                return ControlFlow::Continue(Tick::Dispatched);
            }
        };

        let guard = InFlightGuard::acquire(&self.state);
        let reader = self.state.reader();
        let events = self.events.clone();
        let backoff = self.backoff_tx.clone();

        tracing::debug!(
            "Dispatching {} ({} in flight)",
            url,
            self.state.in_flight()
        );

        self.fetches.spawn(async move {
            let _guard = guard;

            match fetch_with(reader, &url).await {
                FetchResult::Success { body } => {
                    if events.send(Event::Data { url, body }).await.is_err() {
                        tracing::debug!("Event receiver gone, dropping data event");
                    }
                }
                FetchResult::Failure {
                    error,
                    retry_after_secs,
                } => {
                    let event = Event::Error {
                        url: url.clone(),
                        error,
                        retry_after_secs,
                    };
                    if events.send(event).await.is_err() {
                        tracing::debug!("Event receiver gone, dropping error event");
                    }

                    let signal = BackoffSignal {
                        url,
                        retry_after_secs,
                    };
                    if backoff.send(signal).await.is_err() {
                        tracing::debug!("Coordinator gone, dropping backoff signal");
                    }
                }
            }
        });

        ControlFlow::Continue(Tick::Dispatched)
    }

    /// Sends an event to the caller, giving up if a stop arrives first
    async fn emit(&mut self, event: Event) -> ControlFlow<()> {
        tokio::select! {
            biased;
            _ = self.control.recv() => {
                tracing::info!("Stop requested while delivering an event");
                ControlFlow::Break(())
            }
            sent = self.events.send(event) => match sent {
                Ok(()) => ControlFlow::Continue(()),
                Err(_) => {
                    tracing::warn!("Event receiver dropped, stopping scheduler");
                    ControlFlow::Break(())
                }
            },
        }
    }

    /// Sleeps through a pause, waking early only to stop
    async fn pause(&mut self, duration: Duration) -> ControlFlow<()> {
        tokio::select! {
            biased;
            _ = self.control.recv() => {
                tracing::info!("Stop requested during pause");
                ControlFlow::Break(())
            }
            _ = tokio::time::sleep(duration) => {
                tracing::debug!("Pause of {:?} elapsed, resuming", duration);
                ControlFlow::Continue(())
            }
        }
    }

    /// Waits briefly when there is nothing to dispatch
    async fn idle(&mut self) -> ControlFlow<()> {
        tokio::select! {
            biased;
            _ = self.control.recv() => ControlFlow::Break(()),
            Some(signal) = self.backoff_rx.recv() => self.handle_backoff(signal).await,
            _ = tokio::time::sleep(self.idle_delay) => ControlFlow::Continue(()),
        }
    }

    /// Collects fetch tasks that have already finished
    fn reap_finished(&mut self) {
        while let Some(joined) = self.fetches.try_join_next() {
            if let Err(e) = joined {
                if e.is_panic() {
                    tracing::error!("Fetch task panicked: {}", e);
                }
            }
        }
    }

    /// Cancels fetches still in flight and waits for them to unwind
    async fn shutdown(mut self) {
        let abandoned = self.fetches.len();
        self.fetches.abort_all();
        while self.fetches.join_next().await.is_some() {}

        tracing::info!(
            "Scheduler stopped ({} fetches cancelled, {} URLs left queued)",
            abandoned,
            self.queue.len()
        );
    }
}

/// Fetches through the active reader, or reports why there is none
async fn fetch_with(reader: Result<Arc<dyn Reader>, reqwest::Error>, url: &str) -> FetchResult {
    match reader {
        Ok(reader) => reader.fetch(url).await,
        Err(source) => {
            tracing::error!("Default HTTP client could not be built: {}", source);
            FetchResult::failure(FetchError::Client {
                url: url.to_string(),
                source,
            })
        }
    }
}
