//! Batch driver: read a fixed set of URLs to completion

use crate::config::{validate, Config};
use crate::reader::HttpReader;
use crate::scheduler::{Event, Scheduler};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

/// Counts gathered while reading a batch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// URLs submitted
    pub total: usize,
    pub data: usize,
    pub errors: usize,
    pub pauses: usize,
    /// URLs lost to queue failures
    pub sys_errors: usize,
    pub elapsed: Duration,
}

impl RunSummary {
    /// URLs that reached a final outcome
    pub fn settled(&self) -> usize {
        self.data + self.sys_errors
    }

    /// Records one event, returning whether every URL has now settled
    pub fn record(&mut self, event: &Event) -> bool {
        match event {
            Event::Data { .. } => self.data += 1,
            Event::Error { .. } => self.errors += 1,
            Event::Pause { .. } => self.pauses += 1,
            Event::SysError { .. } => self.sys_errors += 1,
        }
        self.settled() >= self.total
    }
}

/// Reads every configured URL until each has produced data
///
/// This is the main entry point for one-shot runs. It will:
/// 1. Validate the configuration
/// 2. Build the default HTTP reader from the user agent settings
/// 3. Start a scheduler and queue every URL
/// 4. Hand each event to `observer` while counting outcomes
/// 5. Stop once every URL produced data or was lost to a queue failure
///
/// # Returns
///
/// * `Ok(RunSummary)` - All URLs settled
/// * `Err(EbbError::Config)` - The configuration failed validation
/// * `Err(EbbError::Client)` - The HTTP client could not be built
pub async fn run_to_completion<F>(config: Config, mut observer: F) -> crate::Result<RunSummary>
where
    F: FnMut(&Event),
{
    validate(&config)?;

    let reader = HttpReader::from_config(&config.user_agent)?;
    let (tx, mut rx) = mpsc::channel(config.scheduler.event_buffer);
    let scheduler = Scheduler::with_config(&config.scheduler, tx);
    scheduler.set_custom_reader(reader);

    let start = Instant::now();
    let mut summary = RunSummary {
        total: config.input.urls.len(),
        ..RunSummary::default()
    };

    tracing::info!("Reading {} URLs", summary.total);
    for url in config.input.urls {
        scheduler.add(url);
    }

    if summary.total > 0 {
        while let Some(event) = rx.recv().await {
            observer(&event);
            if summary.record(&event) {
                break;
            }
        }
    }

    scheduler.stop().await;
    summary.elapsed = start.elapsed();

    tracing::info!(
        "Run finished: {} data, {} errors, {} pauses, {} lost in {:?}",
        summary.data,
        summary.errors,
        summary.pauses,
        summary.sys_errors,
        summary.elapsed
    );

    Ok(summary)
}
