//! End-to-end runs against rate-limited mock servers
//!
//! These use the real clock: the servers throttle on wall time.

use crate::support::{collect_until_data, data_urls, start_throttled_server, RateLimitedResponder, RetryHint};
use std::collections::HashSet;
use std::time::Duration;
use sumi_ebb::config::{Config, InputConfig, SchedulerConfig, UserAgentConfig};
use sumi_ebb::reader::HttpReader;
use sumi_ebb::scheduler::{run_to_completion, EventKind, Scheduler};
use tokio::sync::mpsc;

const TEST_TIMEOUT: Duration = Duration::from_secs(30);

#[tokio::test]
async fn test_scheduler_recovers_from_throttling() {
    let server = start_throttled_server(
        RateLimitedResponder::new(3, Duration::from_secs(1)).with_hint(RetryHint::Seconds(1)),
    )
    .await;
    let urls = data_urls(&server.uri(), 6);

    let (tx, mut rx) = mpsc::channel(16);
    let scheduler = Scheduler::new(5, tx);
    scheduler.set_custom_reader(HttpReader::new().unwrap());
    for url in &urls {
        scheduler.add(url.clone());
    }

    let events = tokio::time::timeout(TEST_TIMEOUT, collect_until_data(&mut rx, urls.len()))
        .await
        .expect("throttled run did not finish");
    scheduler.stop().await;

    let read: HashSet<&str> = events
        .iter()
        .filter(|e| e.kind() == EventKind::Data)
        .filter_map(|e| e.url())
        .collect();
    assert_eq!(read.len(), urls.len());

    let pauses: Vec<u64> = events
        .iter()
        .filter(|e| e.kind() == EventKind::Pause)
        .map(|e| e.retry_after_secs())
        .collect();
    assert!(!pauses.is_empty());
    // The server's hint wins over the 5 second default
    assert!(pauses.iter().all(|&secs| secs == 1));
}

#[tokio::test]
async fn test_independent_servers_throttle_independently() {
    let first = start_throttled_server(
        RateLimitedResponder::new(2, Duration::from_secs(1)).with_hint(RetryHint::Seconds(1)),
    )
    .await;
    let second = start_throttled_server(
        RateLimitedResponder::new(4, Duration::from_secs(1))
            .with_status(503)
            .with_hint(RetryHint::HttpDate(2)),
    )
    .await;

    let (tx_first, mut rx_first) = mpsc::channel(16);
    let (tx_second, mut rx_second) = mpsc::channel(16);
    let sched_first = Scheduler::new(1, tx_first);
    let sched_second = Scheduler::new(1, tx_second);
    sched_first.set_custom_reader(HttpReader::new().unwrap());
    sched_second.set_custom_reader(HttpReader::new().unwrap());

    for url in data_urls(&first.uri(), 4) {
        sched_first.add(url);
    }
    for url in data_urls(&second.uri(), 4) {
        sched_second.add(url);
    }

    let (events_first, events_second) = tokio::time::timeout(TEST_TIMEOUT, async {
        tokio::join!(
            collect_until_data(&mut rx_first, 4),
            collect_until_data(&mut rx_second, 4)
        )
    })
    .await
    .expect("parallel runs did not finish");

    sched_first.stop().await;
    sched_second.stop().await;

    // The second server allows all four in its window, the first does not
    assert!(events_first.iter().any(|e| e.kind() == EventKind::Pause));
    assert!(!events_second.iter().any(|e| e.kind() == EventKind::Pause));
    assert_eq!(
        events_second
            .iter()
            .filter(|e| e.kind() == EventKind::Data)
            .count(),
        4
    );
}

#[tokio::test]
async fn test_run_to_completion_reads_every_url() {
    let server = start_throttled_server(
        RateLimitedResponder::new(3, Duration::from_secs(1)).with_hint(RetryHint::Seconds(1)),
    )
    .await;

    let config = Config {
        scheduler: SchedulerConfig {
            concurrency_limit: 2,
            ..SchedulerConfig::with_pause(5)
        },
        user_agent: UserAgentConfig::default(),
        input: InputConfig {
            urls: data_urls(&server.uri(), 5),
        },
    };

    let mut bodies = Vec::new();
    let summary = tokio::time::timeout(
        TEST_TIMEOUT,
        run_to_completion(config, |event| {
            if let Some(body) = event.body() {
                bodies.push(String::from_utf8_lossy(body).into_owned());
            }
        }),
    )
    .await
    .expect("batch run did not finish")
    .unwrap();

    assert_eq!(summary.total, 5);
    assert_eq!(summary.data, 5);
    assert_eq!(summary.sys_errors, 0);
    assert!(summary.pauses >= 1);
    assert!(summary.errors >= summary.pauses);

    bodies.sort();
    assert_eq!(bodies[0], "payload /data1");
}

#[tokio::test]
async fn test_run_to_completion_with_no_urls() {
    let config = Config {
        scheduler: SchedulerConfig::with_pause(1),
        user_agent: UserAgentConfig::default(),
        input: InputConfig::default(),
    };

    let summary = run_to_completion(config, |_| {}).await.unwrap();
    assert_eq!(summary.total, 0);
    assert_eq!(summary.data, 0);
}
