//! Shared fixtures for the integration tests

use chrono::Utc;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

use sumi_ebb::scheduler::Event;

/// Retry hint a throttled response carries
#[derive(Debug, Clone, Copy)]
pub enum RetryHint {
    None,
    Seconds(u64),
    /// An HTTP-date this many seconds in the future
    HttpDate(u64),
}

/// Formats an IMF-fixdate `seconds` from now
pub fn http_date_in(seconds: i64) -> String {
    (Utc::now() + chrono::Duration::seconds(seconds))
        .format("%a, %d %b %Y %H:%M:%S GMT")
        .to_string()
}

/// A responder that serves at most `limit` requests per sliding `window`
///
/// Every instance keeps its own window, so several servers can throttle
/// independently within one test.
pub struct RateLimitedResponder {
    limit: usize,
    window: Duration,
    status: u16,
    hint: RetryHint,
    served: Mutex<VecDeque<Instant>>,
}

impl RateLimitedResponder {
    pub fn new(limit: usize, window: Duration) -> Self {
        Self {
            limit,
            window,
            status: 429,
            hint: RetryHint::None,
            served: Mutex::new(VecDeque::new()),
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    pub fn with_hint(mut self, hint: RetryHint) -> Self {
        self.hint = hint;
        self
    }

    fn allow(&self, now: Instant) -> bool {
        let mut served = self.served.lock().unwrap();
        while let Some(oldest) = served.front() {
            if now.duration_since(*oldest) >= self.window {
                served.pop_front();
            } else {
                break;
            }
        }

        if served.len() < self.limit {
            served.push_back(now);
            true
        } else {
            false
        }
    }
}

impl Respond for RateLimitedResponder {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        if self.allow(Instant::now()) {
            return ResponseTemplate::new(200).set_body_string(format!("payload {}", request.url.path()));
        }

        let template = ResponseTemplate::new(self.status).set_body_string("denied!");
        match self.hint {
            RetryHint::None => template,
            RetryHint::Seconds(secs) => template.insert_header("Retry-After", secs.to_string().as_str()),
            RetryHint::HttpDate(secs) => {
                template.insert_header("Retry-After", http_date_in(secs as i64).as_str())
            }
        }
    }
}

/// Starts a server whose every GET goes through `responder`
pub async fn start_throttled_server(responder: RateLimitedResponder) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(responder)
        .mount(&server)
        .await;
    server
}

/// URLs `/data1..=/dataN` on the given base
pub fn data_urls(base: &str, count: usize) -> Vec<String> {
    (1..=count).map(|i| format!("{}/data{}", base, i)).collect()
}

/// Everything received until `data_count` Data events have arrived
pub async fn collect_until_data(rx: &mut mpsc::Receiver<Event>, data_count: usize) -> Vec<Event> {
    let mut events = Vec::new();
    let mut seen = 0;

    while seen < data_count {
        let event = rx.recv().await.expect("event channel closed early");
        if matches!(event, Event::Data { .. }) {
            seen += 1;
        }
        events.push(event);
    }

    events
}
