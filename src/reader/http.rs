//! Default HTTP reader
//!
//! Issues a plain GET per URL. Any status outside 2xx is a failure, and the
//! failure carries the pause suggested by the `Retry-After` header when the
//! remote sends one.

use crate::config::UserAgentConfig;
use crate::reader::retry_after::parse_retry_after;
use crate::reader::{FetchResult, Reader};
use crate::FetchError;
use async_trait::async_trait;
use chrono::Utc;
use reqwest::header::RETRY_AFTER;
use reqwest::{Client, Response};
use std::time::Duration;

/// Builds an HTTP client with the configured user agent and timeouts
///
/// # Example
///
/// ```
/// use sumi_ebb::config::UserAgentConfig;
/// use sumi_ebb::reader::build_http_client;
///
/// let client = build_http_client(&UserAgentConfig::default()).unwrap();
/// # let _ = client;
/// ```
pub fn build_http_client(config: &UserAgentConfig) -> Result<Client, reqwest::Error> {
    let user_agent = format!("{}/{}", config.name, config.version);

    Client::builder()
        .user_agent(user_agent)
        .timeout(Duration::from_secs(config.request_timeout_seconds))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Reader that fetches URLs over HTTP(S)
#[derive(Debug, Clone)]
pub struct HttpReader {
    client: Client,
}

impl HttpReader {
    /// Creates a reader with the default user agent
    pub fn new() -> Result<Self, reqwest::Error> {
        Self::from_config(&UserAgentConfig::default())
    }

    pub fn from_config(config: &UserAgentConfig) -> Result<Self, reqwest::Error> {
        Ok(Self::with_client(build_http_client(config)?))
    }

    /// Creates a reader around an existing client
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    /// Maps a non-success response to a failure, honoring any retry hint
    fn status_failure(url: &str, response: &Response) -> FetchResult {
        let status = response.status().as_u16();
        let retry_after_secs = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| parse_retry_after(v, Utc::now()))
            .unwrap_or(0);

        tracing::debug!(
            "{} answered {} (retry hint: {}s)",
            url,
            status,
            retry_after_secs
        );

        FetchResult::failure_with_retry(
            FetchError::Status {
                url: url.to_string(),
                status,
            },
            retry_after_secs,
        )
    }
}

#[async_trait]
impl Reader for HttpReader {
    async fn fetch(&self, url: &str) -> FetchResult {
        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(source) => {
                tracing::debug!("Transport failure for {}: {}", url, source);
                return FetchResult::failure(FetchError::Transport {
                    url: url.to_string(),
                    source,
                });
            }
        };

        if !response.status().is_success() {
            return Self::status_failure(url, &response);
        }

        match response.bytes().await {
            Ok(body) => FetchResult::success(body.to_vec()),
            Err(source) => FetchResult::failure(FetchError::Body {
                url: url.to_string(),
                source,
            }),
        }
    }
}
