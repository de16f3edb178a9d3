//! Reader capability
//!
//! A reader performs exactly one fetch per call and reports either the body or
//! a failure together with the pause the remote suggested. The scheduler runs
//! each call on its own task, so implementations may take as long as they need.
//!
//! - [`HttpReader`] is the default, backed by reqwest
//! - [`reader_fn`] turns an async closure into a reader

mod http;
mod retry_after;

pub use http::{build_http_client, HttpReader};
pub use retry_after::{parse_http_date, parse_retry_after};

use crate::FetchError;
use async_trait::async_trait;
use std::future::Future;

/// Outcome of a single fetch
#[derive(Debug)]
pub enum FetchResult {
    /// The resource was retrieved
    Success {
        /// Response body
        body: Vec<u8>,
    },

    /// The resource could not be retrieved
    Failure {
        /// What went wrong
        error: FetchError,
        /// Pause suggested by the remote, 0 to use the scheduler default
        retry_after_secs: u64,
    },
}

impl FetchResult {
    pub fn success(body: impl Into<Vec<u8>>) -> Self {
        Self::Success { body: body.into() }
    }

    pub fn failure(error: impl Into<FetchError>) -> Self {
        Self::failure_with_retry(error, 0)
    }

    pub fn failure_with_retry(error: impl Into<FetchError>, retry_after_secs: u64) -> Self {
        Self::Failure {
            error: error.into(),
            retry_after_secs,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// Performs one fetch and reports its outcome
#[async_trait]
pub trait Reader: Send + Sync {
    async fn fetch(&self, url: &str) -> FetchResult;
}

/// A reader backed by an async closure
pub struct FnReader<F> {
    f: F,
}

/// Wraps an async closure as a [`Reader`]
///
/// # Example
///
/// ```
/// use sumi_ebb::reader::{reader_fn, FetchResult};
///
/// let reader = reader_fn(|url: String| async move {
///     FetchResult::success(format!("stub body for {}", url))
/// });
/// # let _ = reader;
/// ```
pub fn reader_fn<F, Fut>(f: F) -> FnReader<F>
where
    F: Fn(String) -> Fut + Send + Sync,
    Fut: Future<Output = FetchResult> + Send,
{
    FnReader { f }
}

#[async_trait]
impl<F, Fut> Reader for FnReader<F>
where
    F: Fn(String) -> Fut + Send + Sync,
    Fut: Future<Output = FetchResult> + Send,
{
    async fn fetch(&self, url: &str) -> FetchResult {
        (self.f)(url.to_string()).await
    }
}
