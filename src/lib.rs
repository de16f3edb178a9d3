//! Sumi-Ebb: a self-throttling fetch scheduler
//!
//! This crate fetches a growing set of URLs with bounded parallelism and backs
//! off whenever the remote signals rate limiting, then resumes and retries.

pub mod config;
pub mod reader;
pub mod scheduler;

use thiserror::Error;

/// Main error type for Sumi-Ebb operations
#[derive(Debug, Error)]
pub enum EbbError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Failures reported by a [`reader::Reader`]
///
/// Every variant is recoverable: the scheduler re-enqueues the URL and backs off.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Transport error for {url}: {source}")]
    Transport { url: String, source: reqwest::Error },

    #[error("Wrong status code {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Failed to read body of {url}: {source}")]
    Body { url: String, source: reqwest::Error },

    #[error("Default HTTP client unavailable for {url}: {source}")]
    Client { url: String, source: reqwest::Error },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Task queue errors
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum QueueError {
    #[error("task queue is empty")]
    Empty,
}

/// Result type alias for Sumi-Ebb operations
pub type Result<T> = std::result::Result<T, EbbError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use reader::{reader_fn, FetchResult, HttpReader, Reader};
pub use scheduler::{run_to_completion, Event, EventKind, RunSummary, Scheduler, TaskQueue};
