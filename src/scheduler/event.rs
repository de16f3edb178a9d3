//! Events published to the caller

use crate::{FetchError, QueueError};
use std::fmt;

/// Discriminant of an [`Event`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Data,
    Pause,
    Error,
    SysError,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Data => "data",
            Self::Pause => "pause",
            Self::Error => "error",
            Self::SysError => "sys_error",
        };
        write!(f, "{}", s)
    }
}

/// Something the scheduler wants the caller to know about
#[derive(Debug)]
pub enum Event {
    /// A fetch succeeded
    Data { url: String, body: Vec<u8> },

    /// The scheduler is pausing before it dispatches anything else
    Pause {
        /// Length of the pause in seconds
        retry_after_secs: u64,
    },

    /// A fetch failed; the URL has been handed back for retry
    Error {
        url: String,
        error: FetchError,
        /// Pause suggested by the remote, 0 when none was given
        retry_after_secs: u64,
    },

    /// An internal queue failure; the URL, if any, is dropped
    SysError {
        url: Option<String>,
        error: QueueError,
    },
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Data { .. } => EventKind::Data,
            Self::Pause { .. } => EventKind::Pause,
            Self::Error { .. } => EventKind::Error,
            Self::SysError { .. } => EventKind::SysError,
        }
    }

    /// The URL this event refers to, absent for pauses
    pub fn url(&self) -> Option<&str> {
        match self {
            Self::Data { url, .. } | Self::Error { url, .. } => Some(url.as_str()),
            Self::SysError { url, .. } => url.as_deref(),
            Self::Pause { .. } => None,
        }
    }

    /// Retry delay carried by Pause and Error events, 0 otherwise
    pub fn retry_after_secs(&self) -> u64 {
        match self {
            Self::Pause { retry_after_secs } | Self::Error { retry_after_secs, .. } => {
                *retry_after_secs
            }
            _ => 0,
        }
    }

    pub fn body(&self) -> Option<&[u8]> {
        match self {
            Self::Data { body, .. } => Some(body.as_slice()),
            _ => None,
        }
    }
}
