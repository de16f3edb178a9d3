use serde::Deserialize;

/// Main configuration structure for Sumi-Ebb
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub scheduler: SchedulerConfig,
    #[serde(rename = "user-agent", default)]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub input: InputConfig,
}

/// Scheduler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerConfig {
    /// Pause applied when a failure carries no retry hint (seconds)
    #[serde(rename = "default-pause-seconds")]
    pub default_pause_seconds: u64,

    /// Maximum number of fetches in flight, 0 for unbounded
    #[serde(rename = "concurrency-limit", default)]
    pub concurrency_limit: usize,

    /// How long the loop idles when there is nothing to dispatch (milliseconds)
    #[serde(rename = "idle-delay-ms", default = "default_idle_delay_ms")]
    pub idle_delay_ms: u64,

    /// Capacity of the event channel created by the batch driver
    #[serde(rename = "event-buffer", default = "default_event_buffer")]
    pub event_buffer: usize,
}

impl SchedulerConfig {
    /// Creates a scheduler config with the given default pause and defaults elsewhere
    pub fn with_pause(default_pause_seconds: u64) -> Self {
        Self {
            default_pause_seconds,
            concurrency_limit: 0,
            idle_delay_ms: default_idle_delay_ms(),
            event_buffer: default_event_buffer(),
        }
    }
}

/// Identification and timeouts used by the default HTTP reader
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name sent in the User-Agent header
    #[serde(default = "default_agent_name")]
    pub name: String,

    /// Version sent in the User-Agent header
    #[serde(default = "default_agent_version")]
    pub version: String,

    /// Whole-request timeout (seconds)
    #[serde(rename = "request-timeout-seconds", default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            name: default_agent_name(),
            version: default_agent_version(),
            request_timeout_seconds: default_request_timeout(),
        }
    }
}

/// URLs to read
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InputConfig {
    #[serde(default)]
    pub urls: Vec<String>,
}

fn default_idle_delay_ms() -> u64 {
    10
}

fn default_event_buffer() -> usize {
    16
}

fn default_agent_name() -> String {
    "sumi-ebb".to_string()
}

fn default_agent_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

fn default_request_timeout() -> u64 {
    30
}
