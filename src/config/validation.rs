use crate::config::types::{Config, InputConfig, SchedulerConfig, UserAgentConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_scheduler_config(&config.scheduler)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_input_config(&config.input)?;
    Ok(())
}

/// Validates scheduler configuration
fn validate_scheduler_config(config: &SchedulerConfig) -> Result<(), ConfigError> {
    if config.default_pause_seconds < 1 {
        return Err(ConfigError::Validation(format!(
            "default_pause_seconds must be >= 1, got {}",
            config.default_pause_seconds
        )));
    }

    // 0 is the unbounded sentinel
    if config.concurrency_limit > 1000 {
        return Err(ConfigError::Validation(format!(
            "concurrency_limit must be between 0 and 1000, got {}",
            config.concurrency_limit
        )));
    }

    if config.idle_delay_ms < 1 || config.idle_delay_ms > 1000 {
        return Err(ConfigError::Validation(format!(
            "idle_delay_ms must be between 1 and 1000, got {}",
            config.idle_delay_ms
        )));
    }

    if config.event_buffer < 1 {
        return Err(ConfigError::Validation(
            "event_buffer must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    if config.name.is_empty() {
        return Err(ConfigError::Validation("name cannot be empty".to_string()));
    }

    if !config
        .name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "name must contain only alphanumeric characters and hyphens, got '{}'",
            config.name
        )));
    }

    if config.request_timeout_seconds < 1 {
        return Err(ConfigError::Validation(
            "request_timeout_seconds must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates the input URLs
fn validate_input_config(config: &InputConfig) -> Result<(), ConfigError> {
    for raw in &config.urls {
        validate_url(raw)?;
    }
    Ok(())
}

/// Checks that a URL parses and uses a scheme the default reader can fetch
pub(crate) fn validate_url(raw: &str) -> Result<(), ConfigError> {
    let url = Url::parse(raw)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid URL '{}': {}", raw, e)))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidUrl(format!(
            "URL '{}' must use http or https",
            raw
        )));
    }

    Ok(())
}
