//! Configuration module for Sumi-Ebb
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use sumi_ebb::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("ebb.toml")).unwrap();
//! println!("Default pause: {}s", config.scheduler.default_pause_seconds);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, InputConfig, SchedulerConfig, UserAgentConfig};

// Re-export parser functions
pub use parser::{load_config, parse_config};
pub use validation::validate;
