//! cosched configuration
//!
//! Configuration is read from a RON file. Every field is optional and falls
//! back to its default.
//!
//! ```text
//! (
//!     scheduler: (name: "render", capacity: 16),
//!     log_level: Debug,
//! )
//! ```
//!
//! # Usage
//!
//! ```rust
//! use cosched::util::config::Config;
//!
//! let config = Config::from_ron_str("(scheduler: (name: \"render\"))").unwrap();
//! assert_eq!(config.scheduler.name, "render");
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::runtime::scheduler::SchedulerConfig;
use crate::util::logger::LogLevel;

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Config {
    /// Scheduler settings
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    /// Log verbosity
    #[serde(default)]
    pub log_level: LogLevel,
}

impl Config {
    /// Parse configuration from RON text.
    pub fn from_ron_str(content: &str) -> Result<Self, ConfigError> {
        ron::from_str(content).map_err(ConfigError::Parse)
    }

    /// Load configuration from a RON file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
        Self::from_ron_str(&content)
    }

    /// Load configuration if `path` is given, defaults otherwise.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),
}
