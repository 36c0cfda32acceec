//! comlog Configuration
//!
//! TOML-based configuration loading with sensible defaults.
//! An empty file is a valid configuration: it captures from stdin into
//! `logs/`, rotating every 20 minutes.
//!
//! # Parsing
//!
//! ```
//! use comlog_config::Config;
//! use std::str::FromStr;
//!
//! let config = Config::from_str("[rotation]\nperiod_minutes = 0").unwrap();
//! assert_eq!(config.rotation.period_minutes, 0);
//! ```
//!
//! # Example Config
//!
//! ```toml
//! [source]
//! type = "device"
//! path = "/dev/ttyUSB0"
//!
//! [output]
//! directory = "/var/log/serial"
//!
//! [rotation]
//! period_minutes = 0
//! max_lines_per_file = 500000
//!
//! [display]
//! line_limit = 200
//! ```

mod capture;
mod error;
mod logging;
mod output;
mod source;
mod validation;

use std::fs;
use std::path::Path;
use std::str::FromStr;

pub use capture::{
    DEFAULT_LINE_LIMIT, DEFAULT_MAX_LINES_PER_FILE, DEFAULT_PERIOD_MINUTES, DisplayConfig,
    MAX_PERIOD_MINUTES, RotationConfig, SessionConfig, TimestampConfig,
};
pub use error::{ConfigError, Result};
pub use logging::{LogConfig, LogFormat, LogLevel, LogOutput};
pub use output::{FileErrorPolicy, OutputConfig};
pub use source::{SourceConfig, SourceKind};

use serde::Deserialize;

/// Main configuration structure
///
/// All sections are optional with sensible defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Logging configuration
    pub log: LogConfig,

    /// Where raw text comes from
    pub source: SourceConfig,

    /// Where CSV files go
    pub output: OutputConfig,

    /// File rotation policy
    pub rotation: RotationConfig,

    /// Live display settings
    pub display: DisplayConfig,

    /// Timestamp rendering
    pub timestamp: TimestampConfig,

    /// Ingest session limits
    pub session: SessionConfig,
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read, contains invalid TOML,
    /// or fails validation.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::IoError {
            path: path.display().to_string(),
            source: e,
        })?;

        Self::from_str(&contents)
    }

    /// Load from `path` if it exists, otherwise fall back to defaults
    pub fn from_file_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    fn parse(s: &str) -> Result<Self> {
        let config: Config = toml::from_str(s).map_err(ConfigError::ParseError)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    ///
    /// Called automatically when parsing; call again after applying
    /// command-line overrides.
    pub fn validate(&self) -> Result<()> {
        validation::validate_config(self)
    }
}

impl FromStr for Config {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
