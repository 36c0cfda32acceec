//! `[log]` section
//!
//! Diagnostics about comlog itself. Captured serial lines go to the CSV
//! files and the live view, never through the logger.
//!
//! ```toml
//! [log]
//! level = "debug"     # trace | debug | info | warn | error
//! format = "json"     # console | json
//! output = "stderr"   # stdout | stderr | <file path>
//! ```

use std::path::PathBuf;

use serde::Deserialize;

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// `EnvFilter` directive for this level
    pub fn filter_directive(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Console,
    Json,
}

/// Where diagnostics are written
///
/// Stderr by default so stdout stays free for the printed capture.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    Stdout,
    #[default]
    Stderr,
    #[serde(untagged)]
    File(PathBuf),
}

impl LogOutput {
    /// Whether colored console output makes sense here
    pub fn supports_ansi(&self) -> bool {
        !matches!(self, Self::File(_))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: LogLevel,
    pub format: LogFormat,
    pub output: LogOutput,
}
