//! Session settings
//!
//! The subset of the configuration a capture session runs with. The
//! controller keeps one copy and hands a clone to each session, so changes
//! made while streaming apply to the next session only.

use std::path::PathBuf;
use std::time::Duration;

use comlog_config::{Config, FileErrorPolicy};
use comlog_sinks::RotationPolicy;

/// Settings for one capture session
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub rotation: RotationPolicy,
    pub display_limit: usize,
    pub directory: PathBuf,
    pub file_prefix: String,
    pub buffer_size: usize,
    pub create_dirs: bool,
    pub flush_interval: Duration,
    pub on_file_error: FileErrorPolicy,
    pub utc_offset_hours: i32,
    /// 0 never escalates
    pub max_consecutive_write_failures: u64,
    /// 0 is unbounded
    pub max_pending_bytes: usize,
}

impl SessionSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            rotation: RotationPolicy::new(
                config.rotation.period_minutes,
                config.rotation.max_lines_per_file,
            ),
            display_limit: config.display.line_limit,
            directory: PathBuf::from(&config.output.directory),
            file_prefix: config.output.file_prefix.clone(),
            buffer_size: config.output.buffer_size,
            create_dirs: config.output.create_dirs,
            flush_interval: Duration::from_millis(config.output.flush_interval_ms.max(1)),
            on_file_error: config.output.on_file_error,
            utc_offset_hours: config.timestamp.utc_offset_hours,
            max_consecutive_write_failures: config.session.max_consecutive_write_failures,
            max_pending_bytes: config.session.max_pending_bytes,
        }
    }

    /// Write files into `directory`
    pub fn with_directory(mut self, directory: impl Into<PathBuf>) -> Self {
        self.directory = directory.into();
        self
    }

    /// Use a different rotation policy
    pub fn with_rotation(mut self, period_minutes: u64, max_lines_per_file: u64) -> Self {
        self.rotation = RotationPolicy::new(period_minutes, max_lines_per_file);
        self
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}
