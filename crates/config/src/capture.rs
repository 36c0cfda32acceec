//! Rotation, display, timestamp and session settings

use serde::Deserialize;

/// Default rotation period in minutes
pub const DEFAULT_PERIOD_MINUTES: u64 = 20;

/// Longest accepted rotation period (one leap year)
pub const MAX_PERIOD_MINUTES: u64 = 366 * 24 * 60;

/// Default line ceiling per file when rotating by size
pub const DEFAULT_MAX_LINES_PER_FILE: u64 = 500_000;

/// Default number of lines kept for the live display
pub const DEFAULT_LINE_LIMIT: usize = 100;

/// File rotation policy
///
/// `period_minutes > 0` rotates on a timer and ignores the line ceiling;
/// `period_minutes = 0` rotates after `max_lines_per_file` records.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RotationConfig {
    /// Rotation period in minutes, 0 selects line-count rotation
    /// Default: 20
    pub period_minutes: u64,

    /// Records per file in line-count mode
    /// Default: 500000
    pub max_lines_per_file: u64,
}

impl Default for RotationConfig {
    fn default() -> Self {
        Self {
            period_minutes: DEFAULT_PERIOD_MINUTES,
            max_lines_per_file: DEFAULT_MAX_LINES_PER_FILE,
        }
    }
}

/// Live display settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Most recent lines kept in memory
    /// Default: 100
    pub line_limit: usize,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            line_limit: DEFAULT_LINE_LIMIT,
        }
    }
}

/// Timestamp settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TimestampConfig {
    /// Fixed offset from UTC in whole hours
    /// Default: 3
    pub utc_offset_hours: i32,
}

impl Default for TimestampConfig {
    fn default() -> Self {
        Self {
            utc_offset_hours: 3,
        }
    }
}

/// Ingest session limits
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Consecutive write failures before the session fails (0 = never)
    /// Default: 100
    pub max_consecutive_write_failures: u64,

    /// Longest unterminated fragment kept before it is emitted as a line
    /// (0 = unbounded)
    /// Default: 64KB
    pub max_pending_bytes: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_consecutive_write_failures: 100,
            max_pending_bytes: 64 * 1024,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rotation_defaults() {
        let config = RotationConfig::default();
        assert_eq!(config.period_minutes, DEFAULT_PERIOD_MINUTES);
        assert_eq!(config.max_lines_per_file, DEFAULT_MAX_LINES_PER_FILE);
    }

    #[test]
    fn test_partial_rotation_keeps_defaults() {
        let config: RotationConfig = toml::from_str("period_minutes = 0").unwrap();
        assert_eq!(config.period_minutes, 0);
        assert_eq!(config.max_lines_per_file, DEFAULT_MAX_LINES_PER_FILE);
    }

    #[test]
    fn test_session_defaults() {
        let config = SessionConfig::default();
        assert_eq!(config.max_consecutive_write_failures, 100);
        assert_eq!(config.max_pending_bytes, 64 * 1024);
    }

    #[test]
    fn test_negative_offset() {
        let config: TimestampConfig = toml::from_str("utc_offset_hours = -7").unwrap();
        assert_eq!(config.utc_offset_hours, -7);
    }
}
