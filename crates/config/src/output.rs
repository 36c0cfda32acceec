//! Output file configuration

use serde::Deserialize;

/// What to do when the first output file of a session cannot be created
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FileErrorPolicy {
    /// Keep streaming to the display with persistence stalled (default)
    #[default]
    Continue,
    /// Release the source and return to idle
    Abort,
}

/// Output configuration
///
/// ```toml
/// [output]
/// directory = "logs"
/// file_prefix = "com_log_"
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory receiving CSV files
    /// Default: logs
    pub directory: String,

    /// File name prefix, followed by the timestamp and `.csv`
    /// Default: com_log_
    pub file_prefix: String,

    /// Write buffer size in bytes
    /// Default: 64KB
    pub buffer_size: usize,

    /// Create the directory if it does not exist
    /// Default: true
    pub create_dirs: bool,

    /// Interval between flushes of the write buffer, in milliseconds
    /// Default: 1000
    pub flush_interval_ms: u64,

    /// Behaviour when the first file cannot be created
    /// Default: continue
    pub on_file_error: FileErrorPolicy,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: "logs".into(),
            file_prefix: "com_log_".into(),
            buffer_size: 64 * 1024,
            create_dirs: true,
            flush_interval_ms: 1000,
            on_file_error: FileErrorPolicy::Continue,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = OutputConfig::default();
        assert_eq!(config.directory, "logs");
        assert_eq!(config.buffer_size, 64 * 1024);
        assert!(config.create_dirs);
        assert_eq!(config.flush_interval_ms, 1000);
        assert_eq!(config.on_file_error, FileErrorPolicy::Continue);
    }

    #[test]
    fn test_deserialize_policy() {
        let config: OutputConfig = toml::from_str("on_file_error = \"abort\"").unwrap();
        assert_eq!(config.on_file_error, FileErrorPolicy::Abort);
        assert_eq!(config.file_prefix, "com_log_");
    }
}
