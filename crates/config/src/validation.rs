//! Configuration validation
//!
//! Validates config consistency:
//! - The selected source has the field it needs
//! - Sizes and limits are non-zero where zero makes no sense
//! - The rotation period fits a timer
//! - The UTC offset is representable

use crate::Config;
use crate::capture::MAX_PERIOD_MINUTES;
use crate::error::{ConfigError, Result};
use crate::source::SourceKind;

/// Validate the entire configuration
pub fn validate_config(config: &Config) -> Result<()> {
    validate_source(config)?;
    validate_output(config)?;
    validate_capture(config)?;
    Ok(())
}

fn validate_source(config: &Config) -> Result<()> {
    let source = &config.source;

    match source.kind {
        SourceKind::Device if source.path.as_deref().is_none_or(str::is_empty) => {
            return Err(ConfigError::missing_field("source", "path"));
        }
        SourceKind::Tcp if source.address.as_deref().is_none_or(str::is_empty) => {
            return Err(ConfigError::missing_field("source", "address"));
        }
        _ => {}
    }

    if source.read_buffer_size == 0 {
        return Err(ConfigError::invalid_value(
            "source",
            "read_buffer_size",
            "must be greater than 0",
        ));
    }

    Ok(())
}

fn validate_output(config: &Config) -> Result<()> {
    let output = &config.output;

    if output.directory.is_empty() {
        return Err(ConfigError::missing_field("output", "directory"));
    }

    if output.file_prefix.contains(['/', '\\']) {
        return Err(ConfigError::invalid_value(
            "output",
            "file_prefix",
            "must not contain path separators",
        ));
    }

    if output.buffer_size == 0 {
        return Err(ConfigError::invalid_value(
            "output",
            "buffer_size",
            "must be greater than 0",
        ));
    }

    if output.flush_interval_ms == 0 {
        return Err(ConfigError::invalid_value(
            "output",
            "flush_interval_ms",
            "must be greater than 0",
        ));
    }

    Ok(())
}

fn validate_capture(config: &Config) -> Result<()> {
    let period = config.rotation.period_minutes;
    if period > MAX_PERIOD_MINUTES {
        return Err(ConfigError::invalid_value(
            "rotation",
            "period_minutes",
            format!("{period} exceeds the maximum of {MAX_PERIOD_MINUTES}"),
        ));
    }

    if config.rotation.max_lines_per_file == 0 {
        return Err(ConfigError::invalid_value(
            "rotation",
            "max_lines_per_file",
            "must be greater than 0",
        ));
    }

    if config.display.line_limit == 0 {
        return Err(ConfigError::invalid_value(
            "display",
            "line_limit",
            "must be at least 1",
        ));
    }

    let offset = config.timestamp.utc_offset_hours;
    if !(-23..=23).contains(&offset) {
        return Err(ConfigError::invalid_value(
            "timestamp",
            "utc_offset_hours",
            format!("{offset} is outside -23..=23"),
        ));
    }

    Ok(())
}
