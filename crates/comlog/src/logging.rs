//! Tracing subscriber setup

use std::fs::OpenOptions;
use std::sync::Arc;

use anyhow::{Context, Result};
use comlog_config::{LogConfig, LogFormat, LogOutput};
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{EnvFilter, Layer, fmt, prelude::*};

/// Resolve log level: CLI flag > config file
pub fn resolve_log_level(cli_level: Option<&str>, config: &LogConfig) -> String {
    cli_level
        .map(str::to_string)
        .unwrap_or_else(|| config.level.filter_directive().to_string())
}

/// Initialize the tracing subscriber for logging
pub fn init_logging(config: &LogConfig, cli_level: Option<&str>) -> Result<()> {
    let level = resolve_log_level(cli_level, config);
    let filter = EnvFilter::try_new(&level)
        .or_else(|_| EnvFilter::try_new("info"))
        .map_err(|e| anyhow::anyhow!("invalid log level: {}", e))?;

    let writer = match &config.output {
        LogOutput::Stdout => BoxMakeWriter::new(std::io::stdout),
        LogOutput::Stderr => BoxMakeWriter::new(std::io::stderr),
        LogOutput::File(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("failed to open log file {}", path.display()))?;
            BoxMakeWriter::new(Arc::new(file))
        }
    };

    let layer = match config.format {
        LogFormat::Console => fmt::layer()
            .with_target(true)
            .with_thread_ids(false)
            .with_ansi(config.output.supports_ansi())
            .with_writer(writer)
            .boxed(),
        LogFormat::Json => fmt::layer().json().with_writer(writer).boxed(),
    };

    tracing_subscriber::registry().with(layer).with(filter).init();

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use comlog_config::LogLevel;

    #[test]
    fn test_cli_level_wins() {
        let config = LogConfig {
            level: LogLevel::Warn,
            ..Default::default()
        };
        assert_eq!(resolve_log_level(Some("debug"), &config), "debug");
        assert_eq!(resolve_log_level(None, &config), "warn");
    }
}
