//! Config command - Validate and print the effective configuration

use anyhow::{Context, Result};
use clap::Args;
use comlog_config::{Config, FileErrorPolicy, SourceKind};

/// Config command arguments
#[derive(Args, Debug, Default)]
pub struct ConfigArgs {
    /// Only validate, print nothing on success
    #[arg(long)]
    pub check: bool,
}

/// Run the config command
pub fn run(config: &Config, args: ConfigArgs) -> Result<()> {
    config.validate().context("invalid configuration")?;

    if !args.check {
        for line in describe(config) {
            println!("{line}");
        }
    }
    Ok(())
}

/// One human-readable line per setting group
pub fn describe(config: &Config) -> Vec<String> {
    let source = match config.source.kind {
        SourceKind::Device => format!(
            "device {}",
            config.source.path.as_deref().unwrap_or("(unset)")
        ),
        SourceKind::Tcp => format!(
            "tcp {}",
            config.source.address.as_deref().unwrap_or("(unset)")
        ),
        SourceKind::Stdin => "stdin".to_string(),
    };

    let rotation = if config.rotation.period_minutes > 0 {
        format!("every {} minutes", config.rotation.period_minutes)
    } else {
        format!("every {} lines", config.rotation.max_lines_per_file)
    };

    let on_error = match config.output.on_file_error {
        FileErrorPolicy::Continue => "continue",
        FileErrorPolicy::Abort => "abort",
    };

    vec![
        format!("source:     {source}"),
        format!(
            "output:     {}/{}<timestamp>.csv (on file error: {on_error})",
            config.output.directory, config.output.file_prefix
        ),
        format!("rotation:   {rotation}"),
        format!("display:    {} lines", config.display.line_limit),
        format!("timestamps: UTC{:+}", config.timestamp.utc_offset_hours),
        format!("log level:  {}", config.log.level.filter_directive()),
    ]
}
