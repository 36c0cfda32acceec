//! comlog - Serial line logger
//!
//! # Usage
//!
//! ```bash
//! # Capture stdin (default)
//! some-tool | comlog
//!
//! # Capture a serial device into ./logs, new file every 20 minutes
//! comlog capture --device /dev/ttyUSB0
//!
//! # Capture a ser2net bridge, new file every 1000 lines
//! comlog capture --tcp 10.0.0.5:4001 --period 0 --max-lines 1000
//!
//! # Check a configuration file
//! comlog --config comlog.toml config
//! ```

mod cmd;
mod logging;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use comlog_config::Config;

/// Configuration file used when `--config` is not given
const DEFAULT_CONFIG_PATH: &str = "comlog.toml";

/// comlog - Serial line logger
#[derive(Parser, Debug)]
#[command(name = "comlog")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Path to configuration file (error if specified but not found)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error). Overrides config file.
    #[arg(short, long, global = true)]
    log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Capture lines into rotating CSV files (default)
    Capture(cmd::capture::CaptureArgs),

    /// Validate and print the effective configuration
    Config(cmd::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = load_config(cli.config.as_deref())?;

    match cli.command {
        Some(Command::Config(args)) => {
            // Config output goes to stdout, no logging needed
            cmd::config::run(&config, args)
        }
        Some(Command::Capture(args)) => {
            args.apply(&mut config);
            config.validate().context("invalid configuration")?;
            logging::init_logging(&config.log, cli.log_level.as_deref())?;
            cmd::capture::run(config, args.quiet).await
        }
        None => {
            config.validate().context("invalid configuration")?;
            logging::init_logging(&config.log, cli.log_level.as_deref())?;
            cmd::capture::run(config, false).await
        }
    }
}

/// Load the explicit config file (must exist), else `comlog.toml` if present
fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => {
            if !path.exists() {
                return Err(anyhow::anyhow!("config file not found: {}", path.display()));
            }
            Config::from_file(path).context("failed to load configuration")
        }
        None => Config::from_file_or_default(DEFAULT_CONFIG_PATH)
            .context("failed to load configuration"),
    }
}
