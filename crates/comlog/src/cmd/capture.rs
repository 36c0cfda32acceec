//! Capture command - Stream a source into rotating CSV files
//!
//! Captured lines are echoed to stdout as `timestamp,message`; notices and
//! file changes go to stderr. Runs until the source closes or Ctrl-C.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use comlog_config::{Config, SourceConfig, SourceKind};
use comlog_pipeline::{SessionController, SessionEvent, SessionSettings, SessionSummary};
use comlog_sources::{
    DeviceSourceProvider, SourceProvider, StdinSourceProvider, TcpSourceProvider,
};
use tokio::signal;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{info, warn};

/// Capture command arguments
///
/// Every flag overrides the matching configuration value.
#[derive(Args, Debug, Default)]
pub struct CaptureArgs {
    /// Read from a serial device or file
    #[arg(long, conflicts_with_all = ["tcp", "stdin"])]
    pub device: Option<String>,

    /// Read from a serial-over-TCP bridge (host:port)
    #[arg(long, conflicts_with = "stdin")]
    pub tcp: Option<String>,

    /// Read from standard input
    #[arg(long)]
    pub stdin: bool,

    /// Directory receiving CSV files
    #[arg(short, long)]
    pub dir: Option<String>,

    /// File name prefix
    #[arg(long)]
    pub prefix: Option<String>,

    /// Rotation period in minutes (0 = rotate by line count)
    #[arg(long)]
    pub period: Option<u64>,

    /// Records per file in line-count mode
    #[arg(long)]
    pub max_lines: Option<u64>,

    /// Lines kept in the live display
    #[arg(long)]
    pub lines: Option<usize>,

    /// Timestamp offset from UTC in whole hours
    #[arg(long, allow_hyphen_values = true)]
    pub utc_offset: Option<i32>,

    /// Do not echo captured lines to stdout
    #[arg(short, long)]
    pub quiet: bool,
}

impl CaptureArgs {
    /// Apply command-line overrides to the loaded configuration
    pub fn apply(&self, config: &mut Config) {
        if let Some(path) = &self.device {
            config.source.kind = SourceKind::Device;
            config.source.path = Some(path.clone());
        }
        if let Some(address) = &self.tcp {
            config.source.kind = SourceKind::Tcp;
            config.source.address = Some(address.clone());
        }
        if self.stdin {
            config.source.kind = SourceKind::Stdin;
        }
        if let Some(dir) = &self.dir {
            config.output.directory = dir.clone();
        }
        if let Some(prefix) = &self.prefix {
            config.output.file_prefix = prefix.clone();
        }
        if let Some(period) = self.period {
            config.rotation.period_minutes = period;
        }
        if let Some(max_lines) = self.max_lines {
            config.rotation.max_lines_per_file = max_lines;
        }
        if let Some(lines) = self.lines {
            config.display.line_limit = lines;
        }
        if let Some(offset) = self.utc_offset {
            config.timestamp.utc_offset_hours = offset;
        }
    }
}

/// Run the capture command
pub async fn run(config: Config, quiet: bool) -> Result<()> {
    let provider = build_provider(&config.source)?;
    let settings = SessionSettings::from_config(&config);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        source = %provider.describe(),
        directory = %settings.directory.display(),
        "comlog starting"
    );

    let controller = SessionController::new(provider, settings)?;
    let printer = tokio::spawn(print_events(controller.subscribe(), quiet));

    controller.start().await.context("failed to start capture")?;

    let summary = tokio::select! {
        summary = controller.wait() => summary,
        _ = signal::ctrl_c() => {
            info!("interrupt received, stopping");
            match controller.stop().await {
                Ok(summary) => Some(summary),
                Err(e) => {
                    // the session ended on its own in the meantime
                    warn!(error = %e, "stop after session end");
                    controller.last_summary()
                }
            }
        }
    };

    if let Err(e) = printer.await {
        warn!(error = %e, "event printer failed");
    }

    match summary {
        Some(summary) => report(&summary),
        None => Ok(()),
    }
}

/// Build the source named by the configuration
pub fn build_provider(source: &SourceConfig) -> Result<Arc<dyn SourceProvider>> {
    let provider: Arc<dyn SourceProvider> = match source.kind {
        SourceKind::Device => {
            let path = source
                .path
                .clone()
                .context("source.path is required for a device source")?;
            Arc::new(DeviceSourceProvider::new(path, source.read_buffer_size))
        }
        SourceKind::Tcp => {
            let address = source
                .address
                .clone()
                .context("source.address is required for a tcp source")?;
            Arc::new(TcpSourceProvider::new(address, source.read_buffer_size))
        }
        SourceKind::Stdin => Arc::new(StdinSourceProvider::new(source.read_buffer_size)),
    };
    Ok(provider)
}

/// Print events until the session finishes
async fn print_events(mut events: broadcast::Receiver<SessionEvent>, quiet: bool) {
    loop {
        match events.recv().await {
            Ok(SessionEvent::Line(line)) => {
                if !quiet {
                    println!("{line}");
                }
            }
            Ok(SessionEvent::Notice(message)) => eprintln!("error: {message}"),
            Ok(SessionEvent::FileOpened(path)) => eprintln!("writing {}", path.display()),
            Ok(SessionEvent::Finished(_)) | Err(RecvError::Closed) => break,
            Ok(SessionEvent::StateChanged { .. } | SessionEvent::FileClosed(_)) => {}
            Err(RecvError::Lagged(skipped)) => {
                warn!(skipped, "display fell behind, events skipped");
            }
        }
    }
}

fn report(summary: &SessionSummary) -> Result<()> {
    eprintln!(
        "session ended ({}): {} lines, {} records in {} file(s), {} write errors",
        summary.reason,
        summary.source.lines_assembled,
        summary.sink.records_written,
        summary.files.len(),
        summary.sink.write_errors,
    );

    if summary.reason.is_failure() {
        return Err(anyhow::anyhow!("capture failed: {}", summary.reason));
    }
    Ok(())
}
