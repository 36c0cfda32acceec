//! comlog Pipeline - Capture sessions
//!
//! Connects a source to the record sink and the display buffer, and exposes
//! the session as a small state machine driven by commands.
//!
//! # Architecture
//!
//! ```text
//!                 SessionController (start / stop / settings)
//!                        │ CancellationToken
//!                        v
//! [Source] ──chunks──> IngestLoop ──> LineAssembler ──> Timestamper
//!                        │                                  │
//!                        │                  ┌───────────────┴──────────┐
//!                        │                  v                          v
//!                        │            RecordSink (CSV)         SharedDisplay
//!                        └── rotation / flush ticks ──┘
//! ```
//!
//! # Key Design
//!
//! - **Single owner**: the ingest task owns the source, the sink and the
//!   rotation timer; rotation and writes never overlap
//! - **Cancel-safe stop**: `stop` cancels the pending read, then the file is
//!   closed and the source released
//! - **Errors as events**: failures inside a session become `Notice` events
//!   and `error: ` lines on the display; only commands return `Err`
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use comlog_pipeline::{SessionController, SessionSettings};
//! use comlog_sources::DeviceSourceProvider;
//!
//! let provider = Arc::new(DeviceSourceProvider::new("/dev/ttyUSB0", 4096));
//! let controller = SessionController::new(provider, SessionSettings::default())?;
//!
//! controller.start().await?;
//! tokio::signal::ctrl_c().await?;
//! let summary = controller.stop().await?;
//! println!("{} records written", summary.sink.records_written);
//! ```

mod controller;
mod error;
mod events;
mod ingest;
mod metrics;
mod settings;
mod state;

pub use controller::SessionController;
pub use error::{PipelineError, Result};
pub use events::{EndReason, SessionEvent, SessionSummary};
pub use ingest::ERROR_PREFIX;
pub use metrics::{SourceMetrics, SourceMetricsSnapshot};
pub use settings::SessionSettings;
pub use state::{Controls, SessionState};

/// Capacity of the session event channel
pub const DEFAULT_EVENT_CAPACITY: usize = 1024;
