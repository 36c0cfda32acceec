//! comlog Sinks - Durable persistence of timestamped records
//!
//! # Components
//!
//! - **RecordSink** - Appends records to the current CSV file, rotates on request
//! - **RotationPolicy** - Decides when to rotate (timed or by line count)
//! - **Destination** - Creates new, never-reopened output files
//! - **ChainWriter** - Buffering strategy wrapped around each file
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use comlog_protocol::{Record, Timestamper};
//! use comlog_sinks::{DirectoryDestination, PlainTextWriter, RecordSink, RotationPolicy};
//!
//! let mut sink = RecordSink::new(
//!     Arc::new(DirectoryDestination::new("logs", true)),
//!     Arc::new(PlainTextWriter::default()),
//!     Timestamper::system(),
//! );
//! let policy = RotationPolicy::new(0, 500_000);
//!
//! sink.open()?;
//! sink.write(&Record::new("2025-01-15_13-30-45", "hello"))?;
//! if let Some(state) = sink.rotation_state() {
//!     if policy.should_rotate_after_write(&state) {
//!         sink.rotate()?;
//!     }
//! }
//! ```

mod destination;
mod error;
mod metrics;
mod record_sink;
mod rotation;

pub mod util;

pub use destination::{Destination, DirectoryDestination};
pub use error::{Result, SinkError};
pub use metrics::{SinkMetrics, SinkMetricsSnapshot};
pub use record_sink::{DEFAULT_FILE_PREFIX, RecordSink};
pub use rotation::{RotationMode, RotationPolicy, RotationState, RotationTrigger};
pub use util::{ChainWrite, ChainWriter, PlainTextWriter};
