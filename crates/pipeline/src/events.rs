//! Session events
//!
//! Published on a broadcast channel. A UI surface subscribes to follow the
//! session without touching its internals; slow subscribers lag rather than
//! block the ingest task.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use comlog_sinks::SinkMetricsSnapshot;

use crate::metrics::SourceMetricsSnapshot;
use crate::state::SessionState;

/// Something observable happened in the session
#[derive(Debug, Clone)]
pub enum SessionEvent {
    StateChanged {
        from: SessionState,
        to: SessionState,
    },
    /// A new output file became current
    FileOpened(PathBuf),
    /// An output file was superseded or the session ended
    FileClosed(PathBuf),
    /// A line was captured, rendered as `timestamp,message`
    Line(String),
    /// A user-visible error
    Notice(String),
    /// The session ended
    Finished(SessionSummary),
}

/// Why a session ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EndReason {
    /// `stop` was called
    Stopped,
    /// The source reported end of stream
    SourceClosed,
    /// Reading from the source failed
    ReadError(String),
    /// Too many consecutive record writes failed
    WriteFailures(u64),
    /// The ingest task ended without reporting
    Aborted,
}

impl EndReason {
    /// True for endings that pass through `Failed`
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            Self::ReadError(_) | Self::WriteFailures(_) | Self::Aborted
        )
    }
}

impl fmt::Display for EndReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stopped => f.write_str("stopped"),
            Self::SourceClosed => f.write_str("source closed"),
            Self::ReadError(e) => write!(f, "read error: {e}"),
            Self::WriteFailures(n) => write!(f, "{n} consecutive write failures"),
            Self::Aborted => f.write_str("aborted"),
        }
    }
}

/// What a finished session did
#[derive(Debug, Clone)]
pub struct SessionSummary {
    pub session_id: u64,
    pub reason: EndReason,
    /// Output files in the order they were opened
    pub files: Vec<PathBuf>,
    pub source: SourceMetricsSnapshot,
    pub sink: SinkMetricsSnapshot,
    pub duration: Duration,
}

impl SessionSummary {
    pub(crate) fn aborted(session_id: u64) -> Self {
        Self {
            session_id,
            reason: EndReason::Aborted,
            files: Vec::new(),
            source: SourceMetricsSnapshot::default(),
            sink: SinkMetricsSnapshot::default(),
            duration: Duration::ZERO,
        }
    }
}
