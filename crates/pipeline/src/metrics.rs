//! Source-side session metrics
//!
//! Atomic counters for what the ingest loop pulled from the source.
//! Sink-side counters live in `comlog_sinks::SinkMetrics`.

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for one session's input
#[derive(Debug, Default)]
pub struct SourceMetrics {
    /// Chunks received from the source
    chunks_read: AtomicU64,

    /// Bytes received (UTF-8 length of the chunks)
    bytes_read: AtomicU64,

    /// Complete lines produced by the assembler
    lines_assembled: AtomicU64,

    /// Lines cut because no terminator arrived in time
    forced_splits: AtomicU64,
}

impl SourceMetrics {
    #[inline]
    pub const fn new() -> Self {
        Self {
            chunks_read: AtomicU64::new(0),
            bytes_read: AtomicU64::new(0),
            lines_assembled: AtomicU64::new(0),
            forced_splits: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn record_chunk(&self, bytes: u64) {
        self.chunks_read.fetch_add(1, Ordering::Relaxed);
        self.bytes_read.fetch_add(bytes, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_lines(&self, count: u64) {
        self.lines_assembled.fetch_add(count, Ordering::Relaxed);
    }

    #[inline]
    pub fn set_forced_splits(&self, count: u64) {
        self.forced_splits.store(count, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> SourceMetricsSnapshot {
        SourceMetricsSnapshot {
            chunks_read: self.chunks_read.load(Ordering::Relaxed),
            bytes_read: self.bytes_read.load(Ordering::Relaxed),
            lines_assembled: self.lines_assembled.load(Ordering::Relaxed),
            forced_splits: self.forced_splits.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time snapshot of source metrics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SourceMetricsSnapshot {
    pub chunks_read: u64,
    pub bytes_read: u64,
    pub lines_assembled: u64,
    pub forced_splits: u64,
}
