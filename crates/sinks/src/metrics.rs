//! Sink metrics

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters maintained by the record sink
///
/// Shared behind an `Arc` so the session summary can read them after the
/// sink itself is gone.
#[derive(Debug, Default)]
pub struct SinkMetrics {
    /// Records written to a file
    pub records_written: AtomicU64,

    /// Bytes written, headers included
    pub bytes_written: AtomicU64,

    /// Failed record writes (stalled rejections are not counted)
    pub write_errors: AtomicU64,

    /// Files successfully created
    pub files_opened: AtomicU64,

    /// Rotations from one file to the next
    pub rotations: AtomicU64,

    /// Failed attempts to create a file
    pub open_failures: AtomicU64,
}

impl SinkMetrics {
    /// Create new metrics instance
    pub const fn new() -> Self {
        Self {
            records_written: AtomicU64::new(0),
            bytes_written: AtomicU64::new(0),
            write_errors: AtomicU64::new(0),
            files_opened: AtomicU64::new(0),
            rotations: AtomicU64::new(0),
            open_failures: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn record_written(&self, bytes: u64) {
        self.records_written.fetch_add(1, Ordering::Relaxed);
        self.bytes_written.fetch_add(bytes, Ordering::Relaxed);
    }

    #[inline]
    pub fn header_written(&self, bytes: u64) {
        self.bytes_written.fetch_add(bytes, Ordering::Relaxed);
    }

    #[inline]
    pub fn write_error(&self) {
        self.write_errors.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn file_opened(&self) {
        self.files_opened.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn rotated(&self) {
        self.rotations.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn open_failed(&self) {
        self.open_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot of all metrics
    pub fn snapshot(&self) -> SinkMetricsSnapshot {
        SinkMetricsSnapshot {
            records_written: self.records_written.load(Ordering::Relaxed),
            bytes_written: self.bytes_written.load(Ordering::Relaxed),
            write_errors: self.write_errors.load(Ordering::Relaxed),
            files_opened: self.files_opened.load(Ordering::Relaxed),
            rotations: self.rotations.load(Ordering::Relaxed),
            open_failures: self.open_failures.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time snapshot of sink metrics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SinkMetricsSnapshot {
    pub records_written: u64,
    pub bytes_written: u64,
    pub write_errors: u64,
    pub files_opened: u64,
    pub rotations: u64,
    pub open_failures: u64,
}
