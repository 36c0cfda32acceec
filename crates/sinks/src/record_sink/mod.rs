//! Record sink
//!
//! Appends timestamped records to the current CSV file and moves to a fresh
//! file on request.
//!
//! # File Layout
//!
//! ```text
//! logs/
//! ├── com_log_2025-01-15_13-30-45.csv
//! ├── com_log_2025-01-15_13-50-45.csv
//! └── com_log_2025-01-15_13-50-45_1.csv   # second file in the same second
//! ```
//!
//! Every file starts with the `Timestamp,Message` header. A file is created
//! once, written until it is superseded, and never reopened.
//!
//! # Stalled Persistence
//!
//! When no file can be created the sink has no current file. Writes are
//! rejected with `SinkError::NoCurrentFile` until a later `open` or `rotate`
//! succeeds.

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use comlog_protocol::{CSV_HEADER, Record, Timestamper};

use crate::destination::Destination;
use crate::error::{Result, SinkError};
use crate::metrics::SinkMetrics;
use crate::rotation::RotationState;
use crate::util::{ChainWrite, ChainWriter, RateLimitedLogger};

/// Upper bound on `_N` suffixes tried for one timestamp
const MAX_NAME_COLLISIONS: u32 = 1000;

/// Default file name prefix
pub const DEFAULT_FILE_PREFIX: &str = "com_log_";

struct OpenFile {
    path: PathBuf,
    chain: Box<dyn ChainWrite>,
    state: RotationState,
}

/// Rotating CSV sink
///
/// Owned by exactly one task; nothing in here is shared except the metrics.
pub struct RecordSink {
    destination: Arc<dyn Destination>,
    chain_writer: Arc<dyn ChainWriter>,
    timestamper: Timestamper,
    file_prefix: String,
    current: Option<OpenFile>,
    line_buf: String,
    metrics: Arc<SinkMetrics>,
    error_logger: RateLimitedLogger,
}

impl RecordSink {
    pub fn new(
        destination: Arc<dyn Destination>,
        chain_writer: Arc<dyn ChainWriter>,
        timestamper: Timestamper,
    ) -> Self {
        Self {
            destination,
            chain_writer,
            timestamper,
            file_prefix: DEFAULT_FILE_PREFIX.to_string(),
            current: None,
            line_buf: String::with_capacity(256),
            metrics: Arc::new(SinkMetrics::new()),
            error_logger: RateLimitedLogger::default(),
        }
    }

    /// Set the file name prefix
    pub fn with_file_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.file_prefix = prefix.into();
        self
    }

    /// Create the next file and write its header
    ///
    /// Any file still open is closed first. On failure the sink is left
    /// without a current file.
    pub fn open(&mut self) -> Result<&Path> {
        self.close_current();

        let (path, file) = match self.create_file() {
            Ok(created) => created,
            Err(e) => {
                self.metrics.open_failed();
                return Err(SinkError::file_creation(self.destination.describe(), e));
            }
        };

        let mut chain = match self.chain_writer.wrap(file) {
            Ok(chain) => chain,
            Err(e) => {
                self.metrics.open_failed();
                return Err(SinkError::file_creation(self.destination.describe(), e));
            }
        };

        let header = format!("{CSV_HEADER}\n");
        if let Err(e) = chain.write_all(header.as_bytes()) {
            self.metrics.open_failed();
            drop(chain);
            if let Err(remove_err) = std::fs::remove_file(&path) {
                tracing::warn!(
                    path = %path.display(),
                    error = %remove_err,
                    "failed to remove output file without header"
                );
            }
            return Err(SinkError::write(path, e));
        }
        self.metrics.header_written(header.len() as u64);
        self.metrics.file_opened();

        tracing::info!(path = %path.display(), "opened output file");
        self.error_logger.reset();

        let current = self.current.insert(OpenFile {
            path,
            chain,
            state: RotationState::new(),
        });
        Ok(current.path.as_path())
    }

    /// Append one record to the current file
    pub fn write(&mut self, record: &Record) -> Result<()> {
        let Some(current) = self.current.as_mut() else {
            return Err(SinkError::NoCurrentFile);
        };

        self.line_buf.clear();
        record.write_csv_line(&mut self.line_buf);

        match current.chain.write_all(self.line_buf.as_bytes()) {
            Ok(()) => {
                current.state.lines_in_file += 1;
                self.metrics.record_written(self.line_buf.len() as u64);
                Ok(())
            }
            Err(e) => {
                self.metrics.write_error();
                self.error_logger.error("record write failed", &e);
                Err(SinkError::write(current.path.clone(), e))
            }
        }
    }

    /// Close the current file and open the next one
    ///
    /// A failed close is logged and does not prevent the open. With no
    /// current file this is a plain `open`, which is how stalled
    /// persistence recovers.
    pub fn rotate(&mut self) -> Result<PathBuf> {
        let had_file = self.current.is_some();
        let path = self.open()?.to_path_buf();
        if had_file {
            self.metrics.rotated();
        }
        Ok(path)
    }

    /// Flush buffered records to the current file
    pub fn flush(&mut self) -> Result<()> {
        match self.current.as_mut() {
            Some(current) => current
                .chain
                .flush_all()
                .map_err(|e| SinkError::write(current.path.clone(), e)),
            None => Ok(()),
        }
    }

    /// Flush and finish the current file; no-op when none is open
    pub fn close(&mut self) -> Result<()> {
        let Some(current) = self.current.take() else {
            return Ok(());
        };

        let lines = current.state.lines_in_file;
        let bytes = current.chain.bytes_written();
        let unlogged = self.error_logger.pending_error_count();
        if unlogged > 0 {
            tracing::warn!(
                path = %current.path.display(),
                errors = unlogged,
                "record write failures not logged individually"
            );
        }

        match current.chain.finish() {
            Ok(()) => {
                tracing::info!(path = %current.path.display(), lines, bytes, "closed output file");
                Ok(())
            }
            Err(e) => Err(SinkError::close(current.path, e)),
        }
    }

    pub fn current_path(&self) -> Option<&Path> {
        self.current.as_ref().map(|c| c.path.as_path())
    }

    /// Records in the current file; 0 when none is open
    pub fn lines_in_file(&self) -> u64 {
        self.current.as_ref().map_or(0, |c| c.state.lines_in_file)
    }

    pub fn rotation_state(&self) -> Option<RotationState> {
        self.current.as_ref().map(|c| c.state)
    }

    pub fn is_open(&self) -> bool {
        self.current.is_some()
    }

    pub fn metrics(&self) -> &Arc<SinkMetrics> {
        &self.metrics
    }

    fn close_current(&mut self) {
        if let Err(e) = self.close() {
            tracing::warn!(error = %e, "failed to close superseded file");
        }
    }

    fn create_file(&self) -> io::Result<(PathBuf, std::fs::File)> {
        let base = format!("{}{}", self.file_prefix, self.timestamper.now());
        let extension = self.chain_writer.file_extension();

        let mut last_err = None;
        for attempt in 0..MAX_NAME_COLLISIONS {
            let file_name = if attempt == 0 {
                format!("{base}{extension}")
            } else {
                format!("{base}_{attempt}{extension}")
            };

            match self.destination.create(&file_name) {
                Ok(created) => return Ok(created),
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => last_err = Some(e),
                Err(e) => return Err(e),
            }
        }

        Err(last_err.unwrap_or_else(|| io::Error::other("no free file name")))
    }
}

impl Drop for RecordSink {
    fn drop(&mut self) {
        self.close_current();
    }
}
