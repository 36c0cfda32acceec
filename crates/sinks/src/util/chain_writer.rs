//! Chain writers
//!
//! A `ChainWriter` turns a freshly created output file into a `ChainWrite`:
//! the object the record sink appends to until the file is superseded.
//! Keeping this behind a trait lets the buffering strategy change without
//! touching rotation, and lets tests inject writers that fail on demand.
//!
//! ```ignore
//! use std::fs::File;
//! use comlog_sinks::util::{ChainWriter, PlainTextWriter};
//!
//! let writer = PlainTextWriter::new(64 * 1024);
//! let mut chain = writer.wrap(File::create("out.csv")?)?;
//! chain.write_all(b"Timestamp,Message\n")?;
//! chain.finish()?;
//! ```

use std::fs::File;
use std::io::{self, BufWriter, Write};

/// Default buffer size for writers (64KB)
pub const DEFAULT_BUFFER_SIZE: usize = 64 * 1024;

/// Factory for per-file writers
pub trait ChainWriter: Send + Sync {
    /// Wrap a file with this writer's buffering strategy
    fn wrap(&self, file: File) -> io::Result<Box<dyn ChainWrite>>;

    /// File extension including the dot
    fn file_extension(&self) -> &'static str;
}

/// Write handle for one output file
pub trait ChainWrite: Write + Send {
    /// Flush all buffered data to the underlying file
    fn flush_all(&mut self) -> io::Result<()>;

    /// Flush and release the file
    fn finish(self: Box<Self>) -> io::Result<()>;

    /// Bytes accepted so far
    fn bytes_written(&self) -> u64;
}

/// Buffered plain-text writer
///
/// Uses `BufWriter`; nothing reaches the disk until the buffer fills or the
/// sink flushes.
#[derive(Debug, Clone)]
pub struct PlainTextWriter {
    buffer_size: usize,
}

impl PlainTextWriter {
    /// Create a writer with the given buffer capacity
    pub fn new(buffer_size: usize) -> Self {
        Self { buffer_size }
    }
}

impl Default for PlainTextWriter {
    fn default() -> Self {
        Self::new(DEFAULT_BUFFER_SIZE)
    }
}

impl ChainWriter for PlainTextWriter {
    fn wrap(&self, file: File) -> io::Result<Box<dyn ChainWrite>> {
        Ok(Box::new(CsvChain {
            writer: BufWriter::with_capacity(self.buffer_size, file),
            bytes_written: 0,
        }))
    }

    fn file_extension(&self) -> &'static str {
        ".csv"
    }
}

struct CsvChain {
    writer: BufWriter<File>,
    bytes_written: u64,
}

impl Write for CsvChain {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.writer.write(buf)?;
        self.bytes_written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

impl ChainWrite for CsvChain {
    fn flush_all(&mut self) -> io::Result<()> {
        self.writer.flush()
    }

    fn finish(mut self: Box<Self>) -> io::Result<()> {
        self.writer.flush()?;
        self.writer.get_ref().sync_data()
    }

    fn bytes_written(&self) -> u64 {
        self.bytes_written
    }
}

#[cfg(test)]
#[path = "chain_writer_test.rs"]
mod chain_writer_test;
