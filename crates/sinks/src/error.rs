//! Sink error types

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by the record sink
#[derive(Debug, Error)]
pub enum SinkError {
    /// A write was attempted while persistence is stalled
    #[error("no output file is open")]
    NoCurrentFile,

    /// The next output file could not be created
    #[error("failed to create output file in {destination}: {source}")]
    FileCreation {
        destination: String,
        #[source]
        source: io::Error,
    },

    /// Writing or flushing the current file failed
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Finishing the current file failed
    #[error("failed to close {path}: {source}")]
    Close {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl SinkError {
    /// Create a file creation error
    pub fn file_creation(destination: impl Into<String>, source: io::Error) -> Self {
        Self::FileCreation {
            destination: destination.into(),
            source,
        }
    }

    /// Create a write error
    pub fn write(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Write {
            path: path.into(),
            source,
        }
    }

    /// Create a close error
    pub fn close(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Close {
            path: path.into(),
            source,
        }
    }

    /// True when the sink rejected the write because nothing is open
    pub fn is_stalled(&self) -> bool {
        matches!(self, Self::NoCurrentFile)
    }
}

/// Result type for sink operations
pub type Result<T> = std::result::Result<T, SinkError>;
