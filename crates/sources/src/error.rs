//! Source error types

use std::io;

use thiserror::Error;

/// Result type for source operations
pub type Result<T> = std::result::Result<T, SourceError>;

/// Errors raised while opening, reading or releasing a source
#[derive(Debug, Error)]
pub enum SourceError {
    /// Device/stream could not be opened (missing, denied, refused)
    #[error("failed to open source {target}: {source}")]
    Acquisition {
        /// What was being opened
        target: String,
        #[source]
        source: io::Error,
    },

    /// Read failed after the source was open
    #[error("read from {target} failed: {source}")]
    Read {
        /// Source description
        target: String,
        #[source]
        source: io::Error,
    },

    /// Releasing the source failed
    #[error("failed to release {target}: {source}")]
    Release {
        /// Source description
        target: String,
        #[source]
        source: io::Error,
    },
}

impl SourceError {
    /// Create an Acquisition error
    pub fn acquisition(target: impl Into<String>, source: io::Error) -> Self {
        Self::Acquisition {
            target: target.into(),
            source,
        }
    }

    /// Create a Read error
    pub fn read(target: impl Into<String>, source: io::Error) -> Self {
        Self::Read {
            target: target.into(),
            source,
        }
    }

    /// Create a Release error
    pub fn release(target: impl Into<String>, source: io::Error) -> Self {
        Self::Release {
            target: target.into(),
            source,
        }
    }
}
