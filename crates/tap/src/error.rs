//! Error types for the tap crate

use thiserror::Error;

/// Errors raised by the display buffer
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TapError {
    /// Capacity must hold at least one line
    #[error("display capacity must be at least 1, got {requested}")]
    InvalidCapacity { requested: usize },
}

/// Result type for tap operations
pub type Result<T> = std::result::Result<T, TapError>;
