//! Protocol error types

use thiserror::Error;

/// Errors produced while building protocol values
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
    /// UTC offset outside the range chrono can represent
    #[error("invalid UTC offset: {hours} hours (expected -23..=23)")]
    InvalidOffset {
        /// Requested offset in hours
        hours: i32,
    },
}
