//! Pipeline error types
//!
//! Errors returned by session commands. Failures inside a running session
//! are never returned here; they surface as events and display notices.

use thiserror::Error;

use comlog_sinks::SinkError;
use comlog_sources::SourceError;

use crate::state::SessionState;

/// Pipeline errors
#[derive(Debug, Error)]
pub enum PipelineError {
    /// `start` while a session is not idle
    #[error("a session is already active (state: {state})")]
    AlreadyRunning { state: SessionState },

    /// `stop` while no session is streaming
    #[error("no session is streaming (state: {state})")]
    NotRunning { state: SessionState },

    /// The source could not be opened
    #[error("source unavailable: {0}")]
    SourceAcquisition(#[source] SourceError),

    /// The first output file could not be created and the policy is abort
    #[error("cannot create output file: {0}")]
    FileCreation(#[source] SinkError),

    /// A setting was rejected
    #[error("invalid {setting}: {message}")]
    InvalidSetting {
        setting: &'static str,
        message: String,
    },
}

impl PipelineError {
    /// Create an invalid setting error
    pub fn invalid_setting(setting: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidSetting {
            setting,
            message: message.into(),
        }
    }
}

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PipelineError::AlreadyRunning {
            state: SessionState::Streaming,
        };
        assert!(err.to_string().contains("streaming"));

        let err = PipelineError::NotRunning {
            state: SessionState::Idle,
        };
        assert!(err.to_string().contains("idle"));

        let err = PipelineError::FileCreation(SinkError::NoCurrentFile);
        assert!(err.to_string().contains("no output file"));

        let err = PipelineError::invalid_setting("display limit", "must be at least 1");
        assert_eq!(err.to_string(), "invalid display limit: must be at least 1");
    }
}
