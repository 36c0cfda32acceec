//! Session state machine
//!
//! ```text
//! Idle ──start──> Connecting ──source+file ready──> Streaming
//!  ^                  │                                │    │
//!  │          acquisition failed                      stop  read error /
//!  │                  │                                │    write ceiling
//!  └──────────────────┴──────── Stopping <─────────────┘    │
//!  └──────────────────────────── Failed <───────────────────┘
//! ```
//!
//! `Stopping` and `Failed` always drain to `Idle`.

use std::fmt;

use parking_lot::Mutex;
use tokio::sync::broadcast;

use crate::events::{SessionEvent, SessionSummary};

/// Lifecycle state of the capture session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SessionState {
    #[default]
    Idle,
    Connecting,
    Streaming,
    Stopping,
    Failed,
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Connecting => "connecting",
            Self::Streaming => "streaming",
            Self::Stopping => "stopping",
            Self::Failed => "failed",
        }
    }

    /// Which commands the state allows
    pub fn controls(&self) -> Controls {
        Controls {
            start_enabled: *self == Self::Idle,
            stop_enabled: *self == Self::Streaming,
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Enabled flags for the start and stop controls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Controls {
    pub start_enabled: bool,
    pub stop_enabled: bool,
}

/// State shared by the controller and the ingest task
///
/// Every transition is published as `SessionEvent::StateChanged`.
#[derive(Debug)]
pub(crate) struct SessionStatus {
    state: Mutex<SessionState>,
    last_summary: Mutex<Option<SessionSummary>>,
    events: broadcast::Sender<SessionEvent>,
}

impl SessionStatus {
    pub(crate) fn new(event_capacity: usize) -> Self {
        let (events, _) = broadcast::channel(event_capacity);
        Self {
            state: Mutex::new(SessionState::Idle),
            last_summary: Mutex::new(None),
            events,
        }
    }

    pub(crate) fn state(&self) -> SessionState {
        *self.state.lock()
    }

    /// Move to `to` only when the current state is `from`
    ///
    /// Returns the state that was found.
    pub(crate) fn transition_from(
        &self,
        from: SessionState,
        to: SessionState,
    ) -> std::result::Result<(), SessionState> {
        let mut state = self.state.lock();
        if *state != from {
            return Err(*state);
        }
        *state = to;
        drop(state);

        self.publish_transition(from, to);
        Ok(())
    }

    /// Move to `to` unconditionally
    pub(crate) fn transition(&self, to: SessionState) {
        let from = std::mem::replace(&mut *self.state.lock(), to);
        if from != to {
            self.publish_transition(from, to);
        }
    }

    pub(crate) fn emit(&self, event: SessionEvent) {
        // no subscribers is fine
        let _ = self.events.send(event);
    }

    pub(crate) fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub(crate) fn record_summary(&self, summary: SessionSummary) {
        *self.last_summary.lock() = Some(summary.clone());
        self.emit(SessionEvent::Finished(summary));
    }

    /// Store `summary` unless its session already has one, without
    /// publishing it
    ///
    /// Returns whether it was stored.
    pub(crate) fn store_summary_once(&self, summary: SessionSummary) -> bool {
        let mut last = self.last_summary.lock();
        if last
            .as_ref()
            .is_some_and(|recorded| recorded.session_id == summary.session_id)
        {
            return false;
        }
        *last = Some(summary);
        true
    }

    pub(crate) fn last_summary(&self) -> Option<SessionSummary> {
        self.last_summary.lock().clone()
    }

    fn publish_transition(&self, from: SessionState, to: SessionState) {
        tracing::debug!(from = %from, to = %to, "session state changed");
        self.emit(SessionEvent::StateChanged { from, to });
    }
}
