//! Session controller
//!
//! The command surface of a capture session: start, stop and the runtime
//! settings. The controller never touches the source or the sink of a
//! running session; it only holds the cancellation token and a receiver for
//! the session's summary.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use comlog_config::FileErrorPolicy;
use comlog_protocol::{Clock, SystemClock, Timestamper};
use comlog_sinks::{
    ChainWriter, Destination, DirectoryDestination, PlainTextWriter, RecordSink, RotationPolicy,
};
use comlog_sources::{ChunkSource, LineAssembler, SourceProvider};
use comlog_tap::SharedDisplay;
use parking_lot::Mutex;
use tokio::sync::{broadcast, watch};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::DEFAULT_EVENT_CAPACITY;
use crate::error::{PipelineError, Result};
use crate::events::{SessionEvent, SessionSummary};
use crate::ingest::{ERROR_PREFIX, IngestLoop};
use crate::metrics::SourceMetrics;
use crate::settings::SessionSettings;
use crate::state::{Controls, SessionState, SessionStatus};

#[derive(Clone)]
struct ActiveSession {
    id: u64,
    cancel: CancellationToken,
    done: watch::Receiver<Option<SessionSummary>>,
}

/// Drives capture sessions against one source
pub struct SessionController {
    provider: Arc<dyn SourceProvider>,
    destination: Arc<dyn Destination>,
    chain_writer: Arc<dyn ChainWriter>,
    clock: Arc<dyn Clock>,
    settings: Mutex<SessionSettings>,
    session: Mutex<Option<ActiveSession>>,
    status: Arc<SessionStatus>,
    display: SharedDisplay,
    next_session_id: AtomicU64,
}

impl SessionController {
    /// Create a controller writing into `settings.directory`
    pub fn new(provider: Arc<dyn SourceProvider>, settings: SessionSettings) -> Result<Self> {
        let display = SharedDisplay::with_capacity(settings.display_limit)
            .map_err(|e| PipelineError::invalid_setting("display limit", e.to_string()))?;
        let destination = Arc::new(DirectoryDestination::new(
            settings.directory.clone(),
            settings.create_dirs,
        ));
        let chain_writer = Arc::new(PlainTextWriter::new(settings.buffer_size));

        let controller = Self {
            provider,
            destination,
            chain_writer,
            clock: Arc::new(SystemClock),
            settings: Mutex::new(settings),
            session: Mutex::new(None),
            status: Arc::new(SessionStatus::new(DEFAULT_EVENT_CAPACITY)),
            display,
            next_session_id: AtomicU64::new(1),
        };
        controller.timestamper()?;
        Ok(controller)
    }

    /// Use a different clock for timestamps and file names
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Use a different output destination
    pub fn with_destination(mut self, destination: Arc<dyn Destination>) -> Self {
        self.destination = destination;
        self
    }

    /// Use a different writer around output files
    pub fn with_chain_writer(mut self, chain_writer: Arc<dyn ChainWriter>) -> Self {
        self.chain_writer = chain_writer;
        self
    }

    /// Open the source and the first file, then start streaming
    pub async fn start(&self) -> Result<()> {
        self.status
            .transition_from(SessionState::Idle, SessionState::Connecting)
            .map_err(|state| PipelineError::AlreadyRunning { state })?;

        let settings = self.settings.lock().clone();
        let session_id = self.next_session_id.fetch_add(1, Ordering::Relaxed);

        tracing::info!(
            session = session_id,
            source = %self.provider.describe(),
            "connecting capture session"
        );

        let timestamper = match self.timestamper() {
            Ok(timestamper) => timestamper,
            Err(e) => {
                self.status.transition(SessionState::Idle);
                return Err(e);
            }
        };

        let mut source = match self.provider.open().await {
            Ok(source) => source,
            Err(e) => {
                tracing::error!(session = session_id, error = %e, "failed to acquire source");
                self.report(e.to_string());
                self.status.transition(SessionState::Idle);
                return Err(PipelineError::SourceAcquisition(e));
            }
        };

        let mut sink = RecordSink::new(
            Arc::clone(&self.destination),
            Arc::clone(&self.chain_writer),
            timestamper.clone(),
        )
        .with_file_prefix(settings.file_prefix.clone());

        let mut files = Vec::new();
        match sink.open() {
            Ok(path) => {
                let path = path.to_path_buf();
                files.push(path.clone());
                self.status.emit(SessionEvent::FileOpened(path));
            }
            Err(e) => {
                tracing::error!(
                    session = session_id,
                    destination = %self.destination.describe(),
                    error = %e,
                    "failed to create first output file"
                );
                self.report(e.to_string());

                if settings.on_file_error == FileErrorPolicy::Abort {
                    release(session_id, &mut *source).await;
                    self.status.transition(SessionState::Idle);
                    return Err(PipelineError::FileCreation(e));
                }
                tracing::warn!(session = session_id, "streaming with persistence stalled");
            }
        }

        let cancel = CancellationToken::new();
        let (done_tx, done_rx) = watch::channel(None);

        let ingest = IngestLoop {
            session_id,
            source,
            sink,
            assembler: LineAssembler::with_max_pending(settings.max_pending_bytes),
            timestamper,
            policy: settings.rotation,
            display: self.display.clone(),
            status: Arc::clone(&self.status),
            cancel: cancel.clone(),
            done: done_tx,
            flush_interval: settings.flush_interval,
            max_consecutive_write_failures: settings.max_consecutive_write_failures,
            files,
            metrics: SourceMetrics::new(),
            consecutive_write_failures: 0,
            stall_reported: false,
            started_at: Instant::now(),
        };

        *self.session.lock() = Some(ActiveSession {
            id: session_id,
            cancel,
            done: done_rx,
        });
        self.status.transition(SessionState::Streaming);
        tokio::spawn(ingest.run());

        Ok(())
    }

    /// Stop the streaming session and wait for its cleanup
    ///
    /// Cleanup failures are logged, never returned. The session always ends
    /// in `Idle`.
    pub async fn stop(&self) -> Result<SessionSummary> {
        self.status
            .transition_from(SessionState::Streaming, SessionState::Stopping)
            .map_err(|state| PipelineError::NotRunning { state })?;

        let Some(session) = self.session.lock().clone() else {
            self.status.transition(SessionState::Idle);
            return Err(PipelineError::NotRunning {
                state: SessionState::Idle,
            });
        };

        tracing::info!(session = session.id, "stopping capture session");
        session.cancel.cancel();
        Ok(self.await_summary(session).await)
    }

    /// Wait for the current session to end on its own
    ///
    /// Returns `None` when no session was ever started.
    pub async fn wait(&self) -> Option<SessionSummary> {
        let session = self.session.lock().clone()?;
        Some(self.await_summary(session).await)
    }

    /// Resize the display immediately
    pub fn set_display_limit(&self, limit: usize) -> Result<()> {
        self.display
            .set_capacity(limit)
            .map_err(|e| PipelineError::invalid_setting("display limit", e.to_string()))?;
        self.settings.lock().display_limit = limit;
        Ok(())
    }

    /// Change the rotation period for the next session
    ///
    /// A running session keeps the policy it started with.
    pub fn set_rotation_period(&self, period_minutes: u64) {
        let mut settings = self.settings.lock();
        let max_lines = settings.rotation.max_lines_per_file();
        settings.rotation = RotationPolicy::new(period_minutes, max_lines);
        tracing::debug!(period_minutes, "rotation period updated for next session");
    }

    pub fn clear_display(&self) {
        self.display.clear();
    }

    pub fn state(&self) -> SessionState {
        self.status.state()
    }

    pub fn controls(&self) -> Controls {
        self.state().controls()
    }

    pub fn display(&self) -> SharedDisplay {
        self.display.clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.status.subscribe()
    }

    pub fn settings(&self) -> SessionSettings {
        self.settings.lock().clone()
    }

    /// Summary of the most recently finished session
    pub fn last_summary(&self) -> Option<SessionSummary> {
        self.status.last_summary()
    }

    fn timestamper(&self) -> Result<Timestamper> {
        let offset = self.settings.lock().utc_offset_hours;
        Timestamper::new(Arc::clone(&self.clock), offset)
            .map_err(|e| PipelineError::invalid_setting("utc offset", e.to_string()))
    }

    fn report(&self, message: String) {
        self.display.push(format!("{ERROR_PREFIX}{message}"));
        self.status.emit(SessionEvent::Notice(message));
    }

    async fn await_summary(&self, mut session: ActiveSession) -> SessionSummary {
        match session.done.wait_for(Option::is_some).await {
            Ok(summary) => (*summary)
                .clone()
                .unwrap_or_else(|| SessionSummary::aborted(session.id)),
            Err(_) => {
                // the ingest task is gone without reporting
                let summary = SessionSummary::aborted(session.id);
                if self.status.store_summary_once(summary.clone()) {
                    tracing::error!(session = session.id, "capture session ended without a summary");
                    self.report("capture session ended unexpectedly".to_string());
                    self.status.transition(SessionState::Failed);
                    self.status.transition(SessionState::Idle);
                    self.status.emit(SessionEvent::Finished(summary.clone()));
                }
                summary
            }
        }
    }
}

async fn release(session_id: u64, source: &mut dyn ChunkSource) {
    if let Err(e) = source.close().await {
        tracing::warn!(session = session_id, error = %e, "failed to release source");
    }
}

#[cfg(test)]
#[path = "controller_test.rs"]
mod controller_test;
