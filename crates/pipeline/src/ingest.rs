//! Ingest loop
//!
//! One task per session owns the source, the assembler, the sink and the
//! rotation timer. Everything that touches the current file happens on this
//! task, so a rotation can never interleave with a write.
//!
//! ```text
//! select! (biased)
//!   cancelled      -> stop, discard the pending fragment
//!   rotation tick  -> rotate (timed mode; also retries a stalled sink)
//!   flush tick     -> flush the write buffer
//!   next_chunk     -> assemble -> timestamp -> write -> display -> size check
//! ```

use std::future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use comlog_protocol::{Record, Timestamper};
use comlog_sinks::{RecordSink, RotationPolicy, RotationTrigger};
use comlog_sources::{ChunkSource, LineAssembler};
use comlog_tap::SharedDisplay;
use tokio::sync::watch;
use tokio::time::{Instant, Interval, MissedTickBehavior, interval_at};
use tokio_util::sync::CancellationToken;

use crate::events::{EndReason, SessionEvent, SessionSummary};
use crate::metrics::SourceMetrics;
use crate::state::{SessionState, SessionStatus};

/// Prefix for errors pushed to the display
pub const ERROR_PREFIX: &str = "error: ";

const MIN_FLUSH_INTERVAL: Duration = Duration::from_millis(1);

pub(crate) struct IngestLoop {
    pub(crate) session_id: u64,
    pub(crate) source: Box<dyn ChunkSource>,
    pub(crate) sink: RecordSink,
    pub(crate) assembler: LineAssembler,
    pub(crate) timestamper: Timestamper,
    pub(crate) policy: RotationPolicy,
    pub(crate) display: SharedDisplay,
    pub(crate) status: Arc<SessionStatus>,
    pub(crate) cancel: CancellationToken,
    pub(crate) done: watch::Sender<Option<SessionSummary>>,
    pub(crate) flush_interval: Duration,
    pub(crate) max_consecutive_write_failures: u64,
    pub(crate) files: Vec<PathBuf>,
    pub(crate) metrics: SourceMetrics,
    pub(crate) consecutive_write_failures: u64,
    pub(crate) stall_reported: bool,
    pub(crate) started_at: Instant,
}

impl IngestLoop {
    pub(crate) async fn run(mut self) -> SessionSummary {
        tracing::info!(
            session = self.session_id,
            source = %self.source.describe(),
            mode = ?self.policy.mode(),
            "capture session streaming"
        );

        let cancel = self.cancel.clone();
        let mut rotation_tick = self.policy.timer_period().and_then(|period| {
            let Some(first) = Instant::now().checked_add(period) else {
                tracing::warn!(?period, "rotation period out of range, timer disabled");
                return None;
            };
            let mut interval = interval_at(first, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            Some(interval)
        });
        let flush_period = self.flush_interval.max(MIN_FLUSH_INTERVAL);
        let mut flush_tick = interval_at(Instant::now() + flush_period, flush_period);
        flush_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let reason = loop {
            tokio::select! {
                biased;

                _ = cancel.cancelled() => {
                    let discarded = self.assembler.pending_len();
                    if discarded > 0 {
                        tracing::debug!(bytes = discarded, "discarding unterminated fragment on stop");
                    }
                    break EndReason::Stopped;
                }

                _ = next_tick(&mut rotation_tick) => {
                    if self.policy.should_rotate_on_tick() {
                        self.rotate(RotationTrigger::Timer);
                    }
                }

                _ = flush_tick.tick() => self.flush(),

                chunk = self.source.next_chunk() => match chunk {
                    Ok(Some(chunk)) => {
                        if let Err(reason) = self.handle_chunk(&chunk) {
                            break reason;
                        }
                    }
                    Ok(None) => {
                        tracing::info!(session = self.session_id, "source reached end of stream");
                        if let Some(line) = self.assembler.flush_remainder() {
                            self.metrics.record_lines(1);
                            if let Err(reason) = self.emit_line(line) {
                                break reason;
                            }
                        }
                        break EndReason::SourceClosed;
                    }
                    Err(e) => {
                        tracing::error!(session = self.session_id, error = %e, "source read failed");
                        self.report(e.to_string());
                        break EndReason::ReadError(e.to_string());
                    }
                },
            }
        };

        self.finish(reason).await
    }

    fn handle_chunk(&mut self, chunk: &str) -> Result<(), EndReason> {
        self.metrics.record_chunk(chunk.len() as u64);

        let lines = self.assembler.feed(chunk);
        self.metrics.record_lines(lines.len() as u64);
        self.metrics.set_forced_splits(self.assembler.forced_splits());

        for line in lines {
            self.emit_line(line)?;
        }
        Ok(())
    }

    /// Timestamp, persist, display, then check the line ceiling
    fn emit_line(&mut self, line: String) -> Result<(), EndReason> {
        let record = Record::new(self.timestamper.now(), line);
        let write_result = self.sink.write(&record);

        let rendered = record.to_string();
        self.display.push(rendered.clone());
        self.status.emit(SessionEvent::Line(rendered));

        match write_result {
            Ok(()) => {
                self.consecutive_write_failures = 0;
                if let Some(state) = self.sink.rotation_state()
                    && self.policy.should_rotate_after_write(&state)
                {
                    self.rotate(RotationTrigger::LineLimit);
                }
            }
            Err(e) if e.is_stalled() => {
                if !self.stall_reported {
                    self.stall_reported = true;
                    self.report(format!("records are not being saved: {e}"));
                }
            }
            Err(e) => {
                self.consecutive_write_failures += 1;
                self.report(e.to_string());

                let ceiling = self.max_consecutive_write_failures;
                if ceiling > 0 && self.consecutive_write_failures >= ceiling {
                    tracing::error!(
                        session = self.session_id,
                        failures = self.consecutive_write_failures,
                        "write failure ceiling reached"
                    );
                    return Err(EndReason::WriteFailures(self.consecutive_write_failures));
                }
            }
        }
        Ok(())
    }

    fn rotate(&mut self, trigger: RotationTrigger) {
        let previous = self.sink.current_path().map(|p| p.to_path_buf());
        let result = self.sink.rotate();

        if let Some(previous) = previous {
            self.status.emit(SessionEvent::FileClosed(previous));
        }

        match result {
            Ok(path) => {
                tracing::info!(
                    session = self.session_id,
                    trigger = trigger.as_str(),
                    path = %path.display(),
                    "rotated output file"
                );
                self.stall_reported = false;
                self.consecutive_write_failures = 0;
                self.files.push(path.clone());
                self.status.emit(SessionEvent::FileOpened(path));
            }
            Err(e) => {
                tracing::warn!(
                    session = self.session_id,
                    trigger = trigger.as_str(),
                    error = %e,
                    "rotation failed, persistence stalled"
                );
                self.report(format!("rotation failed: {e}"));
            }
        }
    }

    fn flush(&mut self) {
        if let Err(e) = self.sink.flush() {
            tracing::warn!(session = self.session_id, error = %e, "periodic flush failed");
        }
    }

    /// Surface an error on every user-visible channel
    fn report(&self, message: String) {
        self.display.push(format!("{ERROR_PREFIX}{message}"));
        self.status.emit(SessionEvent::Notice(message));
    }

    /// Release everything and return to idle; never fails
    async fn finish(mut self, reason: EndReason) -> SessionSummary {
        if reason.is_failure() {
            self.status.transition(SessionState::Failed);
        } else {
            self.status.transition(SessionState::Stopping);
        }

        let closing = self.sink.current_path().map(|p| p.to_path_buf());
        if let Err(e) = self.sink.close() {
            tracing::warn!(session = self.session_id, error = %e, "failed to close output file");
        }
        if let Some(path) = closing {
            self.status.emit(SessionEvent::FileClosed(path));
        }

        if let Err(e) = self.source.close().await {
            tracing::warn!(session = self.session_id, error = %e, "failed to release source");
        }
        self.assembler.reset();

        let summary = SessionSummary {
            session_id: self.session_id,
            reason,
            files: std::mem::take(&mut self.files),
            source: self.metrics.snapshot(),
            sink: self.sink.metrics().snapshot(),
            duration: self.started_at.elapsed(),
        };

        tracing::info!(
            session = summary.session_id,
            reason = %summary.reason,
            lines = summary.source.lines_assembled,
            records_written = summary.sink.records_written,
            write_errors = summary.sink.write_errors,
            files = summary.files.len(),
            "capture session finished"
        );

        self.status.transition(SessionState::Idle);
        self.status.record_summary(summary.clone());
        self.done.send_replace(Some(summary.clone()));
        summary
    }
}

async fn next_tick(interval: &mut Option<Interval>) {
    match interval {
        Some(interval) => {
            interval.tick().await;
        }
        None => future::pending().await,
    }
}
