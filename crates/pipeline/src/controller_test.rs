//! Session tests driving the full pipeline through a channel source

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use comlog_config::FileErrorPolicy;
use comlog_protocol::ManualClock;
use comlog_sinks::{ChainWrite, ChainWriter};
use comlog_sources::{ChannelSourceProvider, ChunkSource, SourceProvider};
use tempfile::TempDir;
use tokio::sync::broadcast;

use super::SessionController;
use crate::error::PipelineError;
use crate::events::{EndReason, SessionEvent};
use crate::settings::SessionSettings;
use crate::state::SessionState;

const TS: &str = "2025-01-15_13-30-45";

fn clock() -> ManualClock {
    ManualClock::new(Utc.with_ymd_and_hms(2025, 1, 15, 10, 30, 45).unwrap())
}

/// Line-count mode with a ceiling no test reaches unless it sets one
fn settings(dir: &Path) -> SessionSettings {
    SessionSettings::default()
        .with_directory(dir)
        .with_rotation(0, 500_000)
}

fn controller(
    provider: &Arc<ChannelSourceProvider>,
    settings: SessionSettings,
    clock: &ManualClock,
) -> SessionController {
    SessionController::new(provider.clone(), settings)
        .unwrap()
        .with_clock(Arc::new(clock.clone()))
}

async fn next_event(events: &mut broadcast::Receiver<SessionEvent>) -> SessionEvent {
    tokio::time::timeout(Duration::from_secs(5), events.recv())
        .await
        .expect("timed out waiting for event")
        .expect("event channel closed")
}

/// Collect `n` captured lines, skipping other events
async fn lines(events: &mut broadcast::Receiver<SessionEvent>, n: usize) -> Vec<String> {
    let mut lines = Vec::new();
    while lines.len() < n {
        if let SessionEvent::Line(line) = next_event(events).await {
            lines.push(line);
        }
    }
    lines
}

fn csv_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "csv"))
        .collect();
    files.sort();
    files
}

fn records(path: &Path) -> Vec<String> {
    let content = fs::read_to_string(path).unwrap();
    let mut lines = content.lines();
    assert_eq!(lines.next(), Some("Timestamp,Message"));
    lines.map(str::to_string).collect()
}

fn rendered(message: &str) -> String {
    format!("{TS},{message}")
}

// ============================================================================
// End of stream
// ============================================================================

#[tokio::test]
async fn test_fragments_reassembled_and_remainder_flushed() {
    let dir = TempDir::new().unwrap();
    let provider = Arc::new(ChannelSourceProvider::new("serial"));
    let feeder = provider.feeder();
    let clock = clock();
    let controller = controller(&provider, settings(dir.path()), &clock);

    controller.start().await.unwrap();
    assert_eq!(controller.state(), SessionState::Streaming);

    feeder.send("AA").await;
    feeder.send("BB\nCC\n").await;
    feeder.send("DD").await;
    drop(feeder);

    let summary = controller.wait().await.unwrap();
    assert_eq!(summary.reason, EndReason::SourceClosed);
    assert_eq!(controller.state(), SessionState::Idle);

    let files = csv_files(dir.path());
    assert_eq!(files.len(), 1);
    assert_eq!(
        records(&files[0]),
        vec![rendered("AABB"), rendered("CC"), rendered("DD")]
    );
    assert_eq!(
        controller.display().contents(),
        vec![rendered("AABB"), rendered("CC"), rendered("DD")]
    );

    assert_eq!(summary.files, files);
    assert_eq!(summary.source.lines_assembled, 3);
    assert_eq!(summary.sink.records_written, 3);
}

#[tokio::test]
async fn test_crlf_and_blank_lines() {
    let dir = TempDir::new().unwrap();
    let provider = Arc::new(ChannelSourceProvider::new("serial"));
    let feeder = provider.feeder();
    let clock = clock();
    let controller = controller(&provider, settings(dir.path()), &clock);

    controller.start().await.unwrap();
    feeder.send("  first\r\n\r\n\nsecond  \r").await;
    feeder.send("\n").await;
    drop(feeder);
    controller.wait().await.unwrap();

    let files = csv_files(dir.path());
    assert_eq!(records(&files[0]), vec![rendered("first"), rendered("second")]);
}

// ============================================================================
// Rotation
// ============================================================================

#[tokio::test]
async fn test_line_count_rotation_splits_files() {
    let dir = TempDir::new().unwrap();
    let provider = Arc::new(ChannelSourceProvider::new("serial"));
    let feeder = provider.feeder();
    let clock = clock();
    let controller = controller(
        &provider,
        settings(dir.path()).with_rotation(0, 3),
        &clock,
    );

    controller.start().await.unwrap();
    for i in 1..=7 {
        feeder.send(format!("line {i}\n")).await;
    }
    drop(feeder);
    let summary = controller.wait().await.unwrap();

    let files = csv_files(dir.path());
    assert_eq!(files.len(), 3);
    let counts: Vec<usize> = files.iter().map(|f| records(f).len()).collect();
    assert_eq!(counts, vec![3, 3, 1]);

    // No loss, no duplication, in order
    let all: Vec<String> = files.iter().flat_map(|f| records(f)).collect();
    let expected: Vec<String> = (1..=7).map(|i| rendered(&format!("line {i}"))).collect();
    assert_eq!(all, expected);

    // Same-second rotations never reuse a name
    assert_eq!(
        files[1].file_name().unwrap().to_str().unwrap(),
        format!("com_log_{TS}_1.csv")
    );
    assert_eq!(summary.sink.rotations, 2);
    assert_eq!(summary.files.len(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_timed_rotation_ignores_line_ceiling() {
    let dir = TempDir::new().unwrap();
    let provider = Arc::new(ChannelSourceProvider::new("serial"));
    let feeder = provider.feeder();
    let clock = clock();
    let controller = controller(
        &provider,
        settings(dir.path()).with_rotation(1, 2),
        &clock,
    );
    let mut events = controller.subscribe();

    controller.start().await.unwrap();
    for i in 1..=5 {
        feeder.send(format!("line {i}\n")).await;
    }
    lines(&mut events, 5).await;

    clock.advance(chrono::Duration::seconds(60));
    tokio::time::advance(Duration::from_secs(61)).await;

    loop {
        if let SessionEvent::FileOpened(path) = next_event(&mut events).await {
            assert_eq!(
                path.file_name().unwrap().to_str().unwrap(),
                "com_log_2025-01-15_13-31-45.csv"
            );
            break;
        }
    }

    feeder.send("line 6\n").await;
    drop(feeder);
    controller.wait().await.unwrap();

    let files = csv_files(dir.path());
    assert_eq!(files.len(), 2);
    assert_eq!(records(&files[0]).len(), 5);
    assert_eq!(records(&files[1]).len(), 1);
}

#[tokio::test]
async fn test_out_of_range_period_still_streams() {
    let dir = TempDir::new().unwrap();
    let provider = Arc::new(ChannelSourceProvider::new("serial"));
    let feeder = provider.feeder();
    let clock = clock();
    let settings = settings(dir.path()).with_rotation(u64::MAX / 60, 500_000);
    let controller = controller(&provider, settings, &clock);
    let mut events = controller.subscribe();

    controller.start().await.unwrap();
    feeder.send("hello\n").await;
    assert_eq!(lines(&mut events, 1).await, vec![rendered("hello")]);

    let summary = controller.stop().await.unwrap();
    assert_eq!(summary.reason, EndReason::Stopped);
    let files = csv_files(dir.path());
    assert_eq!(records(&files[0]), vec![rendered("hello")]);
}

#[tokio::test]
async fn test_rotation_period_change_applies_next_session() {
    let dir = TempDir::new().unwrap();
    let provider = Arc::new(ChannelSourceProvider::new("serial"));
    let feeder = provider.feeder();
    let clock = clock();
    let controller = controller(
        &provider,
        settings(dir.path()).with_rotation(0, 2),
        &clock,
    );

    controller.start().await.unwrap();
    controller.set_rotation_period(5);

    for i in 1..=3 {
        feeder.send(format!("line {i}\n")).await;
    }
    drop(feeder);
    controller.wait().await.unwrap();

    // The running session kept rotating by line count
    assert_eq!(csv_files(dir.path()).len(), 2);
    assert_eq!(
        controller.settings().rotation.timer_period(),
        Some(Duration::from_secs(300))
    );
}

// ============================================================================
// Stop and restart
// ============================================================================

#[tokio::test]
async fn test_stop_cancels_blocked_read() {
    let dir = TempDir::new().unwrap();
    let provider = Arc::new(ChannelSourceProvider::new("serial"));
    let feeder = provider.feeder();
    let clock = clock();
    let controller = controller(&provider, settings(dir.path()), &clock);
    let mut events = controller.subscribe();

    controller.start().await.unwrap();
    feeder.send("done\npartial").await;
    lines(&mut events, 1).await;

    let summary = tokio::time::timeout(Duration::from_secs(5), controller.stop())
        .await
        .expect("stop blocked on the pending read")
        .unwrap();

    assert_eq!(summary.reason, EndReason::Stopped);
    assert_eq!(controller.state(), SessionState::Idle);
    assert!(feeder.is_closed());

    // The unterminated fragment is discarded on stop
    let files = csv_files(dir.path());
    assert_eq!(records(&files[0]), vec![rendered("done")]);
}

#[cfg(unix)]
#[tokio::test]
async fn test_stop_releases_silent_device() {
    use comlog_sources::DeviceSourceProvider;
    use nix::sys::stat::Mode;

    let dir = TempDir::new().unwrap();
    let fifo = dir.path().join("ttyS9");
    nix::unistd::mkfifo(&fifo, Mode::S_IRUSR | Mode::S_IWUSR).unwrap();

    let clock = clock();
    let provider = Arc::new(DeviceSourceProvider::new(&fifo, 64));
    let controller = SessionController::new(provider, settings(dir.path()))
        .unwrap()
        .with_clock(Arc::new(clock.clone()));
    let mut events = controller.subscribe();

    controller.start().await.unwrap();
    let mut writer = fs::OpenOptions::new().write(true).open(&fifo).unwrap();
    writer.write_all(b"boot\n").unwrap();
    assert_eq!(lines(&mut events, 1).await, vec![rendered("boot")]);

    // The device goes quiet; stop must not wait for another byte
    let summary = tokio::time::timeout(Duration::from_secs(5), controller.stop())
        .await
        .expect("stop blocked on a silent device")
        .unwrap();
    assert_eq!(summary.reason, EndReason::Stopped);
    assert_eq!(controller.state(), SessionState::Idle);

    // The read end is closed
    let err = writer.write_all(b"x").unwrap_err();
    assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
}

#[tokio::test]
async fn test_stop_passes_through_stopping() {
    let dir = TempDir::new().unwrap();
    let provider = Arc::new(ChannelSourceProvider::new("serial"));
    let _feeder = provider.feeder();
    let clock = clock();
    let controller = controller(&provider, settings(dir.path()), &clock);

    controller.start().await.unwrap();
    let mut events = controller.subscribe();
    controller.stop().await.unwrap();

    let mut transitions = Vec::new();
    while let Ok(event) = events.try_recv() {
        if let SessionEvent::StateChanged { to, .. } = event {
            transitions.push(to);
        }
    }
    assert_eq!(transitions, vec![SessionState::Stopping, SessionState::Idle]);
}

#[tokio::test]
async fn test_display_persists_across_restart() {
    let dir = TempDir::new().unwrap();
    let provider = Arc::new(ChannelSourceProvider::new("serial"));
    let first = provider.feeder();
    let second = provider.feeder();
    let clock = clock();
    let controller = controller(&provider, settings(dir.path()), &clock);

    controller.start().await.unwrap();
    first.send("a\nb\n").await;
    drop(first);
    controller.wait().await.unwrap();

    controller.start().await.unwrap();
    second.send("c\n").await;
    drop(second);
    let summary = controller.wait().await.unwrap();
    assert_eq!(summary.session_id, 2);

    assert_eq!(
        controller.display().contents(),
        vec![rendered("a"), rendered("b"), rendered("c")]
    );

    controller.clear_display();
    assert!(controller.display().is_empty());
}

#[tokio::test]
async fn test_double_start_rejected() {
    let dir = TempDir::new().unwrap();
    let provider = Arc::new(ChannelSourceProvider::new("serial"));
    let _first = provider.feeder();
    let _second = provider.feeder();
    let clock = clock();
    let controller = controller(&provider, settings(dir.path()), &clock);

    controller.start().await.unwrap();
    assert!(controller.controls().stop_enabled);
    assert!(!controller.controls().start_enabled);

    let err = controller.start().await.unwrap_err();
    assert!(matches!(
        err,
        PipelineError::AlreadyRunning {
            state: SessionState::Streaming
        }
    ));
    // The rejected start did not consume the second stream
    assert_eq!(provider.ready_count(), 1);

    controller.stop().await.unwrap();
}

#[tokio::test]
async fn test_stop_when_idle_rejected() {
    let dir = TempDir::new().unwrap();
    let provider = Arc::new(ChannelSourceProvider::new("serial"));
    let clock = clock();
    let controller = controller(&provider, settings(dir.path()), &clock);

    let err = controller.stop().await.unwrap_err();
    assert!(matches!(
        err,
        PipelineError::NotRunning {
            state: SessionState::Idle
        }
    ));
    assert!(controller.wait().await.is_none());
}

// ============================================================================
// Failures
// ============================================================================

#[tokio::test]
async fn test_source_acquisition_failure_returns_to_idle() {
    let dir = TempDir::new().unwrap();
    let provider = Arc::new(ChannelSourceProvider::new("serial"));
    let clock = clock();
    let controller = controller(&provider, settings(dir.path()), &clock);
    let mut events = controller.subscribe();

    let err = controller.start().await.unwrap_err();
    assert!(matches!(err, PipelineError::SourceAcquisition(_)));
    assert_eq!(controller.state(), SessionState::Idle);
    assert!(controller.controls().start_enabled);
    assert!(csv_files(dir.path()).is_empty());

    let mut saw_notice = false;
    while let Ok(event) = events.try_recv() {
        saw_notice |= matches!(event, SessionEvent::Notice(_));
    }
    assert!(saw_notice);
    assert!(controller.display().contents()[0].starts_with("error: "));
}

#[tokio::test]
async fn test_unwritable_directory_streams_with_persistence_stalled() {
    let dir = TempDir::new().unwrap();
    let blocker = dir.path().join("logs");
    fs::write(&blocker, b"").unwrap();

    let provider = Arc::new(ChannelSourceProvider::new("serial"));
    let feeder = provider.feeder();
    let clock = clock();
    let controller = controller(&provider, settings(&blocker), &clock);
    let mut events = controller.subscribe();

    controller.start().await.unwrap();
    assert_eq!(controller.state(), SessionState::Streaming);

    feeder.send("one\ntwo\nthree\n").await;
    lines(&mut events, 3).await;
    let summary = controller.stop().await.unwrap();

    let display = controller.display().contents();
    let errors: Vec<&String> = display.iter().filter(|l| l.starts_with("error: ")).collect();
    // creation failure, then one stall notice for all three lines
    assert_eq!(errors.len(), 2);
    assert!(display.contains(&rendered("three")));

    assert_eq!(summary.sink.records_written, 0);
    assert_eq!(summary.sink.write_errors, 0);
    assert!(summary.files.is_empty());
}

#[tokio::test]
async fn test_unwritable_directory_with_abort_policy() {
    let dir = TempDir::new().unwrap();
    let blocker = dir.path().join("logs");
    fs::write(&blocker, b"").unwrap();

    let provider = Arc::new(ChannelSourceProvider::new("serial"));
    let feeder = provider.feeder();
    let clock = clock();
    let mut settings = settings(&blocker);
    settings.on_file_error = FileErrorPolicy::Abort;
    let controller = controller(&provider, settings, &clock);

    let err = controller.start().await.unwrap_err();
    assert!(matches!(err, PipelineError::FileCreation(_)));
    assert_eq!(controller.state(), SessionState::Idle);
    // The source was released
    assert!(feeder.is_closed());
}

#[tokio::test]
async fn test_read_error_fails_then_idles() {
    let dir = TempDir::new().unwrap();
    let provider = Arc::new(ChannelSourceProvider::new("serial"));
    let feeder = provider.feeder();
    let clock = clock();
    let controller = controller(&provider, settings(dir.path()), &clock);
    let mut events = controller.subscribe();

    controller.start().await.unwrap();
    feeder.send("kept\n").await;
    feeder
        .fail(io::Error::new(io::ErrorKind::BrokenPipe, "device unplugged"))
        .await;

    let summary = controller.wait().await.unwrap();
    assert!(matches!(summary.reason, EndReason::ReadError(ref e) if e.contains("device unplugged")));
    assert_eq!(controller.state(), SessionState::Idle);

    let mut transitions = Vec::new();
    while let Ok(event) = events.try_recv() {
        if let SessionEvent::StateChanged { to, .. } = event {
            transitions.push(to);
        }
    }
    assert_eq!(
        transitions,
        vec![
            SessionState::Connecting,
            SessionState::Streaming,
            SessionState::Failed,
            SessionState::Idle
        ]
    );

    let files = csv_files(dir.path());
    assert_eq!(records(&files[0]), vec![rendered("kept")]);
}

/// Writer whose files reject every record after the header
struct BrokenDiskWriter;

struct BrokenDiskChain {
    file: File,
    writes: usize,
}

impl Write for BrokenDiskChain {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.writes += 1;
        if self.writes > 1 {
            return Err(io::Error::other("disk full"));
        }
        self.file.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

impl ChainWrite for BrokenDiskChain {
    fn flush_all(&mut self) -> io::Result<()> {
        self.file.flush()
    }

    fn finish(self: Box<Self>) -> io::Result<()> {
        Ok(())
    }

    fn bytes_written(&self) -> u64 {
        0
    }
}

impl ChainWriter for BrokenDiskWriter {
    fn wrap(&self, file: File) -> io::Result<Box<dyn ChainWrite>> {
        Ok(Box::new(BrokenDiskChain { file, writes: 0 }))
    }

    fn file_extension(&self) -> &'static str {
        ".csv"
    }
}

#[tokio::test]
async fn test_write_failure_ceiling_fails_session() {
    let dir = TempDir::new().unwrap();
    let provider = Arc::new(ChannelSourceProvider::new("serial"));
    let feeder = provider.feeder();
    let clock = clock();
    let mut settings = settings(dir.path());
    settings.max_consecutive_write_failures = 3;
    let controller = controller(&provider, settings, &clock)
        .with_chain_writer(Arc::new(BrokenDiskWriter));

    controller.start().await.unwrap();
    feeder.send("a\nb\nc\nd\ne\n").await;

    let summary = controller.wait().await.unwrap();
    assert_eq!(summary.reason, EndReason::WriteFailures(3));
    assert_eq!(summary.sink.write_errors, 3);
    assert_eq!(controller.state(), SessionState::Idle);

    // Every failed line still reached the display, each followed by its error
    let display = controller.display().contents();
    assert_eq!(display.iter().filter(|l| l.starts_with("error: ")).count(), 3);
    assert!(display.contains(&rendered("c")));
    assert!(!display.contains(&rendered("d")));
}

#[tokio::test]
async fn test_write_failures_without_ceiling_keep_streaming() {
    let dir = TempDir::new().unwrap();
    let provider = Arc::new(ChannelSourceProvider::new("serial"));
    let feeder = provider.feeder();
    let clock = clock();
    let mut settings = settings(dir.path());
    settings.max_consecutive_write_failures = 0;
    let controller = controller(&provider, settings, &clock)
        .with_chain_writer(Arc::new(BrokenDiskWriter));

    controller.start().await.unwrap();
    feeder.send("a\nb\nc\nd\ne\n").await;
    drop(feeder);

    let summary = controller.wait().await.unwrap();
    assert_eq!(summary.reason, EndReason::SourceClosed);
    assert_eq!(summary.sink.write_errors, 5);
}

// ============================================================================
// Lost ingest task
// ============================================================================

/// Source whose first read panics, taking the ingest task down with it
struct PanickingSource;

#[async_trait]
impl ChunkSource for PanickingSource {
    async fn next_chunk(&mut self) -> comlog_sources::Result<Option<String>> {
        panic!("driver crashed");
    }

    async fn close(&mut self) -> comlog_sources::Result<()> {
        Ok(())
    }

    fn describe(&self) -> &str {
        "crashing"
    }
}

struct PanickingProvider;

#[async_trait]
impl SourceProvider for PanickingProvider {
    async fn open(&self) -> comlog_sources::Result<Box<dyn ChunkSource>> {
        Ok(Box::new(PanickingSource))
    }

    fn describe(&self) -> String {
        "crashing".to_string()
    }
}

#[tokio::test]
async fn test_lost_ingest_task_reports_aborted_session() {
    let dir = TempDir::new().unwrap();
    let clock = clock();
    let controller = SessionController::new(Arc::new(PanickingProvider), settings(dir.path()))
        .unwrap()
        .with_clock(Arc::new(clock.clone()));
    let mut events = controller.subscribe();

    controller.start().await.unwrap();
    let summary = tokio::time::timeout(Duration::from_secs(5), controller.wait())
        .await
        .expect("wait blocked on a dead session")
        .unwrap();

    assert_eq!(summary.reason, EndReason::Aborted);
    assert_eq!(controller.state(), SessionState::Idle);
    assert_eq!(
        controller.last_summary().map(|s| s.reason),
        Some(EndReason::Aborted)
    );

    let mut notices = 0;
    let mut transitions = Vec::new();
    loop {
        match next_event(&mut events).await {
            SessionEvent::Notice(_) => notices += 1,
            SessionEvent::StateChanged { to, .. } => transitions.push(to),
            SessionEvent::Finished(finished) => {
                assert_eq!(finished.reason, EndReason::Aborted);
                break;
            }
            _ => {}
        }
    }
    assert_eq!(notices, 1);
    assert_eq!(
        transitions,
        vec![
            SessionState::Connecting,
            SessionState::Streaming,
            SessionState::Failed,
            SessionState::Idle
        ]
    );
    assert!(
        controller
            .display()
            .contents()
            .iter()
            .any(|line| line.starts_with("error: "))
    );

    // A later waiter sees the same summary without a second report
    assert_eq!(controller.wait().await.unwrap().reason, EndReason::Aborted);
    assert!(events.try_recv().is_err());

    // The controller accepts a new session
    controller.start().await.unwrap();
    controller.wait().await.unwrap();
}

// ============================================================================
// Settings
// ============================================================================

#[tokio::test]
async fn test_display_limit() {
    let dir = TempDir::new().unwrap();
    let provider = Arc::new(ChannelSourceProvider::new("serial"));
    let feeder = provider.feeder();
    let clock = clock();
    let controller = controller(&provider, settings(dir.path()), &clock);

    assert!(matches!(
        controller.set_display_limit(0).unwrap_err(),
        PipelineError::InvalidSetting { .. }
    ));

    controller.set_display_limit(2).unwrap();
    controller.start().await.unwrap();
    feeder.send("a\nb\nc\n").await;
    drop(feeder);
    controller.wait().await.unwrap();

    assert_eq!(
        controller.display().contents(),
        vec![rendered("b"), rendered("c")]
    );

    controller.set_display_limit(1).unwrap();
    assert_eq!(controller.display().contents(), vec![rendered("c")]);
    assert_eq!(controller.settings().display_limit, 1);
}

#[test]
fn test_invalid_offset_rejected() {
    let provider = Arc::new(ChannelSourceProvider::new("serial"));
    let mut settings = SessionSettings::default();
    settings.utc_offset_hours = 30;
    assert!(matches!(
        SessionController::new(provider, settings),
        Err(PipelineError::InvalidSetting { .. })
    ));
}
