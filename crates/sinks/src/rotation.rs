//! Rotation policy
//!
//! Two mutually exclusive modes:
//!
//! - **Timed** (`period_minutes > 0`): a new file every period, regardless of
//!   how many lines were written. The line ceiling is ignored.
//! - **Line count** (`period_minutes == 0`): a new file once the current one
//!   holds `max_lines_per_file` records.
//!
//! The policy only answers questions. The ingest loop owns the timer and
//! asks `should_rotate_after_write` after every record.

use std::time::Duration;

/// Longest timer period; longer periods are clamped to it
const MAX_PERIOD_MINUTES: u64 = 366 * 24 * 60;

/// Active rotation mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationMode {
    /// Rotate every period
    Timed(Duration),
    /// Rotate after this many records
    LineCount(u64),
}

/// What caused a rotation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationTrigger {
    Timer,
    LineLimit,
}

impl RotationTrigger {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Timer => "timer",
            Self::LineLimit => "line_limit",
        }
    }
}

/// Progress of the current file
#[derive(Debug, Clone, Copy, Default)]
pub struct RotationState {
    pub lines_in_file: u64,
}

impl RotationState {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Rotation policy for one session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RotationPolicy {
    period_minutes: u64,
    max_lines_per_file: u64,
}

impl RotationPolicy {
    /// Create a policy; a zero line ceiling is raised to 1
    pub fn new(period_minutes: u64, max_lines_per_file: u64) -> Self {
        Self {
            period_minutes,
            max_lines_per_file: max_lines_per_file.max(1),
        }
    }

    pub fn period_minutes(&self) -> u64 {
        self.period_minutes
    }

    pub fn max_lines_per_file(&self) -> u64 {
        self.max_lines_per_file
    }

    pub fn mode(&self) -> RotationMode {
        if self.period_minutes > 0 {
            let minutes = self.period_minutes.min(MAX_PERIOD_MINUTES);
            RotationMode::Timed(Duration::from_secs(minutes * 60))
        } else {
            RotationMode::LineCount(self.max_lines_per_file)
        }
    }

    /// Timer period, only in timed mode
    pub fn timer_period(&self) -> Option<Duration> {
        match self.mode() {
            RotationMode::Timed(period) => Some(period),
            RotationMode::LineCount(_) => None,
        }
    }

    /// Whether the file that just received a record is full
    pub fn should_rotate_after_write(&self, state: &RotationState) -> bool {
        match self.mode() {
            RotationMode::LineCount(max) => state.lines_in_file >= max,
            RotationMode::Timed(_) => false,
        }
    }

    /// Whether a timer tick rotates
    pub fn should_rotate_on_tick(&self) -> bool {
        matches!(self.mode(), RotationMode::Timed(_))
    }
}
