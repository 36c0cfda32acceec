//! Fixed-offset timestamps
//!
//! Timestamps are rendered at a fixed UTC offset (UTC+3 unless configured
//! otherwise) with second resolution. The format contains no colons, commas
//! or spaces so the same string can be used in a CSV field and in a file name.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, FixedOffset, Offset, Utc};

use crate::clock::{Clock, SystemClock};
use crate::error::ProtocolError;

/// Offset applied when none is configured
pub const DEFAULT_UTC_OFFSET_HOURS: i32 = 3;

/// chrono format string, e.g. `2025-01-15_13-30-45`
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

const SECONDS_PER_HOUR: i32 = 3600;

/// Produces timestamp strings from an injectable clock
#[derive(Clone)]
pub struct Timestamper {
    clock: Arc<dyn Clock>,
    offset: FixedOffset,
}

impl Timestamper {
    /// Create a timestamper using the given clock and offset in whole hours
    pub fn new(clock: Arc<dyn Clock>, utc_offset_hours: i32) -> crate::Result<Self> {
        let offset = utc_offset_hours
            .checked_mul(SECONDS_PER_HOUR)
            .and_then(FixedOffset::east_opt)
            .ok_or(ProtocolError::InvalidOffset {
                hours: utc_offset_hours,
            })?;
        Ok(Self { clock, offset })
    }

    /// System clock at the default offset
    pub fn system() -> Self {
        Self {
            clock: Arc::new(SystemClock),
            offset: default_offset(),
        }
    }

    /// Current time rendered with `TIMESTAMP_FORMAT`
    pub fn now(&self) -> String {
        self.format(self.clock.now())
    }

    /// Render `instant` with `TIMESTAMP_FORMAT` at this timestamper's offset
    pub fn format(&self, instant: DateTime<Utc>) -> String {
        instant
            .with_timezone(&self.offset)
            .format(TIMESTAMP_FORMAT)
            .to_string()
    }

    /// Configured offset
    pub fn offset(&self) -> FixedOffset {
        self.offset
    }
}

impl Default for Timestamper {
    fn default() -> Self {
        Self::system()
    }
}

impl fmt::Debug for Timestamper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Timestamper")
            .field("offset", &self.offset)
            .finish_non_exhaustive()
    }
}

fn default_offset() -> FixedOffset {
    FixedOffset::east_opt(DEFAULT_UTC_OFFSET_HOURS * SECONDS_PER_HOUR).unwrap_or(Utc.fix())
}
