//! comlog Protocol - Core types shared by every stage of the capture pipeline
//!
//! This crate provides the values that flow from a source to the sinks:
//! - `Record` - One timestamped, newline-free log message
//! - `Clock` - Injectable wall-clock abstraction
//! - `Timestamper` - Fixed-offset, filename-safe timestamps
//!
//! # File Format
//!
//! Records serialize to one CSV line each:
//!
//! ```text
//! Timestamp,Message
//! 2025-01-15_13-30-45,temperature=21.5 humidity=40
//! ```
//!
//! Commas inside the message are not quoted or escaped. Readers that split
//! on the first comma recover the message unchanged.

mod clock;
mod error;
mod record;
mod timestamp;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::ProtocolError;
pub use record::{CSV_HEADER, Record};
pub use timestamp::{DEFAULT_UTC_OFFSET_HOURS, TIMESTAMP_FORMAT, Timestamper};

/// Result type for protocol operations
pub type Result<T> = std::result::Result<T, ProtocolError>;

#[cfg(test)]
mod timestamp_test;
