//! comlog Tap - Live view of captured lines
//!
//! Keeps the most recent lines of a capture in memory so a UI surface can
//! show them while the session writes to disk.
//!
//! # Example
//!
//! ```ignore
//! use comlog_tap::SharedDisplay;
//!
//! let display = SharedDisplay::with_capacity(100)?;
//! display.push("2025-01-15_13-30-45,hello");
//! for line in display.contents() {
//!     println!("{line}");
//! }
//! ```

mod buffer;
mod error;

pub use buffer::{DEFAULT_CAPACITY, DisplayBuffer, SharedDisplay};
pub use error::{Result, TapError};
