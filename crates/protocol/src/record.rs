//! Log records
//!
//! A `Record` is one finalized line from the source paired with the time it
//! was finalized. Records are transient: built once, handed to the sink and
//! the display, then dropped.

use std::fmt;

/// Header line written at the top of every output file (without terminator)
pub const CSV_HEADER: &str = "Timestamp,Message";

/// One timestamped, newline-free log message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    timestamp: String,
    message: String,
}

impl Record {
    /// Build a record, normalizing line breaks in `message`
    ///
    /// Every run of `\r`/`\n` characters becomes a single space so the
    /// serialized record always occupies exactly one line.
    pub fn new(timestamp: impl Into<String>, message: impl AsRef<str>) -> Self {
        Self {
            timestamp: timestamp.into(),
            message: normalize_line_breaks(message.as_ref()),
        }
    }

    /// Timestamp string
    #[inline]
    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    /// Message text
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Serialized CSV line including the trailing `\n`
    pub fn to_csv_line(&self) -> String {
        let mut line = String::with_capacity(self.timestamp.len() + self.message.len() + 2);
        self.write_csv_line(&mut line);
        line
    }

    /// Append the serialized CSV line (with `\n`) to `buf`
    pub fn write_csv_line(&self, buf: &mut String) {
        buf.push_str(&self.timestamp);
        buf.push(',');
        buf.push_str(&self.message);
        buf.push('\n');
    }
}

/// Renders as `timestamp,message`, the form shown on the display surface
impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.timestamp, self.message)
    }
}

fn normalize_line_breaks(message: &str) -> String {
    if !message.contains(['\n', '\r']) {
        return message.to_owned();
    }

    let mut out = String::with_capacity(message.len());
    let mut in_break = false;
    for ch in message.chars() {
        if ch == '\n' || ch == '\r' {
            if !in_break {
                out.push(' ');
                in_break = true;
            }
        } else {
            out.push(ch);
            in_break = false;
        }
    }
    out
}
