//! Line assembly
//!
//! Sources deliver chunks that ignore line boundaries. The `LineAssembler`
//! owns the unterminated tail (the pending buffer) between chunks and hands
//! back every line completed by the newest chunk.
//!
//! # Rules
//!
//! - Lines are terminated by `\n`; the terminator is consumed
//! - Completed lines are trimmed; lines that are empty after trimming are
//!   dropped (this also removes the `\r` of CRLF)
//! - The text after the last `\n` becomes the new pending buffer, even when
//!   it is empty
//! - `flush_remainder` emits the trimmed pending buffer once, at stream end
//!
//! ```text
//! feed("AA")        -> []              pending "AA"
//! feed("BB\nCC\n")  -> ["AABB", "CC"]  pending ""
//! feed("DD")        -> []              pending "DD"
//! flush_remainder() -> Some("DD")
//! ```

/// Default bound on the pending buffer (64KB)
pub const DEFAULT_MAX_PENDING: usize = 64 * 1024;

/// Splits a chunk stream into trimmed, non-empty lines
#[derive(Debug)]
pub struct LineAssembler {
    /// Unterminated tail of the chunks seen so far
    pending: String,

    /// Force-emit threshold for `pending` in bytes (0 = unbounded)
    max_pending: usize,

    /// Lines emitted because `pending` outgrew `max_pending`
    forced_splits: u64,
}

impl LineAssembler {
    /// Create an assembler with the default pending bound
    pub fn new() -> Self {
        Self::with_max_pending(DEFAULT_MAX_PENDING)
    }

    /// Create an assembler with a custom pending bound (0 = unbounded)
    pub fn with_max_pending(max_pending: usize) -> Self {
        Self {
            pending: String::new(),
            max_pending,
            forced_splits: 0,
        }
    }

    /// Append `chunk` and return every line it completed, in order
    pub fn feed(&mut self, chunk: &str) -> Vec<String> {
        let mut lines = Vec::new();

        if chunk.contains('\n') {
            self.pending.push_str(chunk);

            // pending had no terminator before this chunk, so the last one is in it
            let last_newline = self.pending.rfind('\n').unwrap_or(0);
            let tail = self.pending.split_off(last_newline + 1);
            let complete = std::mem::replace(&mut self.pending, tail);

            lines.extend(
                complete
                    .split('\n')
                    .map(str::trim)
                    .filter(|line| !line.is_empty())
                    .map(str::to_owned),
            );
        } else {
            self.pending.push_str(chunk);
        }

        if self.max_pending > 0 && self.pending.len() > self.max_pending {
            self.forced_splits += 1;
            if let Some(line) = self.take_pending() {
                lines.push(line);
            }
        }

        lines
    }

    /// Emit the pending fragment as a final line
    ///
    /// Returns `None` if the pending buffer is empty or whitespace. The
    /// buffer is cleared either way, so a second call returns `None`.
    pub fn flush_remainder(&mut self) -> Option<String> {
        self.take_pending()
    }

    /// Discard the pending fragment without emitting it
    pub fn reset(&mut self) {
        self.pending.clear();
    }

    /// Bytes currently held in the pending buffer
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Lines force-emitted because the pending bound was exceeded
    pub fn forced_splits(&self) -> u64 {
        self.forced_splits
    }

    fn take_pending(&mut self) -> Option<String> {
        let pending = std::mem::take(&mut self.pending);
        let trimmed = pending.trim();
        if trimmed.is_empty() {
            None
        } else if trimmed.len() == pending.len() {
            Some(pending)
        } else {
            Some(trimmed.to_owned())
        }
    }
}

impl Default for LineAssembler {
    fn default() -> Self {
        Self::new()
    }
}
