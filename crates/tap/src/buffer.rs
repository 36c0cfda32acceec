//! Bounded display buffer
//!
//! The `DisplayBuffer` keeps the most recent N rendered lines for a live
//! view. Input is unbounded; memory is not. Pushing into a full buffer
//! evicts the oldest line, and shrinking keeps only the newest lines.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::{Result, TapError};

/// Default number of lines kept
pub const DEFAULT_CAPACITY: usize = 100;

/// Upper bound on the preallocated slots
const MAX_PREALLOCATED: usize = 4096;

/// Most-recent-N line buffer
#[derive(Debug, Clone)]
pub struct DisplayBuffer {
    lines: VecDeque<String>,
    capacity: usize,
    /// Lines ever pushed, evicted ones included
    total_pushed: u64,
}

impl DisplayBuffer {
    /// Create a buffer with the default capacity
    pub fn new() -> Self {
        Self::from_parts(DEFAULT_CAPACITY)
    }

    /// Create a buffer holding at most `capacity` lines
    pub fn with_capacity(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(TapError::InvalidCapacity { requested: capacity });
        }
        Ok(Self::from_parts(capacity))
    }

    fn from_parts(capacity: usize) -> Self {
        Self {
            lines: VecDeque::with_capacity(capacity.min(MAX_PREALLOCATED)),
            capacity,
            total_pushed: 0,
        }
    }

    /// Append a line, evicting the oldest when full
    pub fn push(&mut self, line: impl Into<String>) {
        if self.lines.len() == self.capacity {
            self.lines.pop_front();
        }
        self.lines.push_back(line.into());
        self.total_pushed += 1;
    }

    /// Change the capacity, truncating to the newest lines when shrinking
    pub fn set_capacity(&mut self, capacity: usize) -> Result<()> {
        if capacity == 0 {
            return Err(TapError::InvalidCapacity { requested: capacity });
        }

        self.capacity = capacity;
        let excess = self.lines.len().saturating_sub(capacity);
        self.lines.drain(..excess);
        Ok(())
    }

    /// Lines in order, oldest first
    pub fn contents(&self) -> Vec<String> {
        self.lines.iter().cloned().collect()
    }

    /// The newest `n` lines, oldest first
    pub fn last_n(&self, n: usize) -> Vec<String> {
        let skip = self.lines.len().saturating_sub(n);
        self.lines.iter().skip(skip).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn total_pushed(&self) -> u64 {
        self.total_pushed
    }

    /// Remove every line; capacity is unchanged
    pub fn clear(&mut self) {
        self.lines.clear();
    }
}

impl Default for DisplayBuffer {
    fn default() -> Self {
        Self::new()
    }
}

/// Cloneable handle to a display buffer shared between tasks
///
/// The ingest task pushes while a UI surface reads. Locks are held only for
/// the duration of one call.
#[derive(Debug, Clone, Default)]
pub struct SharedDisplay {
    inner: Arc<RwLock<DisplayBuffer>>,
}

impl SharedDisplay {
    pub fn new(buffer: DisplayBuffer) -> Self {
        Self {
            inner: Arc::new(RwLock::new(buffer)),
        }
    }

    pub fn with_capacity(capacity: usize) -> Result<Self> {
        DisplayBuffer::with_capacity(capacity).map(Self::new)
    }

    pub fn push(&self, line: impl Into<String>) {
        self.inner.write().push(line);
    }

    pub fn set_capacity(&self, capacity: usize) -> Result<()> {
        self.inner.write().set_capacity(capacity)
    }

    pub fn contents(&self) -> Vec<String> {
        self.inner.read().contents()
    }

    pub fn last_n(&self, n: usize) -> Vec<String> {
        self.inner.read().last_n(n)
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.inner.read().capacity()
    }

    pub fn total_pushed(&self) -> u64 {
        self.inner.read().total_pushed()
    }

    pub fn clear(&self) {
        self.inner.write().clear();
    }

    /// Copy of the whole buffer taken under one lock
    pub fn snapshot(&self) -> DisplayBuffer {
        self.inner.read().clone()
    }
}

#[cfg(test)]
#[path = "buffer_test.rs"]
mod tests;
