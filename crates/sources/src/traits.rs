//! Source traits
//!
//! `SourceProvider` is the acquisition step (open a device, connect a
//! socket); `ChunkSource` is the open stream that yields text chunks until
//! it closes.

use async_trait::async_trait;

use crate::error::Result;

/// An open stream of text chunks
#[async_trait]
pub trait ChunkSource: Send {
    /// Wait for the next chunk
    ///
    /// Returns `Ok(None)` once the stream has closed. Chunks may be empty and
    /// may split lines anywhere. Must be cancel-safe: dropping the future
    /// before it resolves loses no data.
    async fn next_chunk(&mut self) -> Result<Option<String>>;

    /// Release the underlying transport
    async fn close(&mut self) -> Result<()>;

    /// Human-readable description for logs and notices
    fn describe(&self) -> &str;
}

/// Opens chunk sources
#[async_trait]
pub trait SourceProvider: Send + Sync {
    /// Acquire the source
    ///
    /// # Errors
    ///
    /// Returns `SourceError::Acquisition` if the source cannot be opened.
    async fn open(&self) -> Result<Box<dyn ChunkSource>>;

    /// Human-readable description of what `open` will acquire
    fn describe(&self) -> String;
}
