//! Chunk source over any async byte reader

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::decoder::Utf8ChunkDecoder;
use crate::error::{Result, SourceError};
use crate::traits::ChunkSource;

/// Adapts an `AsyncRead` into a `ChunkSource`
///
/// Each successful read becomes one chunk after incremental UTF-8 decoding.
/// Reads that only contain part of a multi-byte character produce no chunk;
/// the bytes are held until the character completes.
pub struct ReaderSource<R> {
    reader: Option<R>,
    decoder: Utf8ChunkDecoder,
    buffer: Vec<u8>,
    description: String,
    bytes_read: u64,
}

impl<R> ReaderSource<R>
where
    R: AsyncRead + Unpin + Send,
{
    /// Wrap `reader`, requesting up to `read_buffer_size` bytes per read
    pub fn new(reader: R, read_buffer_size: usize, description: impl Into<String>) -> Self {
        Self {
            reader: Some(reader),
            decoder: Utf8ChunkDecoder::new(),
            buffer: vec![0; read_buffer_size.max(1)],
            description: description.into(),
            bytes_read: 0,
        }
    }

    /// Total bytes read from the transport
    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }
}

#[async_trait]
impl<R> ChunkSource for ReaderSource<R>
where
    R: AsyncRead + Unpin + Send,
{
    async fn next_chunk(&mut self) -> Result<Option<String>> {
        loop {
            let Some(reader) = self.reader.as_mut() else {
                return Ok(None);
            };

            let n = reader
                .read(&mut self.buffer)
                .await
                .map_err(|e| SourceError::read(&self.description, e))?;

            if n == 0 {
                // Closed: release the reader and surface any held-back bytes
                self.reader = None;
                let tail = self.decoder.finish();
                return Ok((!tail.is_empty()).then_some(tail));
            }

            self.bytes_read += n as u64;
            let text = self.decoder.decode(&self.buffer[..n]);
            if !text.is_empty() {
                return Ok(Some(text));
            }

            tracing::trace!(
                source = %self.description,
                held = self.decoder.pending_len(),
                "read ended inside a multi-byte character"
            );
        }
    }

    async fn close(&mut self) -> Result<()> {
        if self.reader.take().is_some() {
            tracing::debug!(
                source = %self.description,
                bytes_read = self.bytes_read,
                "source released"
            );
        }
        Ok(())
    }

    fn describe(&self) -> &str {
        &self.description
    }
}
