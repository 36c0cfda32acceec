//! TCP source
//!
//! Connects to a serial-over-TCP bridge (ser2net, an ESP-link, a terminal
//! server) and reads the raw byte stream. The bridge closing the connection
//! ends the stream like a device EOF.

use std::io;
use std::time::Duration;

use async_trait::async_trait;
use tokio::net::TcpStream;

use crate::error::{Result, SourceError};
use crate::reader::ReaderSource;
use crate::traits::{ChunkSource, SourceProvider};

/// Default connect timeout (10s)
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Connects to `address` and streams what the peer sends
#[derive(Debug, Clone)]
pub struct TcpSourceProvider {
    address: String,
    read_buffer_size: usize,
    connect_timeout: Duration,
}

impl TcpSourceProvider {
    /// Create a provider for `host:port`
    pub fn new(address: impl Into<String>, read_buffer_size: usize) -> Self {
        Self {
            address: address.into(),
            read_buffer_size,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }

    /// Override the connect timeout
    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }
}

#[async_trait]
impl SourceProvider for TcpSourceProvider {
    async fn open(&self) -> Result<Box<dyn ChunkSource>> {
        let stream = match tokio::time::timeout(
            self.connect_timeout,
            TcpStream::connect(&self.address),
        )
        .await
        {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => return Err(SourceError::acquisition(&self.address, e)),
            Err(_) => {
                return Err(SourceError::acquisition(
                    &self.address,
                    io::Error::new(io::ErrorKind::TimedOut, "connect timed out"),
                ));
            }
        };

        if let Err(e) = stream.set_nodelay(true) {
            tracing::warn!(address = %self.address, error = %e, "failed to set TCP_NODELAY");
        }

        tracing::info!(address = %self.address, "connected to serial bridge");

        Ok(Box::new(ReaderSource::new(
            stream,
            self.read_buffer_size,
            format!("tcp://{}", self.address),
        )))
    }

    fn describe(&self) -> String {
        format!("tcp://{}", self.address)
    }
}
