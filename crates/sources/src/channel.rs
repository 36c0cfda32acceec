//! In-process channel source
//!
//! Lets an embedding application (or a test) push chunks directly. Each
//! `ChannelSourceProvider::feeder()` call prepares one stream; the next
//! `open()` picks it up. Dropping the feeder closes the stream.

use std::collections::VecDeque;
use std::io;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::mpsc;

use crate::error::{Result, SourceError};
use crate::traits::{ChunkSource, SourceProvider};

/// Default queue depth per stream
const DEFAULT_QUEUE_SIZE: usize = 256;

type Item = io::Result<String>;

/// Hands out prepared channel streams
#[derive(Debug)]
pub struct ChannelSourceProvider {
    name: String,
    queue_size: usize,
    ready: Mutex<VecDeque<mpsc::Receiver<Item>>>,
}

impl ChannelSourceProvider {
    /// Create a provider with no prepared streams
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            queue_size: DEFAULT_QUEUE_SIZE,
            ready: Mutex::new(VecDeque::new()),
        }
    }

    /// Prepare a stream for the next `open()` and return its sending half
    pub fn feeder(&self) -> ChannelFeeder {
        let (tx, rx) = mpsc::channel(self.queue_size);
        self.ready.lock().push_back(rx);
        ChannelFeeder { tx }
    }

    /// Streams prepared but not yet opened
    pub fn ready_count(&self) -> usize {
        self.ready.lock().len()
    }
}

#[async_trait]
impl SourceProvider for ChannelSourceProvider {
    async fn open(&self) -> Result<Box<dyn ChunkSource>> {
        let receiver = self.ready.lock().pop_front().ok_or_else(|| {
            SourceError::acquisition(
                &self.name,
                io::Error::new(io::ErrorKind::NotConnected, "no stream prepared"),
            )
        })?;

        Ok(Box::new(ChannelSource {
            receiver: Some(receiver),
            name: self.name.clone(),
        }))
    }

    fn describe(&self) -> String {
        format!("channel:{}", self.name)
    }
}

/// Sending half of a channel stream
#[derive(Debug, Clone)]
pub struct ChannelFeeder {
    tx: mpsc::Sender<Item>,
}

impl ChannelFeeder {
    /// Deliver a chunk; returns false if the source was released
    pub async fn send(&self, chunk: impl Into<String>) -> bool {
        self.tx.send(Ok(chunk.into())).await.is_ok()
    }

    /// Make the source's next read fail with `error`
    pub async fn fail(&self, error: io::Error) -> bool {
        self.tx.send(Err(error)).await.is_ok()
    }

    /// True once the receiving source was released
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Receiving half, as returned by `ChannelSourceProvider::open`
#[derive(Debug)]
pub struct ChannelSource {
    receiver: Option<mpsc::Receiver<Item>>,
    name: String,
}

#[async_trait]
impl ChunkSource for ChannelSource {
    async fn next_chunk(&mut self) -> Result<Option<String>> {
        let Some(receiver) = self.receiver.as_mut() else {
            return Ok(None);
        };

        match receiver.recv().await {
            Some(Ok(chunk)) => Ok(Some(chunk)),
            Some(Err(e)) => Err(SourceError::read(&self.name, e)),
            None => Ok(None),
        }
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(mut receiver) = self.receiver.take() {
            receiver.close();
        }
        Ok(())
    }

    fn describe(&self) -> &str {
        &self.name
    }
}
