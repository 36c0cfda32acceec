//! Standard input source

use async_trait::async_trait;

use crate::error::Result;
use crate::reader::ReaderSource;
use crate::traits::{ChunkSource, SourceProvider};

/// Reads chunks from the process's standard input
#[derive(Debug, Clone)]
pub struct StdinSourceProvider {
    read_buffer_size: usize,
}

impl StdinSourceProvider {
    /// Create a stdin provider
    pub fn new(read_buffer_size: usize) -> Self {
        Self { read_buffer_size }
    }
}

#[async_trait]
impl SourceProvider for StdinSourceProvider {
    async fn open(&self) -> Result<Box<dyn ChunkSource>> {
        Ok(Box::new(ReaderSource::new(
            tokio::io::stdin(),
            self.read_buffer_size,
            "stdin",
        )))
    }

    fn describe(&self) -> String {
        "stdin".into()
    }
}
