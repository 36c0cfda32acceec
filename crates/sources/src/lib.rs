//! comlog Sources
//!
//! Line-oriented inputs that produce raw text chunks, and the assembler that
//! turns those chunks into complete lines.
//!
//! # Available Sources
//!
//! - **Device** - Character device or regular file (`/dev/ttyUSB0`, a capture file)
//! - **Stdin** - Standard input, for piping from another tool
//! - **TCP** - Serial-over-TCP bridges such as ser2net
//! - **Channel** - In-process chunks, for embedding and tests
//!
//! # Design
//!
//! - **Chunks, not lines**: sources deliver whatever the transport returned;
//!   line boundaries are the `LineAssembler`'s job
//! - **Incremental UTF-8**: byte sources decode through `Utf8ChunkDecoder` so
//!   a multi-byte character split across reads is never mangled
//! - **Cancel-safe reads**: `next_chunk` can be dropped inside `tokio::select!`
//!   without losing bytes already consumed from the transport
//!
//! # Example
//!
//! ```ignore
//! use comlog_sources::{DeviceSourceProvider, LineAssembler, SourceProvider};
//!
//! let provider = DeviceSourceProvider::new("/dev/ttyUSB0", 4096);
//! let mut source = provider.open().await?;
//! let mut assembler = LineAssembler::new();
//!
//! while let Some(chunk) = source.next_chunk().await? {
//!     for line in assembler.feed(&chunk) {
//!         println!("{line}");
//!     }
//! }
//! ```

mod assembler;
mod channel;
mod decoder;
mod device;
mod error;
mod reader;
mod stdin;
mod tcp;
mod traits;

pub use assembler::{DEFAULT_MAX_PENDING, LineAssembler};
pub use channel::{ChannelFeeder, ChannelSource, ChannelSourceProvider};
pub use decoder::Utf8ChunkDecoder;
pub use device::DeviceSourceProvider;
pub use error::{Result, SourceError};
pub use reader::ReaderSource;
pub use stdin::StdinSourceProvider;
pub use tcp::{DEFAULT_CONNECT_TIMEOUT, TcpSourceProvider};
pub use traits::{ChunkSource, SourceProvider};

/// Default number of bytes requested per read
pub const DEFAULT_READ_BUFFER_SIZE: usize = 4096;
