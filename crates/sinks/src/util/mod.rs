//! Sink utilities
//!
//! - **chain_writer**: Pluggable buffered writers wrapped around output files
//! - **rate_limited_logger**: Keeps repeated write failures from flooding logs

pub mod chain_writer;
pub mod rate_limited_logger;

pub use chain_writer::{ChainWrite, ChainWriter, PlainTextWriter, DEFAULT_BUFFER_SIZE};
pub use rate_limited_logger::{DEFAULT_LOG_INTERVAL, RateLimitedLogger};
