//! Device source
//!
//! Opens a character device (a serial port node such as `/dev/ttyUSB0`), a
//! FIFO, or a regular file for reading. Line settings (baud rate, parity) are
//! expected to be configured beforehand, e.g. with `stty`.
//!
//! Devices and FIFOs are opened with `O_NONBLOCK` and driven by the reactor,
//! so dropping a pending read cancels it and `close` releases the descriptor
//! even when the device is silent. Regular files always have data or EOF and
//! go through `tokio::fs`.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::error::{Result, SourceError};
use crate::reader::ReaderSource;
use crate::traits::{ChunkSource, SourceProvider};

/// Opens a device path as a chunk source
#[derive(Debug, Clone)]
pub struct DeviceSourceProvider {
    path: PathBuf,
    read_buffer_size: usize,
}

impl DeviceSourceProvider {
    /// Create a provider for `path`
    pub fn new(path: impl Into<PathBuf>, read_buffer_size: usize) -> Self {
        Self {
            path: path.into(),
            read_buffer_size,
        }
    }
}

#[async_trait]
impl SourceProvider for DeviceSourceProvider {
    async fn open(&self) -> Result<Box<dyn ChunkSource>> {
        let description = self.path.display().to_string();

        let metadata = tokio::fs::metadata(&self.path)
            .await
            .map_err(|e| SourceError::acquisition(&description, e))?;

        if metadata.is_file() {
            let file = tokio::fs::File::open(&self.path)
                .await
                .map_err(|e| SourceError::acquisition(&description, e))?;
            tracing::info!(path = %description, "capture file opened");
            return Ok(Box::new(ReaderSource::new(
                file,
                self.read_buffer_size,
                description,
            )));
        }

        let source = open_device(&self.path, self.read_buffer_size, &description)
            .map_err(|e| SourceError::acquisition(&description, e))?;
        tracing::info!(path = %description, "device opened");
        Ok(source)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

#[cfg(unix)]
fn open_device(
    path: &Path,
    read_buffer_size: usize,
    description: &str,
) -> std::io::Result<Box<dyn ChunkSource>> {
    use std::os::unix::fs::OpenOptionsExt;

    use nix::errno::Errno;
    use nix::fcntl::OFlag;

    let file = std::fs::OpenOptions::new()
        .read(true)
        .custom_flags(OFlag::O_NONBLOCK.bits())
        .open(path)?;

    match unix::PollDevice::new(file) {
        Ok(device) => Ok(Box::new(ReaderSource::new(
            device,
            read_buffer_size,
            description,
        ))),
        // Not pollable (e.g. /dev/null); reads never wait on such nodes
        Err((e, file)) if e.raw_os_error() == Some(Errno::EPERM as i32) => {
            tracing::debug!(path = %description, "device not pollable, using blocking reads");
            Ok(Box::new(ReaderSource::new(
                tokio::fs::File::from_std(file),
                read_buffer_size,
                description,
            )))
        }
        Err((e, _)) => Err(e),
    }
}

#[cfg(not(unix))]
fn open_device(
    path: &Path,
    read_buffer_size: usize,
    description: &str,
) -> std::io::Result<Box<dyn ChunkSource>> {
    let file = std::fs::File::open(path)?;
    Ok(Box::new(ReaderSource::new(
        tokio::fs::File::from_std(file),
        read_buffer_size,
        description,
    )))
}

#[cfg(unix)]
mod unix {
    use std::fs::File;
    use std::io::{self, Read};
    use std::pin::Pin;
    use std::task::{Context, Poll, ready};

    use tokio::io::unix::AsyncFd;
    use tokio::io::{AsyncRead, Interest, ReadBuf};

    /// Non-blocking device descriptor registered with the reactor
    ///
    /// Dropping it deregisters and closes the descriptor.
    pub(super) struct PollDevice {
        inner: AsyncFd<File>,
    }

    impl PollDevice {
        /// Register `file`, which must be opened with `O_NONBLOCK`
        ///
        /// Gives the file back when the descriptor cannot be polled.
        pub(super) fn new(file: File) -> Result<Self, (io::Error, File)> {
            AsyncFd::try_with_interest(file, Interest::READABLE)
                .map(|inner| Self { inner })
                .map_err(|e| {
                    let (file, error) = e.into_parts();
                    (error, file)
                })
        }
    }

    impl AsyncRead for PollDevice {
        fn poll_read(
            self: Pin<&mut Self>,
            cx: &mut Context<'_>,
            buf: &mut ReadBuf<'_>,
        ) -> Poll<io::Result<()>> {
            loop {
                let mut guard = ready!(self.inner.poll_read_ready(cx))?;

                let unfilled = buf.initialize_unfilled();
                match guard.try_io(|inner| {
                    let mut file: &File = inner.get_ref();
                    file.read(unfilled)
                }) {
                    Ok(Ok(n)) => {
                        buf.advance(n);
                        return Poll::Ready(Ok(()));
                    }
                    Ok(Err(e)) => return Poll::Ready(Err(e)),
                    // readiness was stale; wait again
                    Err(_would_block) => continue,
                }
            }
        }
    }
}
