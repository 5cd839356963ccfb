//! Transport over any async byte stream
//!
//! Wraps a `tokio` `AsyncRead + AsyncWrite` stream: a serial port stream, a
//! pipe to a USB-UART helper process, or `tokio::io::duplex` in tests.

use std::io::ErrorKind;
use std::time::Duration;

use async_trait::async_trait;
use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::{timeout_at, Instant};
use tracing::{debug, trace, warn};

use crate::{error::*, Transport, DEFAULT_READ_TIMEOUT};

/// Stream-backed transport
pub struct StreamTransport<S> {
    name: String,
    stream: Option<S>,
    read_timeout: Duration,
}

impl<S> StreamTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + Sync,
{
    /// Wrap an open stream
    pub fn new(name: impl Into<String>, stream: S) -> Self {
        Self {
            name: name.into(),
            stream: Some(stream),
            read_timeout: DEFAULT_READ_TIMEOUT,
        }
    }

    /// Set read timeout
    ///
    /// Bounds one `read_exact` call as a whole, not each underlying read.
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }
}

#[async_trait]
impl<S> Transport for StreamTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + Sync,
{
    async fn write(&mut self, data: &[u8]) -> Result<()> {
        let stream = self.stream.as_mut().ok_or(Error::NotConnected)?;

        trace!("Sending {} bytes: {}", data.len(), hex::encode(&data[..data.len().min(32)]));

        stream.write_all(data).await.map_err(closed_or_io)?;
        stream.flush().await.map_err(closed_or_io)?;

        Ok(())
    }

    async fn read_exact(&mut self, count: usize) -> Result<BytesMut> {
        let stream = self.stream.as_mut().ok_or(Error::NotConnected)?;

        let deadline = Instant::now() + self.read_timeout;
        let mut buf = BytesMut::zeroed(count);
        let mut filled = 0;

        while filled < count {
            let n = timeout_at(deadline, stream.read(&mut buf[filled..]))
                .await
                .map_err(|_| {
                    warn!("Read timeout after {} of {} bytes", filled, count);
                    Error::ReadTimeout
                })??;

            if n == 0 {
                warn!("Stream ended after {} of {} bytes", filled, count);
                return Err(Error::ShortRead {
                    expected: count,
                    actual: filled,
                });
            }

            filled += n;
        }

        trace!("Received {} bytes: {}", count, hex::encode(&buf[..count.min(32)]));

        Ok(buf)
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(mut stream) = self.stream.take() {
            debug!("Closing {}...", self.name);

            // Graceful shutdown
            let _ = stream.shutdown().await;
        }

        Ok(())
    }

    fn is_open(&self) -> bool {
        self.stream.is_some()
    }

    fn describe(&self) -> String {
        self.name.clone()
    }
}

/// The far end hung up (bridge restarted, cable pulled)
fn closed_or_io(e: std::io::Error) -> Error {
    match e.kind() {
        ErrorKind::BrokenPipe | ErrorKind::ConnectionReset | ErrorKind::ConnectionAborted => {
            Error::ConnectionClosed
        }
        _ => Error::Io(e),
    }
}

impl<S> Drop for StreamTransport<S> {
    fn drop(&mut self) {
        if self.stream.is_some() {
            warn!("Stream transport {} dropped while open", self.name);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_read_exact_across_writes() {
        let (client, mut device) = tokio::io::duplex(64);
        let mut transport = StreamTransport::new("duplex", client);

        device.write_all(&[1, 2, 3]).await.unwrap();
        device.write_all(&[4, 5]).await.unwrap();

        let buf = transport.read_exact(5).await.unwrap();
        assert_eq!(&buf[..], &[1, 2, 3, 4, 5]);
    }

    #[tokio::test]
    async fn test_short_read_is_an_error() {
        let (client, mut device) = tokio::io::duplex(64);
        let mut transport = StreamTransport::new("duplex", client);

        device.write_all(&[1, 2, 3]).await.unwrap();
        drop(device);

        let result = transport.read_exact(12).await;
        assert!(matches!(result, Err(Error::ShortRead { expected: 12, actual: 3 })));
    }

    #[tokio::test(start_paused = true)]
    async fn test_read_timeout() {
        let (client, _device) = tokio::io::duplex(64);
        let mut transport = StreamTransport::new("duplex", client)
            .with_read_timeout(Duration::from_millis(100));

        let result = transport.read_exact(1).await;
        assert!(matches!(result, Err(Error::ReadTimeout)));
    }

    #[tokio::test]
    async fn test_write_after_peer_hangup() {
        let (client, device) = tokio::io::duplex(64);
        let mut transport = StreamTransport::new("duplex", client);

        drop(device);

        let result = transport.write(&[0xEF, 0x01]).await;
        assert!(matches!(result, Err(Error::ConnectionClosed)));
    }

    #[tokio::test]
    async fn test_write_and_close() {
        let (client, mut device) = tokio::io::duplex(64);
        let mut transport = StreamTransport::new("duplex", client);

        transport.write(&[0xEF, 0x01]).await.unwrap();

        let mut buf = [0u8; 2];
        device.read_exact(&mut buf).await.unwrap();
        assert_eq!(buf, [0xEF, 0x01]);

        transport.close().await.unwrap();
        assert!(!transport.is_open());
        assert!(matches!(transport.write(&[0]).await, Err(Error::NotConnected)));
    }
}
