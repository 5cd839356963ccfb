//! Transport layer for the fingerprint sensor protocol
//!
//! The sensor is reached over a byte-oriented duplex link (a UART, or a
//! serial-over-TCP bridge). The protocol core only needs exact-length reads
//! and whole writes from it.

pub mod error;
pub mod mock;
pub mod stream;
pub mod tcp;

pub use error::{Error, Result};
pub use mock::{MockHandle, MockTransport};
pub use stream::StreamTransport;
pub use tcp::TcpTransport;

use std::time::Duration;

use async_trait::async_trait;
use bytes::BytesMut;

/// Default read timeout
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(5);

/// Default connection timeout
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Byte channel to a sensor
#[async_trait]
pub trait Transport: Send + Sync {
    /// Write all bytes
    async fn write(&mut self, data: &[u8]) -> Result<()>;
    
    /// Read exactly `count` bytes
    ///
    /// Fails the whole read (`ShortRead`, `ReadTimeout`, ...) rather than
    /// returning fewer bytes.
    async fn read_exact(&mut self, count: usize) -> Result<BytesMut>;
    
    /// Close the channel
    async fn close(&mut self) -> Result<()>;
    
    /// Check if the channel is open
    fn is_open(&self) -> bool;
    
    /// Human readable endpoint (port name, remote address)
    fn describe(&self) -> String;
}
