//! In-memory transport with scripted replies
//!
//! Queue the bytes a sensor would send through a [`MockHandle`], run the code
//! under test against the [`MockTransport`], then inspect what it wrote.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use parking_lot::Mutex;
use tracing::trace;

use crate::{error::*, Transport};

#[derive(Debug, Default)]
struct MockState {
    incoming: VecDeque<u8>,
    writes: Vec<Bytes>,
    reads: usize,
    closed: bool,
}

/// Scripted transport
#[derive(Debug)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

/// Test-side view of a [`MockTransport`]
#[derive(Debug, Clone)]
pub struct MockHandle {
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    /// Create a transport and the handle that scripts it
    pub fn new() -> (Self, MockHandle) {
        let state = Arc::new(Mutex::new(MockState::default()));
        (
            Self {
                state: state.clone(),
            },
            MockHandle { state },
        )
    }
}

impl MockHandle {
    /// Queue bytes for the transport to return
    pub fn push(&self, bytes: &[u8]) {
        self.state.lock().incoming.extend(bytes.iter().copied());
    }

    /// Bytes queued but not read yet
    pub fn pending(&self) -> usize {
        self.state.lock().incoming.len()
    }

    /// Drain the write log
    pub fn take_writes(&self) -> Vec<Bytes> {
        std::mem::take(&mut self.state.lock().writes)
    }

    /// Number of `read_exact` calls so far
    pub fn reads(&self) -> usize {
        self.state.lock().reads
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn write(&mut self, data: &[u8]) -> Result<()> {
        let mut state = self.state.lock();
        if state.closed {
            return Err(Error::NotConnected);
        }

        trace!("Mock write {}", hex::encode(data));
        state.writes.push(Bytes::copy_from_slice(data));
        Ok(())
    }

    async fn read_exact(&mut self, count: usize) -> Result<BytesMut> {
        let mut state = self.state.lock();
        if state.closed {
            return Err(Error::NotConnected);
        }
        state.reads += 1;

        if state.incoming.len() < count {
            let actual = state.incoming.len();
            state.incoming.clear();
            return Err(Error::ShortRead {
                expected: count,
                actual,
            });
        }

        let bytes: Vec<u8> = state.incoming.drain(..count).collect();
        Ok(BytesMut::from(&bytes[..]))
    }

    async fn close(&mut self) -> Result<()> {
        self.state.lock().closed = true;
        Ok(())
    }

    fn is_open(&self) -> bool {
        !self.state.lock().closed
    }

    fn describe(&self) -> String {
        "mock".into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_scripted_reads() {
        let (mut transport, handle) = MockTransport::new();
        handle.push(&[1, 2, 3, 4]);

        assert_eq!(&transport.read_exact(3).await.unwrap()[..], &[1, 2, 3]);
        assert_eq!(handle.pending(), 1);
        assert_eq!(handle.reads(), 1);
    }

    #[tokio::test]
    async fn test_short_read_drains() {
        let (mut transport, handle) = MockTransport::new();
        handle.push(&[1, 2]);

        let result = transport.read_exact(12).await;
        assert!(matches!(result, Err(Error::ShortRead { expected: 12, actual: 2 })));
        assert_eq!(handle.pending(), 0);
    }

    #[tokio::test]
    async fn test_write_log() {
        let (mut transport, handle) = MockTransport::new();

        transport.write(&[0xAA]).await.unwrap();
        transport.write(&[0xBB, 0xCC]).await.unwrap();

        let writes = handle.take_writes();
        assert_eq!(writes.len(), 2);
        assert_eq!(writes[1].as_ref(), &[0xBB, 0xCC]);
        assert!(handle.take_writes().is_empty());
    }

    #[tokio::test]
    async fn test_close() {
        let (mut transport, handle) = MockTransport::new();

        transport.close().await.unwrap();
        assert!(handle.is_closed());
        assert!(!transport.is_open());
        assert!(matches!(transport.write(&[1]).await, Err(Error::NotConnected)));
    }
}
