//! Session management for the sensor protocol
//!
//! A session represents one logical link to a module and tracks:
//! - The module address every frame carries
//! - The handshake password
//! - Whether the handshake succeeded and the byte stream is still in step

use std::sync::Arc;

use crate::{
    constants::DEFAULT_PASSWORD,
    error::{Error, Result},
    packet::Address,
};

/// Session state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Password not verified yet
    Unverified,

    /// Password verified and ready for commands
    Verified,

    /// A transfer failed mid-flight; replies may no longer line up with requests
    Desynchronized,
}

/// Session handle
///
/// Cheap to clone (Arc internally); clones observe the same state, so a
/// monitoring task can watch the link while the owner drives commands.
#[derive(Debug, Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

#[derive(Debug)]
struct SessionInner {
    address: Address,

    password: [u8; 4],

    state: parking_lot::RwLock<SessionState>,
}

impl Session {
    /// Create an unverified session
    pub fn new(address: Address, password: u32) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                address,
                password: password.to_be_bytes(),
                state: parking_lot::RwLock::new(SessionState::Unverified),
            }),
        }
    }

    /// Address frames are sent to and accepted from
    pub fn address(&self) -> Address {
        self.inner.address
    }

    /// Password as sent in the handshake
    pub fn password(&self) -> [u8; 4] {
        self.inner.password
    }

    /// Get current state
    pub fn state(&self) -> SessionState {
        *self.inner.state.read()
    }

    /// Check if verified and in step
    pub fn is_ready(&self) -> bool {
        matches!(self.state(), SessionState::Verified)
    }

    /// Record a successful password handshake
    ///
    /// Allowed from `Unverified` and, to recover, from `Desynchronized`.
    pub fn verify(&self) -> Result<()> {
        let mut state = self.inner.state.write();

        if *state == SessionState::Verified {
            return Err(Error::InvalidSessionState(
                format!("Cannot verify from state: {:?}", *state)
            ));
        }

        *state = SessionState::Verified;
        Ok(())
    }

    /// Mark the byte stream as out of step
    pub fn desynchronize(&self) {
        *self.inner.state.write() = SessionState::Desynchronized;
    }

    /// Forget the handshake (after a soft reset or close)
    pub fn reset(&self) {
        *self.inner.state.write() = SessionState::Unverified;
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(Address::BROADCAST, DEFAULT_PASSWORD)
    }
}
