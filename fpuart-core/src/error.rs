//! Error types for fpuart-core

use crate::packet::Address;

/// Result type alias for fpuart-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core protocol errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// First two bytes are not the 0xEF01 start code
    #[error("Bad start code: expected 0xEF01, got 0x{found:04X}")]
    BadStart {
        found: u16,
    },
    
    /// Frame is addressed to a different module
    #[error("Bad address: expected {expected}, got {found}")]
    BadAddress {
        expected: Address,
        found: Address,
    },
    
    /// Packet type is unknown or not acceptable here
    #[error("Bad packet type: 0x{found:02X}")]
    BadType {
        found: u8,
    },
    
    /// Length field cannot account for the checksum
    #[error("Invalid length field: {0} (must be at least 2)")]
    InvalidLength(u16),
    
    /// Frame is shorter than its header or length field claims
    #[error("Frame too short: expected at least {expected} bytes, got {actual} bytes")]
    FrameTooShort {
        expected: usize,
        actual: usize,
    },
    
    /// Checksum verification failed
    #[error("Checksum mismatch: expected 0x{expected:04X}, received 0x{received:04X}")]
    ChecksumMismatch {
        expected: u16,
        received: u16,
    },
    
    /// Ack packet carried no status byte
    #[error("Ack packet has an empty payload")]
    EmptyPayload,
    
    /// Payload does not fit the 16-bit length field
    #[error("Payload too large: {size} bytes (max: {max} bytes)")]
    PayloadTooLarge {
        size: usize,
        max: usize,
    },
    
    /// Bulk chunk size of zero
    #[error("Invalid chunk size: {0}")]
    InvalidChunkSize(usize),
    
    /// Unknown instruction code
    #[error("Unknown command code: 0x{0:02X}")]
    UnknownCommand(u8),
    
    /// Invalid session state transition
    #[error("Invalid session state: {0}")]
    InvalidSessionState(String),
}

impl Error {
    /// Whether the byte stream may now be out of step with the device
    pub fn desynchronizes(&self) -> bool {
        !matches!(
            self,
            Self::PayloadTooLarge { .. }
                | Self::InvalidChunkSize(_)
                | Self::UnknownCommand(_)
                | Self::InvalidSessionState(_)
        )
    }
}
