//! High-level error types

use fpuart_core::{Command, Status};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Core protocol error: {0}")]
    Core(#[from] fpuart_core::Error),
    
    #[error("Transport error: {0}")]
    Transport(#[from] fpuart_transport::Error),
    
    #[error("Type error: {0}")]
    Types(#[from] fpuart_types::Error),
    
    #[error("Password rejected by sensor: {0}")]
    PasswordRejected(Status),
    
    #[error("{command} failed: {status}")]
    CommandFailed {
        command: Command,
        status: Status,
    },
    
    #[error("Sensor did not send the ready handshake (got 0x{received:02X})")]
    HandshakeMissing {
        received: u8,
    },
    
    #[error("Sensor module not ready (echo 0x{received:02X})")]
    ModuleNotReady {
        received: u8,
    },
    
    #[error("Session desynchronized - resync before sending further commands")]
    Desynchronized,
    
    #[error("Invalid response from sensor: {0}")]
    InvalidResponse(String),
}

impl Error {
    /// Whether the link may be out of step with the sensor after this error
    pub fn requires_resync(&self) -> bool {
        match self {
            Self::Transport(_) | Self::HandshakeMissing { .. } => true,
            Self::Core(e) => e.desynchronizes(),
            _ => false,
        }
    }
    
    /// Check if error is recoverable (resync and retry might succeed)
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Transport(fpuart_transport::Error::ReadTimeout)
                | Self::Transport(fpuart_transport::Error::ShortRead { .. })
                | Self::Transport(fpuart_transport::Error::Io(_))
                | Self::Core(fpuart_core::Error::ChecksumMismatch { .. })
                | Self::Desynchronized
        )
    }
}
