//! # fpuart-core
//!
//! Core protocol implementation for UART optical fingerprint sensors
//! (R30x/R50x/AS608 family).
//!
//! This crate provides the low-level protocol primitives:
//! - Packet structure and encoding/decoding
//! - Checksum calculation
//! - Bulk transfer reassembly and chunking
//! - Instruction and confirmation codes
//! - Session state

pub mod bulk;
pub mod checksum;
pub mod command;
pub mod constants;
pub mod error;
pub mod packet;
pub mod session;
pub mod status;

pub use bulk::BulkReader;
pub use command::Command;
pub use error::{Error, Result};
pub use packet::{Address, ChecksumPolicy, Header, Packet, PacketType};
pub use session::{Session, SessionState};
pub use status::Status;
