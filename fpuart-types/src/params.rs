//! System parameter structures

use std::fmt;

use byteorder::{BigEndian, ByteOrder};

use crate::error::{Error, Result};

bitflags::bitflags! {
    /// Status register bits reported by `ReadSysPara`
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct StatusRegister: u16 {
        /// System is executing a command
        const BUSY = 1 << 0;
        /// A finger matched
        const PASS = 1 << 1;
        /// Handshake password verified
        const PASSWORD_VERIFIED = 1 << 2;
        /// Image buffer holds a valid image
        const IMAGE_BUFFER_VALID = 1 << 3;
    }
}

/// Data packet chunk size used for bulk transfers
///
/// The device reports and accepts it as a code from 0 to 3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum PacketSize {
    Bytes32 = 0,
    Bytes64 = 1,
    #[default]
    Bytes128 = 2,
    Bytes256 = 3,
}

impl PacketSize {
    /// Decode a size code as reported by the device
    pub fn from_code(code: u16) -> Result<Self> {
        match code {
            0 => Ok(Self::Bytes32),
            1 => Ok(Self::Bytes64),
            2 => Ok(Self::Bytes128),
            3 => Ok(Self::Bytes256),
            _ => Err(Error::Parse(format!("unknown packet size code {}", code))),
        }
    }

    /// Wire code of this size
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Chunk length in bytes
    pub fn bytes(self) -> usize {
        32 << (self as usize)
    }
}

/// Parameters writable with `SetSysPara`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum SystemParameter {
    /// Baud rate multiplier N (baud = N * 9600)
    BaudRate = 4,

    /// Matching security level, 1 to 5
    SecurityLevel = 5,

    /// Data packet size code, 0 to 3
    PacketSize = 6,
}

impl SystemParameter {
    pub fn id(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for SystemParameter {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            4 => Ok(Self::BaudRate),
            5 => Ok(Self::SecurityLevel),
            6 => Ok(Self::PacketSize),
            _ => Err(Error::Validation(format!("unknown system parameter {}", value))),
        }
    }
}

/// Snapshot of the sensor's system parameters
///
/// Values are only as fresh as the last `ReadSysPara` round trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SystemParameters {
    pub status_register: StatusRegister,

    /// System identifier code (datasheets list 0x0009)
    pub system_id: u16,

    /// Template library capacity
    pub library_size: u16,

    /// Security level, 1 to 5
    pub security_level: u16,

    /// Address the device answers on
    pub device_address: [u8; 4],

    /// Negotiated bulk transfer chunk size
    pub packet_size: PacketSize,

    /// Baud rate multiplier N
    pub baud_multiplier: u16,
}

impl SystemParameters {
    /// Size of the encoded parameter block
    pub const ENCODED_LEN: usize = 16;

    /// Parse the 16 parameter bytes that follow the status byte
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < Self::ENCODED_LEN {
            return Err(Error::Parse(format!(
                "system parameters need {} bytes, got {}",
                Self::ENCODED_LEN,
                data.len()
            )));
        }

        let mut device_address = [0u8; 4];
        device_address.copy_from_slice(&data[8..12]);

        Ok(Self {
            status_register: StatusRegister::from_bits_retain(BigEndian::read_u16(&data[0..2])),
            system_id: BigEndian::read_u16(&data[2..4]),
            library_size: BigEndian::read_u16(&data[4..6]),
            security_level: BigEndian::read_u16(&data[6..8]),
            device_address,
            packet_size: PacketSize::from_code(BigEndian::read_u16(&data[12..14]))?,
            baud_multiplier: BigEndian::read_u16(&data[14..16]),
        })
    }

    /// Baud rate in bits per second
    pub fn baud_rate(&self) -> u32 {
        u32::from(self.baud_multiplier) * 9600
    }

    /// Number of 256-slot index pages covering the library
    pub fn index_pages(&self) -> u16 {
        self.library_size.div_ceil(256)
    }

    /// Mirror a successful `SetSysPara` write into this snapshot
    pub fn apply(&mut self, param: SystemParameter, value: u8) -> Result<()> {
        match param {
            SystemParameter::BaudRate => self.baud_multiplier = u16::from(value),
            SystemParameter::SecurityLevel => self.security_level = u16::from(value),
            SystemParameter::PacketSize => self.packet_size = PacketSize::from_code(u16::from(value))?,
        }
        Ok(())
    }
}

impl fmt::Display for SystemParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Sensor[capacity: {}, security: {}, packet: {}B, baud: {}]",
            self.library_size,
            self.security_level,
            self.packet_size.bytes(),
            self.baud_rate()
        )
    }
}
