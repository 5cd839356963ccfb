//! Buffer selectors for conversion and bulk transfer commands

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// One of the two on-device character buffers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum CharBuffer {
    #[default]
    One = 1,
    Two = 2,
}

impl CharBuffer {
    /// Buffer number as sent on the wire
    pub fn id(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for CharBuffer {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            1 => Ok(Self::One),
            2 => Ok(Self::Two),
            _ => Err(Error::Validation(format!(
                "char buffer must be 1 or 2, got {}",
                value
            ))),
        }
    }
}

/// Which device buffer a bulk transfer reads or fills
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferKind {
    /// Raw image buffer
    Image,

    /// Character (template) buffer
    Character,
}

impl FromStr for BufferKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "image" => Ok(Self::Image),
            "char" | "character" => Ok(Self::Character),
            other => Err(Error::Parse(format!("unknown sensor buffer '{}'", other))),
        }
    }
}

impl fmt::Display for BufferKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Image => f.write_str("image"),
            Self::Character => f.write_str("char"),
        }
    }
}
