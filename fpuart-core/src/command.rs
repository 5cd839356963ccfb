//! Sensor instruction codes

use std::fmt;

use crate::constants::reply_len;
use crate::error::{Error, Result};

/// Instruction codes
///
/// The first payload byte of every Command packet.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Command {
    // Imaging and feature extraction
    GetImage = 0x01,
    Image2Tz = 0x02,
    Compare = 0x03,
    Search = 0x04,
    RegModel = 0x05,

    // Library storage
    Store = 0x06,
    Load = 0x07,
    Delete = 0x0C,
    Empty = 0x0D,

    // Bulk transfer
    Upload = 0x08,
    Download = 0x09,
    UploadImage = 0x0A,
    DownloadImage = 0x0B,

    // System
    SetSysParam = 0x0E,
    ReadSysParam = 0x0F,
    VerifyPassword = 0x13,
    HiSpeedSearch = 0x1B,
    TemplateCount = 0x1D,
    TemplateRead = 0x1F,
    SetAura = 0x35,
    SoftReset = 0x3D,
    GetEcho = 0x53,
}

impl Command {
    /// Length of the Ack frame this command is answered with
    pub fn reply_len(self) -> usize {
        match self {
            Self::Compare | Self::TemplateCount => reply_len::WORD,
            Self::Search | Self::HiSpeedSearch => reply_len::DOUBLE_WORD,
            Self::ReadSysParam => reply_len::SYSTEM_PARAMETERS,
            Self::TemplateRead => reply_len::INDEX_PAGE,
            _ => reply_len::STATUS,
        }
    }

    /// Get command name (datasheet naming)
    pub fn name(self) -> &'static str {
        match self {
            Self::GetImage => "GenImg",
            Self::Image2Tz => "Img2Tz",
            Self::Compare => "Match",
            Self::Search => "Search",
            Self::RegModel => "RegModel",
            Self::Store => "Store",
            Self::Load => "LoadChar",
            Self::Delete => "DeletChar",
            Self::Empty => "Empty",
            Self::Upload => "UpChar",
            Self::Download => "DownChar",
            Self::UploadImage => "UpImage",
            Self::DownloadImage => "DownImage",
            Self::SetSysParam => "SetSysPara",
            Self::ReadSysParam => "ReadSysPara",
            Self::VerifyPassword => "VfyPwd",
            Self::HiSpeedSearch => "HighSpeedSearch",
            Self::TemplateCount => "TempleteNum",
            Self::TemplateRead => "ReadIndexTable",
            Self::SetAura => "AuraLedConfig",
            Self::SoftReset => "SoftRst",
            Self::GetEcho => "GetEcho",
        }
    }
}

impl From<Command> for u8 {
    fn from(cmd: Command) -> u8 {
        cmd as u8
    }
}

impl TryFrom<u8> for Command {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0x01 => Ok(Self::GetImage),
            0x02 => Ok(Self::Image2Tz),
            0x03 => Ok(Self::Compare),
            0x04 => Ok(Self::Search),
            0x05 => Ok(Self::RegModel),
            0x06 => Ok(Self::Store),
            0x07 => Ok(Self::Load),
            0x08 => Ok(Self::Upload),
            0x09 => Ok(Self::Download),
            0x0A => Ok(Self::UploadImage),
            0x0B => Ok(Self::DownloadImage),
            0x0C => Ok(Self::Delete),
            0x0D => Ok(Self::Empty),
            0x0E => Ok(Self::SetSysParam),
            0x0F => Ok(Self::ReadSysParam),
            0x13 => Ok(Self::VerifyPassword),
            0x1B => Ok(Self::HiSpeedSearch),
            0x1D => Ok(Self::TemplateCount),
            0x1F => Ok(Self::TemplateRead),
            0x35 => Ok(Self::SetAura),
            0x3D => Ok(Self::SoftReset),
            0x53 => Ok(Self::GetEcho),
            _ => Err(Error::UnknownCommand(value)),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(0x{:02X})", self.name(), *self as u8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_conversion() {
        assert_eq!(u8::from(Command::VerifyPassword), 0x13);
        assert_eq!(Command::try_from(0x1B).unwrap(), Command::HiSpeedSearch);
    }

    #[test]
    fn test_reply_lengths() {
        assert_eq!(Command::GetImage.reply_len(), 12);
        assert_eq!(Command::TemplateCount.reply_len(), 14);
        assert_eq!(Command::Compare.reply_len(), 14);
        assert_eq!(Command::Search.reply_len(), 16);
        assert_eq!(Command::ReadSysParam.reply_len(), 28);
        assert_eq!(Command::TemplateRead.reply_len(), 44);
    }

    #[test]
    fn test_unknown_command() {
        assert!(matches!(Command::try_from(0x99), Err(Error::UnknownCommand(0x99))));
    }
}
