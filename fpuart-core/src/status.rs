//! Confirmation codes returned in byte 0 of every Ack payload

use std::fmt;

/// Device status (confirmation code)
///
/// A status is an ordinary value, not an error: callers branch on it, for
/// example polling `GetImage` until the finger is present.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Status {
    Ok,
    PacketReceiveErr,
    NoFinger,
    ImageFail,
    ImageMess,
    FeatureFail,
    NoMatch,
    NotFound,
    EnrollMismatch,
    BadLocation,
    ReadTemplateFail,
    UploadFeatureFail,
    PacketResponseFail,
    UploadFail,
    DeleteFail,
    DbClearFail,
    PasswordFail,
    InvalidImage,
    FlashErr,
    InvalidRegister,
    AddressCode,
    PasswordRequired,
    ModuleOk,
    /// Vendor code without a name here
    Other(u8),
}

impl Status {
    pub fn is_ok(self) -> bool {
        self == Self::Ok
    }

    pub fn code(self) -> u8 {
        match self {
            Self::Ok => 0x00,
            Self::PacketReceiveErr => 0x01,
            Self::NoFinger => 0x02,
            Self::ImageFail => 0x03,
            Self::ImageMess => 0x06,
            Self::FeatureFail => 0x07,
            Self::NoMatch => 0x08,
            Self::NotFound => 0x09,
            Self::EnrollMismatch => 0x0A,
            Self::BadLocation => 0x0B,
            Self::ReadTemplateFail => 0x0C,
            Self::UploadFeatureFail => 0x0D,
            Self::PacketResponseFail => 0x0E,
            Self::UploadFail => 0x0F,
            Self::DeleteFail => 0x10,
            Self::DbClearFail => 0x11,
            Self::PasswordFail => 0x13,
            Self::InvalidImage => 0x15,
            Self::FlashErr => 0x18,
            Self::InvalidRegister => 0x1A,
            Self::AddressCode => 0x20,
            Self::PasswordRequired => 0x21,
            Self::ModuleOk => 0x55,
            Self::Other(code) => code,
        }
    }

    /// Short human readable meaning
    pub fn description(self) -> &'static str {
        match self {
            Self::Ok => "command completed",
            Self::PacketReceiveErr => "error receiving packet",
            Self::NoFinger => "no finger on sensor",
            Self::ImageFail => "failed to enroll finger image",
            Self::ImageMess => "image too disorderly",
            Self::FeatureFail => "too few feature points",
            Self::NoMatch => "fingers do not match",
            Self::NotFound => "no matching finger found",
            Self::EnrollMismatch => "failed to combine character files",
            Self::BadLocation => "location beyond library",
            Self::ReadTemplateFail => "error reading template from library",
            Self::UploadFeatureFail => "error uploading template",
            Self::PacketResponseFail => "module cannot receive following data packets",
            Self::UploadFail => "error uploading image",
            Self::DeleteFail => "failed to delete template",
            Self::DbClearFail => "failed to clear library",
            Self::PasswordFail => "wrong password",
            Self::InvalidImage => "no valid primary image",
            Self::FlashErr => "error writing flash",
            Self::InvalidRegister => "invalid register number",
            Self::AddressCode => "address code mismatch",
            Self::PasswordRequired => "password must be verified",
            Self::ModuleOk => "module ready",
            Self::Other(_) => "undocumented status",
        }
    }
}

impl From<u8> for Status {
    fn from(code: u8) -> Self {
        match code {
            0x00 => Self::Ok,
            0x01 => Self::PacketReceiveErr,
            0x02 => Self::NoFinger,
            0x03 => Self::ImageFail,
            0x06 => Self::ImageMess,
            0x07 => Self::FeatureFail,
            0x08 => Self::NoMatch,
            0x09 => Self::NotFound,
            0x0A => Self::EnrollMismatch,
            0x0B => Self::BadLocation,
            0x0C => Self::ReadTemplateFail,
            0x0D => Self::UploadFeatureFail,
            0x0E => Self::PacketResponseFail,
            0x0F => Self::UploadFail,
            0x10 => Self::DeleteFail,
            0x11 => Self::DbClearFail,
            0x13 => Self::PasswordFail,
            0x15 => Self::InvalidImage,
            0x18 => Self::FlashErr,
            0x1A => Self::InvalidRegister,
            0x20 => Self::AddressCode,
            0x21 => Self::PasswordRequired,
            0x55 => Self::ModuleOk,
            other => Self::Other(other),
        }
    }
}

impl From<Status> for u8 {
    fn from(status: Status) -> u8 {
        status.code()
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (0x{:02X})", self.description(), self.code())
    }
}
