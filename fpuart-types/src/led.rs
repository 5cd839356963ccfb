//! Aura LED ring settings (R503 and similar modules)

/// LED colour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum LedColor {
    #[default]
    Red = 0x01,
    Blue = 0x02,
    Purple = 0x03,
}

/// LED animation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum LedMode {
    Breathing = 0x01,
    Flashing = 0x02,
    #[default]
    On = 0x03,
    Off = 0x04,
    GraduallyOn = 0x05,
    GraduallyOff = 0x06,
}

impl LedColor {
    pub fn code(self) -> u8 {
        self as u8
    }
}

impl LedMode {
    pub fn code(self) -> u8 {
        self as u8
    }
}
