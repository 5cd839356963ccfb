//! Protocol constants

/// Frame start code, sent high byte first
pub const START_CODE: u16 = 0xEF01;

/// Broadcast address every module answers on by default
pub const DEFAULT_ADDRESS: [u8; 4] = [0xFF, 0xFF, 0xFF, 0xFF];

/// Factory handshake password
pub const DEFAULT_PASSWORD: u32 = 0;

/// Byte a module sends when it is ready (after reset, or as an echo reply)
pub const MODULE_OK: u8 = 0x55;

/// Seed status of a template index read before any page succeeds
pub const TEMPLATE_READ_SEED: u8 = 0x0C;

/// Fixed Ack frame lengths, header and checksum included
pub mod reply_len {
    /// Status byte only
    pub const STATUS: usize = 12;

    /// Status and one 16-bit value
    pub const WORD: usize = 14;

    /// Status and two 16-bit values
    pub const DOUBLE_WORD: usize = 16;

    /// Status and the 16-byte system parameter block
    pub const SYSTEM_PARAMETERS: usize = 28;

    /// Status and a 32-byte index bitmap
    pub const INDEX_PAGE: usize = 44;
}
