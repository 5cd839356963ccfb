//! Connection settings

use fpuart_core::{constants::DEFAULT_PASSWORD, Address, ChecksumPolicy};

/// Settings applied when a [`Sensor`](crate::Sensor) is connected
///
/// # Examples
///
/// ```
/// use fpuart::Config;
///
/// let config = Config::default()
///     .with_address(0xFFFF_FFFFu32)
///     .with_password(0x0000_0000)
///     .with_checksum_verification(true);
/// assert_eq!(config.password, 0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Module address (default: broadcast FF FF FF FF)
    pub address: Address,

    /// Handshake password (default: 0)
    pub password: u32,

    /// Whether received checksums are verified (default: yes)
    pub checksum: ChecksumPolicy,
}

impl Config {
    /// Set module address
    pub fn with_address(mut self, address: impl Into<Address>) -> Self {
        self.address = address.into();
        self
    }

    /// Set handshake password
    pub fn with_password(mut self, password: u32) -> Self {
        self.password = password;
        self
    }

    /// Turn received-checksum verification on or off
    ///
    /// Some clones send garbage checksums; turning verification off accepts
    /// them, as most other drivers for these modules do.
    pub fn with_checksum_verification(mut self, enabled: bool) -> Self {
        self.checksum = if enabled {
            ChecksumPolicy::Verify
        } else {
            ChecksumPolicy::Ignore
        };
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            address: Address::BROADCAST,
            password: DEFAULT_PASSWORD,
            checksum: ChecksumPolicy::Verify,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builders() {
        let config = Config::default()
            .with_address([0x01u8, 0x02, 0x03, 0x04])
            .with_password(42)
            .with_checksum_verification(false);

        assert_eq!(config.address, Address([1, 2, 3, 4]));
        assert_eq!(config.password, 42);
        assert_eq!(config.checksum, ChecksumPolicy::Ignore);
    }
}
