//! Frame checksum
//!
//! The checksum is the plain sum of every byte from the packet type through
//! the end of the payload, truncated to 16 bits:
//!
//! ```text
//! checksum = (type + length_hi + length_lo + payload[0] + ... + payload[n-1]) mod 65536
//! ```

use tracing::trace;

/// Calculate the checksum of a packet
///
/// The length bytes are derived from the payload (`payload.len() + 2`).
///
/// # Examples
///
/// ```
/// use fpuart_core::checksum;
///
/// // GetImage command: type 0x01, length 0x0003, instruction 0x01
/// assert_eq!(checksum::calculate(0x01, &[0x01]), 0x0005);
/// ```
pub fn calculate(packet_type: u8, payload: &[u8]) -> u16 {
    let length = (payload.len() + 2) as u16;
    let [length_hi, length_lo] = length.to_be_bytes();
    
    let checksum = payload.iter().fold(
        u16::from(packet_type) + u16::from(length_hi) + u16::from(length_lo),
        |sum, byte| sum.wrapping_add(u16::from(*byte)),
    );
    
    trace!(
        packet_type = packet_type,
        payload_len = payload.len(),
        checksum = format!("0x{:04X}", checksum),
        "Calculated checksum"
    );
    
    checksum
}
