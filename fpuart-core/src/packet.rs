//! Sensor packet structure and encoding/decoding

use bytes::{BufMut, Bytes, BytesMut};
use byteorder::{BigEndian, ByteOrder};
use std::fmt;

use crate::{
    checksum,
    command::Command,
    constants::{DEFAULT_ADDRESS, START_CODE},
    error::{Error, Result},
    status::Status,
};

/// Module address carried in every frame
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Address(pub [u8; 4]);

impl Address {
    pub const BROADCAST: Self = Self(DEFAULT_ADDRESS);

    pub fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }
}

impl Default for Address {
    fn default() -> Self {
        Self::BROADCAST
    }
}

impl From<u32> for Address {
    fn from(value: u32) -> Self {
        Self(value.to_be_bytes())
    }
}

impl From<[u8; 4]> for Address {
    fn from(value: [u8; 4]) -> Self {
        Self(value)
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02X}{:02X}{:02X}{:02X}", self.0[0], self.0[1], self.0[2], self.0[3])
    }
}

/// Packet identifier (byte 6 of a frame)
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PacketType {
    Command = 0x01,
    Data = 0x02,
    Ack = 0x07,
    EndData = 0x08,
}

impl PacketType {
    /// Data or EndData, the two types a bulk stream is made of
    pub fn is_bulk(self) -> bool {
        matches!(self, Self::Data | Self::EndData)
    }
}

impl From<PacketType> for u8 {
    fn from(ty: PacketType) -> u8 {
        ty as u8
    }
}

impl TryFrom<u8> for PacketType {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0x01 => Ok(Self::Command),
            0x02 => Ok(Self::Data),
            0x07 => Ok(Self::Ack),
            0x08 => Ok(Self::EndData),
            _ => Err(Error::BadType { found: value }),
        }
    }
}

/// Whether received checksums are checked
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum ChecksumPolicy {
    /// Reject frames whose checksum does not match
    #[default]
    Verify,

    /// Accept any checksum
    Ignore,
}

impl ChecksumPolicy {
    pub(crate) fn check(self, packet_type: u8, payload: &[u8], received: u16) -> Result<()> {
        if self == Self::Ignore {
            return Ok(());
        }

        let expected = checksum::calculate(packet_type, payload);
        if expected != received {
            return Err(Error::ChecksumMismatch { expected, received });
        }
        Ok(())
    }
}

/// Validated frame header (the first 9 bytes)
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Header {
    pub packet_type: PacketType,

    /// Raw length field: payload length plus 2 checksum bytes
    pub length: u16,
}

impl Header {
    /// Payload bytes that follow the header
    pub fn payload_len(&self) -> usize {
        usize::from(self.length) - Packet::CHECKSUM_SIZE
    }

    /// Total frame size, header and checksum included
    pub fn frame_len(&self) -> usize {
        Packet::HEADER_SIZE + usize::from(self.length)
    }

    /// Validate start code, address and packet type, in that order
    ///
    /// # Errors
    ///
    /// - `FrameTooShort` if fewer than 9 bytes are given
    /// - `BadStart` if the first two bytes are not 0xEF01
    /// - `BadAddress` if bytes 2..6 differ from `address`
    /// - `BadType` if byte 6 is not a known packet type
    /// - `InvalidLength` if the length field is below 2
    pub fn decode(buf: &[u8], address: Address) -> Result<Self> {
        if buf.len() < Packet::HEADER_SIZE {
            return Err(Error::FrameTooShort {
                expected: Packet::HEADER_SIZE,
                actual: buf.len(),
            });
        }

        let start = BigEndian::read_u16(&buf[0..2]);
        if start != START_CODE {
            return Err(Error::BadStart { found: start });
        }

        let mut found = [0u8; 4];
        found.copy_from_slice(&buf[2..6]);
        if found != address.0 {
            return Err(Error::BadAddress {
                expected: address,
                found: Address(found),
            });
        }

        let packet_type = PacketType::try_from(buf[6])?;

        let length = BigEndian::read_u16(&buf[7..9]);
        if usize::from(length) < Packet::CHECKSUM_SIZE {
            return Err(Error::InvalidLength(length));
        }

        Ok(Self { packet_type, length })
    }
}

/// Sensor protocol packet
///
/// # Packet Structure
///
/// ```text
/// ┌──────────┬──────────┬──────────┬──────────┬─────────────┬──────────┐
/// │  Start   │ Address  │   Type   │  Length  │   Payload   │ Checksum │
/// │ 2 bytes  │ 4 bytes  │  1 byte  │ 2 bytes  │   N bytes   │ 2 bytes  │
/// │ 0xEF01   │          │          │  N + 2   │             │          │
/// └──────────┴──────────┴──────────┴──────────┴─────────────┴──────────┘
/// ```
///
/// All multi-byte values are big-endian.
///
/// # Examples
///
/// ```
/// use fpuart_core::{Address, ChecksumPolicy, Command, Packet};
///
/// let packet = Packet::command(Address::BROADCAST, Command::GetImage, &[]).unwrap();
/// let encoded = packet.encode();
/// assert_eq!(&encoded[..], &[0xEF, 0x01, 0xFF, 0xFF, 0xFF, 0xFF, 0x01, 0x00, 0x03, 0x01, 0x00, 0x05]);
///
/// let decoded = Packet::decode(&encoded, Address::BROADCAST, ChecksumPolicy::Verify).unwrap();
/// assert_eq!(decoded, packet);
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct Packet {
    pub packet_type: PacketType,
    pub address: Address,
    pub payload: Bytes,
}

impl Packet {
    /// Start code, address, type and length
    pub const HEADER_SIZE: usize = 9;

    pub const CHECKSUM_SIZE: usize = 2;

    /// Largest payload the 16-bit length field can describe
    pub const MAX_PAYLOAD_SIZE: usize = u16::MAX as usize - Self::CHECKSUM_SIZE;

    /// Create a packet
    ///
    /// # Errors
    ///
    /// `PayloadTooLarge` if the payload exceeds [`Packet::MAX_PAYLOAD_SIZE`].
    pub fn new(packet_type: PacketType, address: Address, payload: impl Into<Bytes>) -> Result<Self> {
        let payload = payload.into();
        if payload.len() > Self::MAX_PAYLOAD_SIZE {
            return Err(Error::PayloadTooLarge {
                size: payload.len(),
                max: Self::MAX_PAYLOAD_SIZE,
            });
        }

        Ok(Self {
            packet_type,
            address,
            payload,
        })
    }

    /// Create a Command packet: instruction code followed by its parameters
    pub fn command(address: Address, command: Command, params: &[u8]) -> Result<Self> {
        let mut payload = BytesMut::with_capacity(1 + params.len());
        payload.put_u8(command.into());
        payload.put_slice(params);

        Self::new(PacketType::Command, address, payload.freeze())
    }

    /// Value of the length field
    pub fn length(&self) -> u16 {
        (self.payload.len() + Self::CHECKSUM_SIZE) as u16
    }

    pub fn checksum(&self) -> u16 {
        checksum::calculate(self.packet_type.into(), &self.payload)
    }

    /// Encode packet to bytes
    pub fn encode(&self) -> BytesMut {
        let mut buf = BytesMut::with_capacity(self.size());

        buf.put_u16(START_CODE);
        buf.put_slice(self.address.as_bytes());
        buf.put_u8(self.packet_type.into());
        buf.put_u16(self.length());
        buf.put_slice(&self.payload);
        buf.put_u16(self.checksum());

        buf
    }

    /// Decode a packet of any type
    ///
    /// Bytes beyond the frame described by the length field are ignored.
    ///
    /// # Errors
    ///
    /// Header errors from [`Header::decode`], `FrameTooShort` if the buffer
    /// ends before the checksum, `ChecksumMismatch` under
    /// [`ChecksumPolicy::Verify`].
    pub fn decode(buf: &[u8], address: Address, policy: ChecksumPolicy) -> Result<Self> {
        Self::decode_matching(buf, address, policy, |_| true)
    }

    /// Decode a fixed-length Ack reply
    ///
    /// Same as [`Packet::decode`] but any packet type other than Ack fails with
    /// `BadType` before the body is looked at.
    pub fn decode_ack(buf: &[u8], address: Address, policy: ChecksumPolicy) -> Result<Self> {
        Self::decode_matching(buf, address, policy, |ty| ty == PacketType::Ack)
    }

    fn decode_matching(
        buf: &[u8],
        address: Address,
        policy: ChecksumPolicy,
        accept: impl Fn(PacketType) -> bool,
    ) -> Result<Self> {
        let header = Header::decode(buf, address)?;
        if !accept(header.packet_type) {
            return Err(Error::BadType {
                found: header.packet_type.into(),
            });
        }

        if buf.len() < header.frame_len() {
            return Err(Error::FrameTooShort {
                expected: header.frame_len(),
                actual: buf.len(),
            });
        }

        let body_end = Self::HEADER_SIZE + header.payload_len();
        let payload = &buf[Self::HEADER_SIZE..body_end];
        let received = BigEndian::read_u16(&buf[body_end..body_end + Self::CHECKSUM_SIZE]);
        policy.check(header.packet_type.into(), payload, received)?;

        Ok(Self {
            packet_type: header.packet_type,
            address,
            payload: Bytes::copy_from_slice(payload),
        })
    }

    /// Confirmation code of an Ack packet (payload byte 0)
    pub fn status(&self) -> Result<Status> {
        self.payload
            .first()
            .map(|code| Status::from(*code))
            .ok_or(Error::EmptyPayload)
    }

    /// Payload after the confirmation code
    pub fn body(&self) -> &[u8] {
        self.payload.get(1..).unwrap_or(&[])
    }

    /// Get total packet size
    pub fn size(&self) -> usize {
        Self::HEADER_SIZE + self.payload.len() + Self::CHECKSUM_SIZE
    }
}

impl fmt::Debug for Packet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Packet")
            .field("packet_type", &self.packet_type)
            .field("address", &self.address)
            .field("checksum", &format!("0x{:04X}", self.checksum()))
            .field("payload", &hex::encode(&self.payload))
            .finish()
    }
}

impl fmt::Display for Packet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Packet[{:?}](address={}, len={})",
            self.packet_type,
            self.address,
            self.payload.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn ack(payload: &[u8]) -> BytesMut {
        Packet::new(PacketType::Ack, Address::BROADCAST, payload.to_vec())
            .unwrap()
            .encode()
    }

    #[test]
    fn test_encode_verify_password() {
        let packet = Packet::command(Address::BROADCAST, Command::VerifyPassword, &[0, 0, 0, 0]).unwrap();

        assert_eq!(
            &packet.encode()[..],
            &[
                0xEF, 0x01, 0xFF, 0xFF, 0xFF, 0xFF, 0x01, 0x00, 0x07, 0x13, 0x00, 0x00, 0x00, 0x00,
                0x00, 0x1B
            ]
        );
    }

    #[test]
    fn test_length_field_counts_checksum() {
        let packet = Packet::new(PacketType::Data, Address::BROADCAST, vec![0u8; 10]).unwrap();
        let encoded = packet.encode();

        assert_eq!(packet.length(), 12);
        assert_eq!(&encoded[7..9], &[0x00, 0x0C]);
        assert_eq!(encoded.len(), packet.size());
    }

    #[test]
    fn test_decode_ack_payload() {
        let decoded = Packet::decode_ack(&ack(&[0x00, 0x00, 0x05]), Address::BROADCAST, ChecksumPolicy::Verify).unwrap();

        assert_eq!(decoded.status().unwrap(), Status::Ok);
        assert_eq!(decoded.body(), &[0x00, 0x05]);
    }

    #[test]
    fn test_decode_bad_start() {
        let mut buf = ack(&[0x00]);
        buf[0] = 0xEE;

        let result = Packet::decode_ack(&buf, Address::BROADCAST, ChecksumPolicy::Verify);
        assert!(matches!(result, Err(Error::BadStart { found: 0xEE01 })));
    }

    #[test]
    fn test_decode_bad_address() {
        let buf = ack(&[0x00]);
        let other = Address([0xFF, 0xFF, 0xFF, 0xFE]);

        let result = Packet::decode_ack(&buf, other, ChecksumPolicy::Verify);
        assert!(matches!(result, Err(Error::BadAddress { .. })));
    }

    #[test]
    fn test_decode_ack_rejects_data() {
        let buf = Packet::new(PacketType::Data, Address::BROADCAST, vec![1, 2])
            .unwrap()
            .encode();

        let result = Packet::decode_ack(&buf, Address::BROADCAST, ChecksumPolicy::Verify);
        assert!(matches!(result, Err(Error::BadType { found: 0x02 })));
    }

    #[test]
    fn test_decode_unknown_type() {
        let mut buf = ack(&[0x00]);
        buf[6] = 0x05;

        let result = Packet::decode(&buf, Address::BROADCAST, ChecksumPolicy::Ignore);
        assert!(matches!(result, Err(Error::BadType { found: 0x05 })));
    }

    #[test]
    fn test_decode_checksum_policy() {
        let mut buf = ack(&[0x00, 0x12]);
        let last = buf.len() - 1;
        buf[last] ^= 0xFF;

        let result = Packet::decode_ack(&buf, Address::BROADCAST, ChecksumPolicy::Verify);
        assert!(matches!(result, Err(Error::ChecksumMismatch { .. })));

        let lenient = Packet::decode_ack(&buf, Address::BROADCAST, ChecksumPolicy::Ignore).unwrap();
        assert_eq!(lenient.payload.as_ref(), &[0x00, 0x12]);
    }

    #[test]
    fn test_decode_truncated() {
        let buf = ack(&[0x00, 0x01, 0x02]);

        let result = Packet::decode_ack(&buf[..buf.len() - 1], Address::BROADCAST, ChecksumPolicy::Verify);
        assert!(matches!(result, Err(Error::FrameTooShort { expected: 14, actual: 13 })));

        let result = Packet::decode_ack(&buf[..4], Address::BROADCAST, ChecksumPolicy::Verify);
        assert!(matches!(result, Err(Error::FrameTooShort { expected: 9, actual: 4 })));
    }

    #[test]
    fn test_decode_invalid_length() {
        let mut buf = ack(&[]);
        buf[8] = 0x01;

        let result = Packet::decode(&buf, Address::BROADCAST, ChecksumPolicy::Ignore);
        assert!(matches!(result, Err(Error::InvalidLength(1))));
    }

    #[test]
    fn test_empty_ack_has_no_status() {
        let decoded = Packet::decode_ack(&ack(&[]), Address::BROADCAST, ChecksumPolicy::Verify).unwrap();

        assert!(matches!(decoded.status(), Err(Error::EmptyPayload)));
        assert!(decoded.body().is_empty());
    }

    #[test]
    fn test_payload_too_large() {
        let result = Packet::new(PacketType::Data, Address::BROADCAST, vec![0u8; Packet::MAX_PAYLOAD_SIZE + 1]);
        assert!(matches!(result, Err(Error::PayloadTooLarge { .. })));
    }

    fn packet_type() -> impl Strategy<Value = PacketType> {
        prop::sample::select(vec![
            PacketType::Command,
            PacketType::Data,
            PacketType::Ack,
            PacketType::EndData,
        ])
    }

    proptest! {
        #[test]
        fn prop_encode_decode_recovers_payload(
            ty in packet_type(),
            address in any::<[u8; 4]>(),
            payload in prop::collection::vec(any::<u8>(), 0..300),
        ) {
            let address = Address(address);
            let packet = Packet::new(ty, address, payload.clone()).unwrap();
            let encoded = packet.encode();

            prop_assert_eq!(encoded.len(), Packet::HEADER_SIZE + payload.len() + 2);

            let decoded = Packet::decode(&encoded, address, ChecksumPolicy::Verify).unwrap();
            prop_assert_eq!(decoded.packet_type, ty);
            prop_assert_eq!(decoded.payload.as_ref(), payload.as_slice());
        }

        #[test]
        fn prop_any_address_byte_mismatch_fails(
            index in 0usize..4,
            flip in 1u8..=255,
            payload in prop::collection::vec(any::<u8>(), 1..32),
        ) {
            let encoded = Packet::new(PacketType::Ack, Address::BROADCAST, payload).unwrap().encode();

            let mut other = DEFAULT_ADDRESS;
            other[index] ^= flip;

            let result = Packet::decode_ack(&encoded, Address(other), ChecksumPolicy::Verify);
            let rejected = matches!(result, Err(Error::BadAddress { .. }));
            prop_assert!(rejected, "expected BadAddress, got {:?}", result);
        }
    }
}
