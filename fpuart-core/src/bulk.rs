//! Multi-packet bulk transfers
//!
//! Images and templates travel as a run of Data packets closed by a single
//! EndData packet. There is no up-front length: the EndData type is the only
//! end-of-transfer signal.

use bytes::{Bytes, BytesMut};
use byteorder::{BigEndian, ByteOrder};
use tracing::trace;

use crate::{
    error::{Error, Result},
    packet::{Address, ChecksumPolicy, Header, Packet, PacketType},
};

/// Reassembles an incoming Data/EndData stream
///
/// The caller drives the I/O: read [`Packet::HEADER_SIZE`] bytes and pass them
/// to [`BulkReader::header`], then read `header.payload_len()` body bytes and
/// the 2 checksum bytes and pass them to [`BulkReader::push`]. Repeat until
/// `push` reports the transfer finished.
#[derive(Debug)]
pub struct BulkReader {
    address: Address,
    policy: ChecksumPolicy,
    data: BytesMut,
    packets: usize,
    finished: bool,
}

impl BulkReader {
    pub fn new(address: Address, policy: ChecksumPolicy) -> Self {
        Self {
            address,
            policy,
            data: BytesMut::new(),
            packets: 0,
            finished: false,
        }
    }

    /// Validate the next packet header
    ///
    /// Only Data and EndData are accepted; anything else is `BadType`.
    pub fn header(&self, buf: &[u8]) -> Result<Header> {
        let header = Header::decode(buf, self.address)?;
        if !header.packet_type.is_bulk() {
            return Err(Error::BadType {
                found: header.packet_type.into(),
            });
        }
        Ok(header)
    }

    /// Append one packet body
    ///
    /// Returns `true` once the EndData packet has been pushed.
    pub fn push(&mut self, header: &Header, body: &[u8], checksum: &[u8]) -> Result<bool> {
        if self.finished {
            return Err(Error::InvalidSessionState(
                "bulk transfer already finished".into(),
            ));
        }
        if body.len() != header.payload_len() {
            return Err(Error::FrameTooShort {
                expected: header.payload_len(),
                actual: body.len(),
            });
        }
        if checksum.len() != Packet::CHECKSUM_SIZE {
            return Err(Error::FrameTooShort {
                expected: Packet::CHECKSUM_SIZE,
                actual: checksum.len(),
            });
        }

        self.policy
            .check(header.packet_type.into(), body, BigEndian::read_u16(checksum))?;

        self.data.extend_from_slice(body);
        self.packets += 1;
        self.finished = header.packet_type == PacketType::EndData;

        trace!(
            packet = self.packets,
            body_len = body.len(),
            total = self.data.len(),
            end = self.finished,
            "Bulk packet received"
        );

        Ok(self.finished)
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Packets consumed so far
    pub fn packets(&self) -> usize {
        self.packets
    }

    /// Take the reassembled bytes
    pub fn finish(self) -> Bytes {
        self.data.freeze()
    }
}

/// Reassemble a complete, already buffered bulk stream
///
/// # Errors
///
/// Header and checksum errors as for [`BulkReader`], `FrameTooShort` if the
/// buffer ends before an EndData packet.
pub fn decode_stream(buf: &[u8], address: Address, policy: ChecksumPolicy) -> Result<Bytes> {
    let mut reader = BulkReader::new(address, policy);
    let mut offset = 0;

    loop {
        let header = reader.header(&buf[offset.min(buf.len())..])?;
        let body_start = offset + Packet::HEADER_SIZE;
        let body_end = body_start + header.payload_len();
        let frame_end = body_end + Packet::CHECKSUM_SIZE;
        if buf.len() < frame_end {
            return Err(Error::FrameTooShort {
                expected: frame_end,
                actual: buf.len(),
            });
        }

        if reader.push(&header, &buf[body_start..body_end], &buf[body_end..frame_end])? {
            return Ok(reader.finish());
        }
        offset = frame_end;
    }
}

/// Split outgoing bulk data into packets of at most `chunk_size` bytes
///
/// Every packet but the last is Data; the last is always EndData, also when
/// `data.len()` is an exact multiple of `chunk_size`. Empty data yields one
/// empty EndData packet so the device still sees the terminator.
pub fn split(address: Address, data: &[u8], chunk_size: usize) -> Result<Vec<Packet>> {
    if chunk_size == 0 || chunk_size > Packet::MAX_PAYLOAD_SIZE {
        return Err(Error::InvalidChunkSize(chunk_size));
    }

    if data.is_empty() {
        return Ok(vec![Packet::new(PacketType::EndData, address, Bytes::new())?]);
    }

    let count = data.len().div_ceil(chunk_size);
    data.chunks(chunk_size)
        .enumerate()
        .map(|(index, chunk)| {
            let packet_type = if index + 1 == count {
                PacketType::EndData
            } else {
                PacketType::Data
            };
            Packet::new(packet_type, address, Bytes::copy_from_slice(chunk))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn frame(ty: PacketType, body: &[u8]) -> BytesMut {
        Packet::new(ty, Address::BROADCAST, body.to_vec()).unwrap().encode()
    }

    #[test]
    fn test_split_130_bytes_into_64() {
        let data: Vec<u8> = (0..130u8).collect();
        let packets = split(Address::BROADCAST, &data, 64).unwrap();

        let shape: Vec<_> = packets.iter().map(|p| (p.packet_type, p.payload.len())).collect();
        assert_eq!(
            shape,
            vec![
                (PacketType::Data, 64),
                (PacketType::Data, 64),
                (PacketType::EndData, 2),
            ]
        );
        assert_eq!(packets[2].payload.as_ref(), &[128, 129]);
    }

    #[test]
    fn test_split_exact_multiple_ends_with_end_data() {
        let data = vec![0xAA; 128];
        let packets = split(Address::BROADCAST, &data, 64).unwrap();

        assert_eq!(packets.len(), 2);
        assert_eq!(packets[0].packet_type, PacketType::Data);
        assert_eq!(packets[1].packet_type, PacketType::EndData);
        assert_eq!(packets[1].payload.len(), 64);
    }

    #[test]
    fn test_split_single_chunk() {
        let packets = split(Address::BROADCAST, &[1, 2, 3], 32).unwrap();

        assert_eq!(packets.len(), 1);
        assert_eq!(packets[0].packet_type, PacketType::EndData);
    }

    #[test]
    fn test_split_empty_data() {
        let packets = split(Address::BROADCAST, &[], 32).unwrap();

        assert_eq!(packets.len(), 1);
        assert_eq!(packets[0].packet_type, PacketType::EndData);
        assert!(packets[0].payload.is_empty());
    }

    #[test]
    fn test_split_zero_chunk() {
        assert!(matches!(
            split(Address::BROADCAST, &[1], 0),
            Err(Error::InvalidChunkSize(0))
        ));
    }

    #[test]
    fn test_decode_stream_concatenates_until_end() {
        let mut buf = BytesMut::new();
        buf.extend_from_slice(&frame(PacketType::Data, &[1, 2, 3]));
        buf.extend_from_slice(&frame(PacketType::Data, &[4, 5]));
        buf.extend_from_slice(&frame(PacketType::EndData, &[6]));
        // anything after EndData belongs to the next exchange
        buf.extend_from_slice(&frame(PacketType::Ack, &[0]));

        let data = decode_stream(&buf, Address::BROADCAST, ChecksumPolicy::Verify).unwrap();
        assert_eq!(data.as_ref(), &[1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_decode_stream_split_round_trip() {
        let data: Vec<u8> = (0..=255u8).cycle().take(1000).collect();

        let mut buf = BytesMut::new();
        for packet in split(Address::BROADCAST, &data, 128).unwrap() {
            buf.extend_from_slice(&packet.encode());
        }

        let decoded = decode_stream(&buf, Address::BROADCAST, ChecksumPolicy::Verify).unwrap();
        assert_eq!(decoded.as_ref(), data.as_slice());
    }

    #[test]
    fn test_decode_stream_rejects_command() {
        let buf = frame(PacketType::Command, &[1]);

        let result = decode_stream(&buf, Address::BROADCAST, ChecksumPolicy::Verify);
        assert!(matches!(result, Err(Error::BadType { found: 0x01 })));
    }

    #[test]
    fn test_decode_stream_without_end() {
        let buf = frame(PacketType::Data, &[1, 2]);

        let result = decode_stream(&buf, Address::BROADCAST, ChecksumPolicy::Verify);
        assert!(matches!(result, Err(Error::FrameTooShort { .. })));
    }

    #[test]
    fn test_reader_checksum_mismatch() {
        let mut reader = BulkReader::new(Address::BROADCAST, ChecksumPolicy::Verify);
        let buf = frame(PacketType::EndData, &[9, 9]);
        let header = reader.header(&buf).unwrap();

        let result = reader.push(&header, &buf[9..11], &[0x00, 0x00]);
        assert!(matches!(result, Err(Error::ChecksumMismatch { .. })));
    }

    #[test]
    fn test_reader_push_after_end() {
        let mut reader = BulkReader::new(Address::BROADCAST, ChecksumPolicy::Ignore);
        let buf = frame(PacketType::EndData, &[7]);
        let header = reader.header(&buf).unwrap();

        assert!(reader.push(&header, &buf[9..10], &buf[10..12]).unwrap());
        assert!(reader.is_finished());
        assert_eq!(reader.packets(), 1);
        assert!(reader.push(&header, &buf[9..10], &buf[10..12]).is_err());
    }
}
