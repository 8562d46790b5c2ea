//! # Referee Frame Encoder
//!
//! Assembles outbound inter-robot frames: outer header with a fresh wrapping
//! sequence number and header CRC8, the sender/receiver sub-header, the UI
//! payload, and the trailing full-frame CRC16.

use bytes::{BufMut, Bytes, BytesMut};

use super::crc::{crc16, crc8};
use super::protocol::{
    BLUE_ID_BASE, CMD_ID_LEN, CMD_INTER_ROBOT, FRAME_HEADER_LEN, FRAME_SOF, FRAME_TAIL_LEN,
    INTER_ROBOT_HEADER_LEN,
};

/// Base of the red operator-client identifier range
const RED_CLIENT_BASE: u16 = 0x0100;

/// Base of the blue operator-client identifier range
const BLUE_CLIENT_BASE: u16 = 0x0165;

/// An owned, checksummed frame ready for transmission
///
/// Handed to the transport by value; once sent it must not be reused, which
/// consuming [`ComposedPacket::into_bytes`] or dropping the value enforces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposedPacket {
    bytes: Bytes,
}

impl ComposedPacket {
    /// Total frame size in bytes
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Consume the packet, yielding the underlying buffer
    pub fn into_bytes(self) -> Bytes {
        self.bytes
    }
}

impl AsRef<[u8]> for ComposedPacket {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

/// Operator-client identifier paired with a robot identifier
///
/// Identifiers above [`BLUE_ID_BASE`] map into the blue client range, the
/// rest into the red range.
///
/// # Arguments
///
/// * `robot_id` - Own robot identifier from the latest robot status record
///
/// # Returns
///
/// * `u16` - Receiver identifier for the inter-robot sub-header
pub fn receiver_id(robot_id: u8) -> u16 {
    if robot_id > BLUE_ID_BASE {
        (robot_id - BLUE_ID_BASE - 1) as u16 + BLUE_CLIENT_BASE
    } else {
        robot_id as u16 + RED_CLIENT_BASE
    }
}

/// Outbound frame assembler
///
/// Owns the wrapping sequence counter; one instance per link so that
/// consecutive frames carry consecutive sequence numbers.
#[derive(Debug, Default)]
pub struct PacketAssembler {
    seq: u8,
}

impl PacketAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assemble one complete inter-robot frame around `content`
    ///
    /// # Arguments
    ///
    /// * `sub_cmd` - UI sub-command identifier (delete/draw tier/string)
    /// * `robot_id` - Own robot identifier, used for the sender/receiver pair
    /// * `content` - Encoded UI records
    ///
    /// # Returns
    ///
    /// * `ComposedPacket` - Checksummed frame ready for transmission
    pub fn assemble(&mut self, sub_cmd: u16, robot_id: u8, content: &[u8]) -> ComposedPacket {
        let data_len = INTER_ROBOT_HEADER_LEN + content.len();
        let frame_len = FRAME_HEADER_LEN + CMD_ID_LEN + data_len + FRAME_TAIL_LEN;

        let mut frame = BytesMut::with_capacity(frame_len);
        frame.put_u8(FRAME_SOF);
        frame.put_u16_le(data_len as u16);
        frame.put_u8(self.next_seq());
        let header_crc = crc8(&frame);
        frame.put_u8(header_crc);

        frame.put_u16_le(CMD_INTER_ROBOT);
        frame.put_u16_le(sub_cmd);
        frame.put_u16_le(robot_id as u16);
        frame.put_u16_le(receiver_id(robot_id));
        frame.put_slice(content);

        let tail = crc16(&frame);
        frame.put_u16_le(tail);

        ComposedPacket {
            bytes: frame.freeze(),
        }
    }

    fn next_seq(&mut self) -> u8 {
        let seq = self.seq;
        self.seq = self.seq.wrapping_add(1);
        seq
    }
}
