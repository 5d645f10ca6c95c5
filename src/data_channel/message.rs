use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{Error, Result};

/// A message received from the data channel. `is_string` is set when the
/// incoming message was sent as text rather than binary.
#[derive(Default, Debug, Clone)]
pub struct DataChannelMessage {
    pub is_string: bool,
    pub data: Bytes,
}

pub(crate) const DCEP_MESSAGE_TYPE_OPEN: u8 = 0x03;

pub(crate) const CHANNEL_TYPE_RELIABLE: u8 = 0x00;
pub(crate) const CHANNEL_TYPE_RELIABLE_UNORDERED: u8 = 0x80;
pub(crate) const CHANNEL_TYPE_PARTIAL_RELIABLE_REXMIT: u8 = 0x01;
pub(crate) const CHANNEL_TYPE_PARTIAL_RELIABLE_REXMIT_UNORDERED: u8 = 0x81;
pub(crate) const CHANNEL_TYPE_PARTIAL_RELIABLE_TIMED: u8 = 0x02;
pub(crate) const CHANNEL_TYPE_PARTIAL_RELIABLE_TIMED_UNORDERED: u8 = 0x82;

/// The DCEP DATA_CHANNEL_OPEN message announcing a channel in-band.
///
/// Layout per RFC 8832 section 5.1: message type, channel type, priority,
/// reliability parameter, label length, protocol length, label, protocol.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct DataChannelOpen {
    pub channel_type: u8,
    pub priority: u16,
    pub reliability_parameter: u32,
    pub label: Vec<u8>,
    pub protocol: Vec<u8>,
}

impl DataChannelOpen {
    pub fn marshal(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(12 + self.label.len() + self.protocol.len());
        buf.put_u8(DCEP_MESSAGE_TYPE_OPEN);
        buf.put_u8(self.channel_type);
        buf.put_u16(self.priority);
        buf.put_u32(self.reliability_parameter);
        buf.put_u16(self.label.len() as u16);
        buf.put_u16(self.protocol.len() as u16);
        buf.put_slice(&self.label);
        buf.put_slice(&self.protocol);
        buf.freeze()
    }

    pub fn unmarshal(raw: &[u8]) -> Result<Self> {
        let mut buf = raw;
        if buf.remaining() < 12 {
            return Err(Error::ErrDCEPMessageTooShort);
        }

        let message_type = buf.get_u8();
        if message_type != DCEP_MESSAGE_TYPE_OPEN {
            return Err(Error::ErrDCEPInvalidMessageType(message_type));
        }

        let channel_type = buf.get_u8();
        let priority = buf.get_u16();
        let reliability_parameter = buf.get_u32();
        let label_len = buf.get_u16() as usize;
        let protocol_len = buf.get_u16() as usize;

        if buf.remaining() < label_len + protocol_len {
            return Err(Error::ErrDCEPMessageTooShort);
        }

        let label = buf[..label_len].to_vec();
        let protocol = buf[label_len..label_len + protocol_len].to_vec();

        Ok(Self {
            channel_type,
            priority,
            reliability_parameter,
            label,
            protocol,
        })
    }
}

/// Derives the DCEP channel type and reliability parameter from ordering
/// and partial-reliability settings.
pub(crate) fn channel_type_for(
    ordered: bool,
    max_packet_life_time: Option<u16>,
    max_retransmits: Option<u16>,
) -> (u8, u32) {
    match (max_retransmits, max_packet_life_time) {
        (Some(retransmits), _) => {
            if ordered {
                (CHANNEL_TYPE_PARTIAL_RELIABLE_REXMIT, u32::from(retransmits))
            } else {
                (
                    CHANNEL_TYPE_PARTIAL_RELIABLE_REXMIT_UNORDERED,
                    u32::from(retransmits),
                )
            }
        }
        (None, Some(lifetime)) => {
            if ordered {
                (CHANNEL_TYPE_PARTIAL_RELIABLE_TIMED, u32::from(lifetime))
            } else {
                (
                    CHANNEL_TYPE_PARTIAL_RELIABLE_TIMED_UNORDERED,
                    u32::from(lifetime),
                )
            }
        }
        (None, None) => {
            if ordered {
                (CHANNEL_TYPE_RELIABLE, 0)
            } else {
                (CHANNEL_TYPE_RELIABLE_UNORDERED, 0)
            }
        }
    }
}
