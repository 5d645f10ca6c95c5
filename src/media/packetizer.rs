use std::sync::Arc;

use bytes::{BufMut, Bytes, BytesMut};
use rtp::header::Header;
use rtp::packet::Packet;

use crate::rtp_transceiver::{PayloadType, SSRC};
use crate::util::{crypto_rand_u16, crypto_rand_u32};

/// Splits one frame of encoded media into RTP-sized payloads.
///
/// Payloaders are registered on codecs; a codec without one can only back
/// raw-RTP tracks.
pub trait Payloader {
    fn payload(&self, mtu: usize, data: &Bytes) -> Vec<Bytes>;
}

/// Opus frames already fit a packet; they are forwarded whole.
#[derive(Default, Debug, Copy, Clone)]
pub struct OpusPayloader;

impl Payloader for OpusPayloader {
    fn payload(&self, _mtu: usize, data: &Bytes) -> Vec<Bytes> {
        if data.is_empty() {
            return vec![];
        }
        vec![data.clone()]
    }
}

/// G.711/G.722 style audio: a plain byte stream chunked at the MTU.
#[derive(Default, Debug, Copy, Clone)]
pub struct G7xxPayloader;

impl Payloader for G7xxPayloader {
    fn payload(&self, mtu: usize, data: &Bytes) -> Vec<Bytes> {
        if mtu == 0 {
            return vec![];
        }

        let mut payloads = vec![];
        let mut data = data.clone();
        while data.len() > mtu {
            payloads.push(data.split_to(mtu));
        }
        if !data.is_empty() {
            payloads.push(data);
        }
        payloads
    }
}

/// VP8 payload descriptor start bit, RFC 7741 section 4.2.
const VP8_S_BIT: u8 = 0x10;

/// VP8 frames carry a one byte payload descriptor whose S bit marks the
/// start of the partition.
#[derive(Default, Debug, Copy, Clone)]
pub struct Vp8Payloader;

impl Payloader for Vp8Payloader {
    fn payload(&self, mtu: usize, data: &Bytes) -> Vec<Bytes> {
        if mtu <= 1 {
            return vec![];
        }

        let max_fragment = mtu - 1;
        let mut payloads = vec![];
        let mut offset = 0;
        while offset < data.len() {
            let len = max_fragment.min(data.len() - offset);
            let mut out = BytesMut::with_capacity(len + 1);
            out.put_u8(if offset == 0 { VP8_S_BIT } else { 0 });
            out.put_slice(&data[offset..offset + len]);
            payloads.push(out.freeze());
            offset += len;
        }
        payloads
    }
}

/// Fixed RTP header length used when budgeting payload sizes.
const RTP_HEADER_LEN: usize = 12;

/// Turns media frames into RTP packets for a single outbound stream:
/// sequence numbers increase per packet, the timestamp advances per frame,
/// the marker bit closes each frame.
pub(crate) struct Packetizer {
    mtu: usize,
    payload_type: PayloadType,
    ssrc: SSRC,
    payloader: Arc<dyn Payloader + Send + Sync>,
    sequence_number: u16,
    timestamp: u32,
}

impl Packetizer {
    pub(crate) fn new(
        mtu: usize,
        payload_type: PayloadType,
        ssrc: SSRC,
        payloader: Arc<dyn Payloader + Send + Sync>,
    ) -> Self {
        Self {
            mtu,
            payload_type,
            ssrc,
            payloader,
            sequence_number: crypto_rand_u16(),
            timestamp: crypto_rand_u32(),
        }
    }

    pub(crate) fn packetize(&mut self, data: &Bytes, samples: u32) -> Vec<Packet> {
        let payloads = self
            .payloader
            .payload(self.mtu.saturating_sub(RTP_HEADER_LEN), data);
        let last = payloads.len().saturating_sub(1);

        let mut packets = Vec::with_capacity(payloads.len());
        for (i, payload) in payloads.into_iter().enumerate() {
            self.sequence_number = self.sequence_number.wrapping_add(1);
            packets.push(Packet {
                header: Header {
                    version: 2,
                    marker: i == last,
                    payload_type: self.payload_type,
                    sequence_number: self.sequence_number,
                    timestamp: self.timestamp,
                    ssrc: self.ssrc,
                    ..Default::default()
                },
                payload,
            });
        }

        self.timestamp = self.timestamp.wrapping_add(samples);
        packets
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_opus_payloader() {
        let p = OpusPayloader;
        assert!(p.payload(100, &Bytes::new()).is_empty());

        let payloads = p.payload(100, &Bytes::from_static(&[0x90, 0x90, 0x90]));
        assert_eq!(payloads.len(), 1);
        assert_eq!(payloads[0].len(), 3);
    }

    #[test]
    fn test_g7xx_payloader_chunks_at_mtu() {
        let p = G7xxPayloader;
        let payloads = p.payload(4, &Bytes::from(vec![0u8; 10]));
        assert_eq!(payloads.len(), 3);
        assert_eq!(payloads[0].len(), 4);
        assert_eq!(payloads[2].len(), 2);
    }

    #[test]
    fn test_vp8_payloader_descriptor() {
        let p = Vp8Payloader;
        let payloads = p.payload(5, &Bytes::from(vec![0xAAu8; 6]));
        assert_eq!(payloads.len(), 2);
        assert_eq!(payloads[0][0], VP8_S_BIT);
        assert_eq!(payloads[1][0], 0);
        assert_eq!(payloads[0].len(), 5);
    }

    #[test]
    fn test_packetizer_marker_and_timestamp() {
        let mut packetizer = Packetizer::new(16, 9, 42, Arc::new(G7xxPayloader));

        let packets = packetizer.packetize(&Bytes::from(vec![0u8; 7]), 160);
        assert_eq!(packets.len(), 2);
        assert!(!packets[0].header.marker);
        assert!(packets[1].header.marker);
        assert_eq!(packets[0].header.ssrc, 42);
        assert_eq!(packets[0].header.payload_type, 9);
        assert_eq!(
            packets[1].header.sequence_number,
            packets[0].header.sequence_number.wrapping_add(1)
        );
        assert_eq!(packets[0].header.timestamp, packets[1].header.timestamp);

        let ts = packets[0].header.timestamp;
        let next = packetizer.packetize(&Bytes::from(vec![0u8; 1]), 160);
        assert_eq!(next[0].header.timestamp, ts.wrapping_add(160));
    }
}
