use bytes::Bytes;

pub mod packetizer;
pub mod track;

/// A unit of encoded media handed to a sample track, together with the
/// number of clock-rate units it covers.
#[derive(Default, Debug, Clone)]
pub struct Sample {
    pub data: Bytes,
    pub samples: u32,
}
