use std::fmt;
use std::sync::Arc;

use crate::media::packetizer::Payloader;
use crate::peer_connection::configuration::UNSPECIFIED_STR;
use crate::rtp_transceiver::PayloadType;

/// The kind of media a codec or track carries.
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq)]
pub enum RTPCodecType {
    #[default]
    Unspecified = 0,

    Audio,
    Video,
}

const RTP_CODEC_TYPE_AUDIO_STR: &str = "audio";
const RTP_CODEC_TYPE_VIDEO_STR: &str = "video";

impl From<&str> for RTPCodecType {
    fn from(raw: &str) -> Self {
        match raw {
            RTP_CODEC_TYPE_AUDIO_STR => RTPCodecType::Audio,
            RTP_CODEC_TYPE_VIDEO_STR => RTPCodecType::Video,
            _ => RTPCodecType::Unspecified,
        }
    }
}

impl fmt::Display for RTPCodecType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            RTPCodecType::Audio => write!(f, "{RTP_CODEC_TYPE_AUDIO_STR}"),
            RTPCodecType::Video => write!(f, "{RTP_CODEC_TYPE_VIDEO_STR}"),
            _ => write!(f, "{UNSPECIFIED_STR}"),
        }
    }
}

/// A codec registered with the media engine: the SDP rtpmap/fmtp facts plus
/// the payloader used when samples are packetized for this codec.
#[derive(Clone)]
pub struct RTCRtpCodec {
    pub payload_type: PayloadType,
    pub name: String,
    pub kind: RTPCodecType,
    pub clock_rate: u32,
    pub channels: u16,
    pub sdp_fmtp_line: String,
    pub payloader: Option<Arc<dyn Payloader + Send + Sync>>,
}

impl fmt::Debug for RTCRtpCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RTCRtpCodec")
            .field("payload_type", &self.payload_type)
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("clock_rate", &self.clock_rate)
            .field("channels", &self.channels)
            .field("sdp_fmtp_line", &self.sdp_fmtp_line)
            .finish()
    }
}
