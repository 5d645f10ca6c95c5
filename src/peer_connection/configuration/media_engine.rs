use std::sync::Arc;

use crate::error::{Error, Result};
use crate::media::packetizer::{G7xxPayloader, OpusPayloader, Vp8Payloader};
use crate::rtp_transceiver::rtp_codec::{RTCRtpCodec, RTPCodecType};
use crate::rtp_transceiver::PayloadType;

pub const OPUS: &str = "opus";
pub const G722: &str = "G722";
pub const PCMU: &str = "PCMU";
pub const PCMA: &str = "PCMA";
pub const VP8: &str = "VP8";

/// The codec registry consulted when descriptions are generated and when
/// tracks are created.
///
/// A fresh engine knows no codecs; register the conventional WebRTC set with
/// [`register_default_codecs`](Self::register_default_codecs) or individual
/// codecs with [`register_codec`](Self::register_codec). The engine becomes
/// immutable once the configuration carrying it is attached to a peer
/// connection.
#[derive(Default, Clone)]
pub struct MediaEngine {
    codecs: Vec<RTCRtpCodec>,
}

impl MediaEngine {
    /// Registers a codec. Codecs are offered in registration order.
    pub fn register_codec(&mut self, codec: RTCRtpCodec) {
        self.codecs.push(codec);
    }

    /// Registers the default audio and video codecs with their payloaders.
    pub fn register_default_codecs(&mut self) -> Result<()> {
        self.register_codec(RTCRtpCodec {
            payload_type: 111,
            name: OPUS.to_owned(),
            kind: RTPCodecType::Audio,
            clock_rate: 48000,
            channels: 2,
            sdp_fmtp_line: "minptime=10;useinbandfec=1".to_owned(),
            payloader: Some(Arc::new(OpusPayloader)),
        });
        self.register_codec(RTCRtpCodec {
            payload_type: 9,
            name: G722.to_owned(),
            kind: RTPCodecType::Audio,
            clock_rate: 8000,
            channels: 0,
            sdp_fmtp_line: String::new(),
            payloader: Some(Arc::new(G7xxPayloader)),
        });
        self.register_codec(RTCRtpCodec {
            payload_type: 0,
            name: PCMU.to_owned(),
            kind: RTPCodecType::Audio,
            clock_rate: 8000,
            channels: 0,
            sdp_fmtp_line: String::new(),
            payloader: Some(Arc::new(G7xxPayloader)),
        });
        self.register_codec(RTCRtpCodec {
            payload_type: 8,
            name: PCMA.to_owned(),
            kind: RTPCodecType::Audio,
            clock_rate: 8000,
            channels: 0,
            sdp_fmtp_line: String::new(),
            payloader: Some(Arc::new(G7xxPayloader)),
        });
        self.register_codec(RTCRtpCodec {
            payload_type: 96,
            name: VP8.to_owned(),
            kind: RTPCodecType::Video,
            clock_rate: 90000,
            channels: 0,
            sdp_fmtp_line: String::new(),
            payloader: Some(Arc::new(Vp8Payloader)),
        });
        Ok(())
    }

    /// All codecs of one kind, in registration order.
    pub(crate) fn get_codecs_by_kind(&self, kind: RTPCodecType) -> Vec<RTCRtpCodec> {
        self.codecs
            .iter()
            .filter(|codec| codec.kind == kind)
            .cloned()
            .collect()
    }

    /// Looks a codec up by its payload type.
    pub(crate) fn get_codec(&self, payload_type: PayloadType) -> Result<RTCRtpCodec> {
        self.codecs
            .iter()
            .find(|codec| codec.payload_type == payload_type)
            .cloned()
            .ok_or(Error::ErrCodecNotFound)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_media_engine_starts_empty() {
        let media_engine = MediaEngine::default();
        assert!(media_engine
            .get_codecs_by_kind(RTPCodecType::Audio)
            .is_empty());
        assert!(media_engine
            .get_codecs_by_kind(RTPCodecType::Video)
            .is_empty());
    }

    #[test]
    fn test_register_default_codecs() {
        let mut media_engine = MediaEngine::default();
        media_engine.register_default_codecs().unwrap();

        let audio = media_engine.get_codecs_by_kind(RTPCodecType::Audio);
        let video = media_engine.get_codecs_by_kind(RTPCodecType::Video);
        assert_eq!(audio.len(), 4);
        assert_eq!(video.len(), 1);
        assert_eq!(audio[0].name, OPUS);
        assert_eq!(video[0].name, VP8);

        let codec = media_engine.get_codec(111).unwrap();
        assert_eq!(codec.clock_rate, 48000);
        assert_eq!(codec.channels, 2);

        assert!(media_engine.get_codec(97).is_err());
    }
}
