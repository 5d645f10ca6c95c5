use std::sync::Arc;

use crate::error::{Error, Result};
use crate::media::track::RTCTrack;
use crate::rtp_transceiver::direction::RTCRtpTransceiverDirection;
use crate::rtp_transceiver::rtp_codec::RTPCodecType;

pub mod direction;
pub mod rtp_codec;

/// SSRC represents a synchronization source: a randomly chosen value meant to
/// be globally unique within a particular RTP session, identifying a single
/// stream of media.
/// <https://tools.ietf.org/html/rfc3550#section-3>
#[allow(clippy::upper_case_acronyms)]
pub type SSRC = u32;

/// PayloadType identifies the format of the RTP payload and determines its
/// interpretation by the application.
/// <https://tools.ietf.org/html/rfc3550#section-3>
pub type PayloadType = u8;

/// The sending half of a transceiver slot.
#[derive(Default, Clone)]
pub struct RTCRtpSender {
    pub(crate) track: Option<Arc<RTCTrack>>,
}

impl RTCRtpSender {
    pub(crate) fn new(track: Option<Arc<RTCTrack>>) -> Self {
        Self { track }
    }

    /// The track this sender transmits, if one is bound.
    pub fn track(&self) -> Option<Arc<RTCTrack>> {
        self.track.clone()
    }
}

/// The receiving half of a transceiver slot.
#[derive(Default, Clone)]
pub struct RTCRtpReceiver {
    pub(crate) kind: RTPCodecType,
    pub(crate) track: Option<Arc<RTCTrack>>,
}

impl RTCRtpReceiver {
    pub(crate) fn new(kind: RTPCodecType) -> Self {
        Self { kind, track: None }
    }

    pub fn kind(&self) -> RTPCodecType {
        self.kind
    }

    /// The remote track delivered into this receiver, once media arrived.
    pub fn track(&self) -> Option<Arc<RTCTrack>> {
        self.track.clone()
    }
}

/// A combination of an RTP sender and an RTP receiver sharing a common media
/// line.
///
/// ## Specifications
///
/// * [W3C](https://w3c.github.io/webrtc-pc/#dom-rtcrtptransceiver)
#[derive(Default, Clone)]
pub struct RTCRtpTransceiver {
    pub(crate) mid: Option<String>,
    pub(crate) sender: RTCRtpSender,
    pub(crate) receiver: RTCRtpReceiver,
    pub(crate) direction: RTCRtpTransceiverDirection,
    pub(crate) kind: RTPCodecType,
    pub(crate) stopped: bool,
}

impl RTCRtpTransceiver {
    pub(crate) fn new(
        sender: RTCRtpSender,
        receiver: RTCRtpReceiver,
        direction: RTCRtpTransceiverDirection,
        kind: RTPCodecType,
    ) -> Self {
        Self {
            mid: None,
            sender,
            receiver,
            direction,
            kind,
            stopped: false,
        }
    }

    /// The transceiver's media line identifier, assigned when the transceiver
    /// enters the inventory.
    pub fn mid(&self) -> Option<&str> {
        self.mid.as_deref()
    }

    pub fn sender(&self) -> &RTCRtpSender {
        &self.sender
    }

    pub fn receiver(&self) -> &RTCRtpReceiver {
        &self.receiver
    }

    pub fn direction(&self) -> RTCRtpTransceiverDirection {
        self.direction
    }

    pub fn kind(&self) -> RTPCodecType {
        self.kind
    }

    pub fn stopped(&self) -> bool {
        self.stopped
    }

    /// Irreversibly stops the transceiver. The slot stays in the inventory.
    pub(crate) fn stop(&mut self) {
        self.stopped = true;
        self.direction = RTCRtpTransceiverDirection::Inactive;
    }

    /// Binds a track into the send slot of a transceiver that was so far
    /// receive-only.
    pub(crate) fn set_sending_track(&mut self, track: Arc<RTCTrack>) -> Result<()> {
        self.sender.track = Some(track);

        match self.direction {
            RTCRtpTransceiverDirection::Recvonly => {
                self.direction = RTCRtpTransceiverDirection::Sendrecv;
                Ok(())
            }
            _ => Err(Error::ErrRTPTransceiverSetSendingInvalidState),
        }
    }
}
