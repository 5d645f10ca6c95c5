pub mod sdp_type;
pub mod session_description;

pub use sdp_type::RTCSdpType;
pub use session_description::RTCSessionDescription;

use sdp::description::media::MediaDescription;
use sdp::description::session::ATTR_KEY_MID;

use crate::rtp_transceiver::direction::RTCRtpTransceiverDirection;

/// Returns the mid attribute value of a media section, if any.
pub(crate) fn get_mid_value(media: &MediaDescription) -> Option<&str> {
    media.attribute(ATTR_KEY_MID).flatten()
}

/// Returns the direction a remote media section advertises, or Unspecified
/// when no direction attribute is present.
pub(crate) fn get_peer_direction(media: &MediaDescription) -> RTCRtpTransceiverDirection {
    for a in &media.attributes {
        let direction = RTCRtpTransceiverDirection::from(a.key.as_str());
        if direction != RTCRtpTransceiverDirection::Unspecified {
            return direction;
        }
    }
    RTCRtpTransceiverDirection::Unspecified
}
