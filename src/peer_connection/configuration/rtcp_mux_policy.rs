use std::fmt;

use serde::{Deserialize, Serialize};

use crate::peer_connection::configuration::UNSPECIFIED_STR;

/// What ICE candidates are gathered to support non-multiplexed RTCP.
/// Only multiplexed RTCP is supported, so `Require` is the sole policy.
///
/// ## Specifications
///
/// * [W3C](https://w3c.github.io/webrtc-pc/#rtcrtcpmuxpolicy-enum)
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RTCRtcpMuxPolicy {
    #[default]
    Unspecified = 0,

    /// Gather ICE candidates only for RTP and multiplex RTCP on them. If the
    /// remote endpoint cannot do rtcp-mux, session negotiation fails.
    #[serde(rename = "require")]
    Require,
}

const RTCP_MUX_POLICY_REQUIRE_STR: &str = "require";

impl From<&str> for RTCRtcpMuxPolicy {
    fn from(raw: &str) -> Self {
        match raw {
            RTCP_MUX_POLICY_REQUIRE_STR => RTCRtcpMuxPolicy::Require,
            _ => RTCRtcpMuxPolicy::Unspecified,
        }
    }
}

impl fmt::Display for RTCRtcpMuxPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            RTCRtcpMuxPolicy::Require => write!(f, "{RTCP_MUX_POLICY_REQUIRE_STR}"),
            _ => write!(f, "{UNSPECIFIED_STR}"),
        }
    }
}
