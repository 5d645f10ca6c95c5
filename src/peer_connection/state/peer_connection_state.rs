use std::fmt;

/// Aggregate state of the peer connection, combining the underlying ICE and
/// DTLS transport states.
///
/// ## Specifications
///
/// * [W3C](https://w3c.github.io/webrtc-pc/#dom-rtcpeerconnectionstate)
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq)]
pub enum RTCPeerConnectionState {
    Unspecified = 0,

    /// Transports are in the new state or gathering has not begun.
    #[default]
    New,

    /// At least one transport is establishing a connection.
    Connecting,

    /// All transports are connected.
    Connected,

    /// At least one transport is disconnected.
    Disconnected,

    /// At least one transport failed irrecoverably.
    Failed,

    /// The connection has been shut down.
    Closed,
}

const PEER_CONNECTION_STATE_NEW_STR: &str = "new";
const PEER_CONNECTION_STATE_CONNECTING_STR: &str = "connecting";
const PEER_CONNECTION_STATE_CONNECTED_STR: &str = "connected";
const PEER_CONNECTION_STATE_DISCONNECTED_STR: &str = "disconnected";
const PEER_CONNECTION_STATE_FAILED_STR: &str = "failed";
const PEER_CONNECTION_STATE_CLOSED_STR: &str = "closed";

impl From<&str> for RTCPeerConnectionState {
    fn from(raw: &str) -> Self {
        match raw {
            PEER_CONNECTION_STATE_NEW_STR => RTCPeerConnectionState::New,
            PEER_CONNECTION_STATE_CONNECTING_STR => RTCPeerConnectionState::Connecting,
            PEER_CONNECTION_STATE_CONNECTED_STR => RTCPeerConnectionState::Connected,
            PEER_CONNECTION_STATE_DISCONNECTED_STR => RTCPeerConnectionState::Disconnected,
            PEER_CONNECTION_STATE_FAILED_STR => RTCPeerConnectionState::Failed,
            PEER_CONNECTION_STATE_CLOSED_STR => RTCPeerConnectionState::Closed,
            _ => RTCPeerConnectionState::Unspecified,
        }
    }
}

impl fmt::Display for RTCPeerConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            RTCPeerConnectionState::New => write!(f, "{PEER_CONNECTION_STATE_NEW_STR}"),
            RTCPeerConnectionState::Connecting => {
                write!(f, "{PEER_CONNECTION_STATE_CONNECTING_STR}")
            }
            RTCPeerConnectionState::Connected => {
                write!(f, "{PEER_CONNECTION_STATE_CONNECTED_STR}")
            }
            RTCPeerConnectionState::Disconnected => {
                write!(f, "{PEER_CONNECTION_STATE_DISCONNECTED_STR}")
            }
            RTCPeerConnectionState::Failed => write!(f, "{PEER_CONNECTION_STATE_FAILED_STR}"),
            RTCPeerConnectionState::Closed => write!(f, "{PEER_CONNECTION_STATE_CLOSED_STR}"),
            _ => write!(f, "{}", crate::peer_connection::configuration::UNSPECIFIED_STR),
        }
    }
}
