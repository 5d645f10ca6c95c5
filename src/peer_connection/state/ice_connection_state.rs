use std::fmt;

/// Indicates the state of the connection's ICE agent as reported by the
/// transport layer.
///
/// ## Specifications
///
/// * [W3C](https://w3c.github.io/webrtc-pc/#dom-rtciceconnectionstate)
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq)]
pub enum RTCIceConnectionState {
    Unspecified = 0,

    /// The agent is gathering addresses or waiting for remote candidates.
    #[default]
    New,

    /// The agent has remote candidates and is checking pairs but has not
    /// found a working one yet.
    Checking,

    /// A usable pairing of local and remote candidates has been found.
    Connected,

    /// The agent has finished checking and found a connection for all
    /// components.
    Completed,

    /// Connectivity is currently lost; the agent keeps checking.
    Disconnected,

    /// The agent gave up on finding a connection.
    Failed,

    /// The agent has shut down and is no longer responding to STUN requests.
    Closed,
}

const ICE_CONNECTION_STATE_NEW_STR: &str = "new";
const ICE_CONNECTION_STATE_CHECKING_STR: &str = "checking";
const ICE_CONNECTION_STATE_CONNECTED_STR: &str = "connected";
const ICE_CONNECTION_STATE_COMPLETED_STR: &str = "completed";
const ICE_CONNECTION_STATE_DISCONNECTED_STR: &str = "disconnected";
const ICE_CONNECTION_STATE_FAILED_STR: &str = "failed";
const ICE_CONNECTION_STATE_CLOSED_STR: &str = "closed";

impl From<&str> for RTCIceConnectionState {
    fn from(raw: &str) -> Self {
        match raw {
            ICE_CONNECTION_STATE_NEW_STR => RTCIceConnectionState::New,
            ICE_CONNECTION_STATE_CHECKING_STR => RTCIceConnectionState::Checking,
            ICE_CONNECTION_STATE_CONNECTED_STR => RTCIceConnectionState::Connected,
            ICE_CONNECTION_STATE_COMPLETED_STR => RTCIceConnectionState::Completed,
            ICE_CONNECTION_STATE_DISCONNECTED_STR => RTCIceConnectionState::Disconnected,
            ICE_CONNECTION_STATE_FAILED_STR => RTCIceConnectionState::Failed,
            ICE_CONNECTION_STATE_CLOSED_STR => RTCIceConnectionState::Closed,
            _ => RTCIceConnectionState::Unspecified,
        }
    }
}

impl fmt::Display for RTCIceConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            RTCIceConnectionState::New => write!(f, "{ICE_CONNECTION_STATE_NEW_STR}"),
            RTCIceConnectionState::Checking => write!(f, "{ICE_CONNECTION_STATE_CHECKING_STR}"),
            RTCIceConnectionState::Connected => {
                write!(f, "{ICE_CONNECTION_STATE_CONNECTED_STR}")
            }
            RTCIceConnectionState::Completed => {
                write!(f, "{ICE_CONNECTION_STATE_COMPLETED_STR}")
            }
            RTCIceConnectionState::Disconnected => {
                write!(f, "{ICE_CONNECTION_STATE_DISCONNECTED_STR}")
            }
            RTCIceConnectionState::Failed => write!(f, "{ICE_CONNECTION_STATE_FAILED_STR}"),
            RTCIceConnectionState::Closed => write!(f, "{ICE_CONNECTION_STATE_CLOSED_STR}"),
            _ => write!(f, "{}", crate::peer_connection::configuration::UNSPECIFIED_STR),
        }
    }
}
