use std::fmt;

/// State of a data channel.
///
/// ## Specifications
///
/// * [W3C](https://w3c.github.io/webrtc-pc/#dom-rtcdatachannelstate)
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq)]
pub enum RTCDataChannelState {
    Unspecified = 0,

    /// The user agent is attempting to establish the underlying transport.
    /// This is the initial state of a channel created with
    /// `create_data_channel`.
    #[default]
    Connecting,

    /// The underlying transport is established and communication is
    /// possible.
    Open,

    /// The procedure to close the channel started.
    Closing,

    /// The underlying transport is closed.
    Closed,
}

const DATA_CHANNEL_STATE_CONNECTING_STR: &str = "connecting";
const DATA_CHANNEL_STATE_OPEN_STR: &str = "open";
const DATA_CHANNEL_STATE_CLOSING_STR: &str = "closing";
const DATA_CHANNEL_STATE_CLOSED_STR: &str = "closed";

impl From<&str> for RTCDataChannelState {
    fn from(raw: &str) -> Self {
        match raw {
            DATA_CHANNEL_STATE_CONNECTING_STR => RTCDataChannelState::Connecting,
            DATA_CHANNEL_STATE_OPEN_STR => RTCDataChannelState::Open,
            DATA_CHANNEL_STATE_CLOSING_STR => RTCDataChannelState::Closing,
            DATA_CHANNEL_STATE_CLOSED_STR => RTCDataChannelState::Closed,
            _ => RTCDataChannelState::Unspecified,
        }
    }
}

impl fmt::Display for RTCDataChannelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            RTCDataChannelState::Connecting => write!(f, "{DATA_CHANNEL_STATE_CONNECTING_STR}"),
            RTCDataChannelState::Open => write!(f, "{DATA_CHANNEL_STATE_OPEN_STR}"),
            RTCDataChannelState::Closing => write!(f, "{DATA_CHANNEL_STATE_CLOSING_STR}"),
            RTCDataChannelState::Closed => write!(f, "{DATA_CHANNEL_STATE_CLOSED_STR}"),
            _ => write!(f, "{}", crate::peer_connection::configuration::UNSPECIFIED_STR),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_data_channel_state_conversions() {
        let tests = vec![
            ("Unspecified", RTCDataChannelState::Unspecified),
            ("connecting", RTCDataChannelState::Connecting),
            ("open", RTCDataChannelState::Open),
            ("closing", RTCDataChannelState::Closing),
            ("closed", RTCDataChannelState::Closed),
        ];

        for (state_string, expected_state) in tests {
            assert_eq!(RTCDataChannelState::from(state_string), expected_state);
            if expected_state != RTCDataChannelState::Unspecified {
                assert_eq!(expected_state.to_string(), state_string);
            }
        }
    }
}
