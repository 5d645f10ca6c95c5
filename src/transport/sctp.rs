use std::fmt;
use std::sync::{Mutex, PoisonError};

/// State of the SCTP association backing the data channels.
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq)]
pub enum RTCSctpTransportState {
    Unspecified = 0,

    /// The SCTP association is being established.
    #[default]
    Connecting,

    /// The negotiation is completed and data channels can carry traffic.
    Connected,

    /// The SCTP association is shut down.
    Closed,
}

const SCTP_TRANSPORT_STATE_CONNECTING_STR: &str = "connecting";
const SCTP_TRANSPORT_STATE_CONNECTED_STR: &str = "connected";
const SCTP_TRANSPORT_STATE_CLOSED_STR: &str = "closed";

impl From<&str> for RTCSctpTransportState {
    fn from(raw: &str) -> Self {
        match raw {
            SCTP_TRANSPORT_STATE_CONNECTING_STR => RTCSctpTransportState::Connecting,
            SCTP_TRANSPORT_STATE_CONNECTED_STR => RTCSctpTransportState::Connected,
            SCTP_TRANSPORT_STATE_CLOSED_STR => RTCSctpTransportState::Closed,
            _ => RTCSctpTransportState::Unspecified,
        }
    }
}

impl fmt::Display for RTCSctpTransportState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            RTCSctpTransportState::Connecting => write!(f, "{SCTP_TRANSPORT_STATE_CONNECTING_STR}"),
            RTCSctpTransportState::Connected => write!(f, "{SCTP_TRANSPORT_STATE_CONNECTED_STR}"),
            RTCSctpTransportState::Closed => write!(f, "{SCTP_TRANSPORT_STATE_CLOSED_STR}"),
            _ => write!(f, "{}", crate::peer_connection::configuration::UNSPECIFIED_STR),
        }
    }
}

const SCTP_MAX_CHANNELS: u16 = u16::MAX;

/// Handle onto the SCTP association: its state and the channel budget used
/// when allocating data-channel stream ids. The association itself is owned
/// by the external transport, which updates this handle as it progresses.
pub struct RTCSctpTransport {
    state: Mutex<RTCSctpTransportState>,
    max_channels: Mutex<u16>,
}

impl Default for RTCSctpTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl RTCSctpTransport {
    pub(crate) fn new() -> Self {
        Self {
            state: Mutex::new(RTCSctpTransportState::Connecting),
            max_channels: Mutex::new(SCTP_MAX_CHANNELS),
        }
    }

    pub fn state(&self) -> RTCSctpTransportState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_state(&self, state: RTCSctpTransportState) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = state;
    }

    /// The maximum amount of data channels that can be used simultaneously.
    pub fn max_channels(&self) -> u16 {
        *self
            .max_channels
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_max_channels(&self, max_channels: u16) {
        *self
            .max_channels
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = max_channels;
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_sctp_transport_defaults() {
        let transport = RTCSctpTransport::new();
        assert_eq!(transport.state(), RTCSctpTransportState::Connecting);
        assert_eq!(transport.max_channels(), u16::MAX);

        transport.set_state(RTCSctpTransportState::Connected);
        transport.set_max_channels(4);
        assert_eq!(transport.state(), RTCSctpTransportState::Connected);
        assert_eq!(transport.max_channels(), 4);
    }

    #[test]
    fn test_sctp_transport_state_string() {
        let tests = vec![
            (RTCSctpTransportState::Unspecified, "Unspecified"),
            (RTCSctpTransportState::Connecting, "connecting"),
            (RTCSctpTransportState::Connected, "connected"),
            (RTCSctpTransportState::Closed, "closed"),
        ];

        for (state, expected_string) in tests {
            assert_eq!(state.to_string(), expected_string);
        }
    }
}
