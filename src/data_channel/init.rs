use crate::data_channel::priority::RTCPriorityType;

/// Configures properties of a data channel at creation time, such as data
/// reliability. Absent fields take the W3C defaults.
///
/// ## Specifications
///
/// * [W3C](https://w3c.github.io/webrtc-pc/#dom-rtcdatachannelinit)
#[derive(Default, Debug, Clone)]
pub struct RTCDataChannelInit {
    /// Whether data is guaranteed to be delivered in order. Defaults to
    /// true.
    pub ordered: Option<bool>,

    /// Limits the time (in milliseconds) during which the channel will
    /// transmit or retransmit data if not acknowledged. Mutually exclusive
    /// with `max_retransmits`.
    pub max_packet_life_time: Option<u16>,

    /// Limits the number of times data is retransmitted if not successfully
    /// delivered. Mutually exclusive with `max_packet_life_time`.
    pub max_retransmits: Option<u16>,

    /// Subprotocol name used for this channel.
    pub protocol: Option<String>,

    /// Whether the channel is negotiated out-of-band by the application
    /// (true) or announced in-band (false, the default). A negotiated
    /// channel must carry an `id`.
    pub negotiated: Option<bool>,

    /// The stream id to use when `negotiated` is true.
    pub id: Option<u16>,

    /// Priority of the channel. Defaults to low.
    pub priority: Option<RTCPriorityType>,
}
