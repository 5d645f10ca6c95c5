use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError, Weak};

use bytes::{Bytes, BytesMut};

use crate::data_channel::message::{channel_type_for, DataChannelOpen};
use crate::error::{Error, Result};
use crate::peer_connection::PeerConnectionCore;

pub mod init;
pub mod message;
pub mod priority;
pub mod state;

pub use init::RTCDataChannelInit;
pub use message::DataChannelMessage;
pub use priority::RTCPriorityType;
pub use state::RTCDataChannelState;

/// Identifier for a data channel within a particular peer connection.
pub type RTCDataChannelId = u16;

pub type OnOpenHdlrFn = Box<dyn FnMut() + Send>;
pub type OnMessageHdlrFn = Box<dyn FnMut(DataChannelMessage) + Send>;

/// A bidirectional peer-to-peer channel for arbitrary data, multiplexed as
/// one stream of the connection's SCTP association.
///
/// Channels are owned by the peer connection's registry; a channel keeps
/// only a non-owning handle to its connection for sending. The `on_open` and
/// `on_message` hooks run on the connection's background worker.
///
/// ## Specifications
///
/// * [W3C](https://w3c.github.io/webrtc-pc/#dom-rtcdatachannel)
pub struct RTCDataChannel {
    label: String,
    ordered: bool,
    max_packet_life_time: Option<u16>,
    max_retransmits: Option<u16>,
    protocol: String,
    negotiated: bool,
    id: RTCDataChannelId,
    priority: RTCPriorityType,
    ready_state: Mutex<RTCDataChannelState>,
    buffered_amount: AtomicUsize,

    pub(crate) on_open: Mutex<Option<OnOpenHdlrFn>>,
    pub(crate) on_message: Mutex<Option<OnMessageHdlrFn>>,

    pub(crate) owner: Weak<PeerConnectionCore>,
}

pub(crate) struct DataChannelParameters {
    pub(crate) label: String,
    pub(crate) ordered: bool,
    pub(crate) max_packet_life_time: Option<u16>,
    pub(crate) max_retransmits: Option<u16>,
    pub(crate) protocol: String,
    pub(crate) negotiated: bool,
    pub(crate) id: RTCDataChannelId,
    pub(crate) priority: RTCPriorityType,
    pub(crate) ready_state: RTCDataChannelState,
}

impl RTCDataChannel {
    pub(crate) fn new(params: DataChannelParameters, owner: Weak<PeerConnectionCore>) -> Self {
        Self {
            label: params.label,
            ordered: params.ordered,
            max_packet_life_time: params.max_packet_life_time,
            max_retransmits: params.max_retransmits,
            protocol: params.protocol,
            negotiated: params.negotiated,
            id: params.id,
            priority: params.priority,
            ready_state: Mutex::new(params.ready_state),
            buffered_amount: AtomicUsize::new(0),
            on_open: Mutex::new(None),
            on_message: Mutex::new(None),
            owner,
        }
    }

    /// A label distinguishing this channel from other channels on the same
    /// connection. Labels need not be unique.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// True when messages are delivered in order.
    pub fn ordered(&self) -> bool {
        self.ordered
    }

    /// Window in milliseconds during which (re)transmissions may occur in
    /// unreliable mode.
    pub fn max_packet_life_time(&self) -> Option<u16> {
        self.max_packet_life_time
    }

    /// Maximum number of retransmissions attempted in unreliable mode.
    pub fn max_retransmits(&self) -> Option<u16> {
        self.max_retransmits
    }

    /// Name of the subprotocol in use.
    pub fn protocol(&self) -> &str {
        &self.protocol
    }

    /// Whether this channel was negotiated by the application out-of-band.
    pub fn negotiated(&self) -> bool {
        self.negotiated
    }

    /// The SCTP stream id of this channel.
    pub fn id(&self) -> RTCDataChannelId {
        self.id
    }

    pub fn priority(&self) -> RTCPriorityType {
        self.priority
    }

    pub fn ready_state(&self) -> RTCDataChannelState {
        *self
            .ready_state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn set_ready_state(&self, state: RTCDataChannelState) {
        *self
            .ready_state
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = state;
    }

    /// Bytes of application data queued with `send` and not yet handed to
    /// the transport. The counter never resets, including on close.
    pub fn buffered_amount(&self) -> usize {
        self.buffered_amount.load(Ordering::SeqCst)
    }

    /// Sets the handler invoked once the channel reaches the open state.
    pub fn on_open(&self, f: OnOpenHdlrFn) {
        *self.on_open.lock().unwrap_or_else(PoisonError::into_inner) = Some(f);
    }

    /// Sets the handler invoked for every inbound message.
    pub fn on_message(&self, f: OnMessageHdlrFn) {
        *self
            .on_message
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(f);
    }

    /// Sends a binary message to the channel peer.
    pub fn send(&self, data: Bytes) -> Result<()> {
        self.send_payload(data)
    }

    /// Sends a text message to the channel peer.
    pub fn send_text(&self, s: impl Into<String>) -> Result<()> {
        self.send_payload(BytesMut::from(s.into().as_str()).freeze())
    }

    fn send_payload(&self, payload: Bytes) -> Result<()> {
        if self.ready_state() != RTCDataChannelState::Open {
            return Err(Error::ErrDataChannelNotOpen);
        }

        let core = self.owner.upgrade().ok_or(Error::ErrConnectionClosed)?;
        self.buffered_amount
            .fetch_add(payload.len(), Ordering::SeqCst);
        core.manager.send_data_channel(self.id, payload);
        Ok(())
    }

    /// Closes the channel. The channel stays in the connection's registry
    /// until the connection itself is closed.
    pub fn close(&self) -> Result<()> {
        if self.ready_state() == RTCDataChannelState::Closed {
            return Ok(());
        }
        self.set_ready_state(RTCDataChannelState::Closing);
        self.set_ready_state(RTCDataChannelState::Closed);
        Ok(())
    }

    /// Announces this channel to the peer with a DCEP open message.
    pub(crate) fn send_open_channel_message(&self) -> Result<()> {
        let core = self.owner.upgrade().ok_or(Error::ErrConnectionClosed)?;

        let (channel_type, reliability_parameter) = channel_type_for(
            self.ordered,
            self.max_packet_life_time,
            self.max_retransmits,
        );
        let open = DataChannelOpen {
            channel_type,
            priority: self.priority.dcep_priority(),
            reliability_parameter,
            label: self.label.bytes().collect(),
            protocol: self.protocol.bytes().collect(),
        };

        core.manager.send_data_channel(self.id, open.marshal());
        Ok(())
    }
}
