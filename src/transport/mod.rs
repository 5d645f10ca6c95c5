use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::SyncSender;
use std::sync::{Mutex, PoisonError};

use bytes::Bytes;
use rtp::packet::Packet;

use crate::error::Result;
use crate::peer_connection::state::ice_connection_state::RTCIceConnectionState;
use crate::rtp_transceiver::{PayloadType, SSRC};
use crate::transport::ice::{IceAgent, IceUrl};

pub mod dtls;
pub mod ice;
pub mod sctp;

pub use dtls::RTCDtlsFingerprint;
pub use sctp::{RTCSctpTransport, RTCSctpTransportState};

/// Called on the first inbound RTP packet of an unknown SSRC. Returning a
/// bounded channel registers the stream; `None` drops it.
pub type OnTrackChannelHdlrFn =
    Box<dyn Fn(SSRC, PayloadType) -> Option<SyncSender<Packet>> + Send + Sync>;

/// Called for every DCEP event the SCTP side reports.
pub type OnDataChannelEventHdlrFn = Box<dyn Fn(DataChannelEvent) + Send + Sync>;

/// Called whenever the ICE agent changes connection state.
pub type OnIceStateChangeHdlrFn = Box<dyn Fn(RTCIceConnectionState) + Send + Sync>;

/// The three callbacks the peer connection wires back into its network
/// manager at construction time.
pub struct TransportHandlers {
    pub on_track_channel: OnTrackChannelHdlrFn,
    pub on_data_channel_event: OnDataChannelEventHdlrFn,
    pub on_ice_state_change: OnIceStateChangeHdlrFn,
}

/// Inbound data-channel events as the DCEP layer reports them.
pub enum DataChannelEvent {
    /// The remote peer opened a new channel in-band.
    Created { stream_id: u16, label: String },
    /// A message arrived on an existing channel.
    Message {
        stream_id: u16,
        is_string: bool,
        payload: Bytes,
    },
    /// The association is ready; pending channels may announce themselves.
    Open,
}

/// An outbound unit waiting for the I/O layer to put it on the wire.
#[derive(Debug, Clone, PartialEq)]
pub enum Transmit {
    Rtp(Packet),
    Rtcp(Bytes),
    DataChannel { stream_id: u16, payload: Bytes },
}

/// The network-manager collaborator: the single handle the peer connection
/// drives downward. It owns the ICE agent bookkeeping and the outbound
/// queue, routes inbound RTP to track channels by SSRC, and fans transport
/// events back through the handlers wired in at construction.
///
/// The actual sockets, DTLS handshake, SRTP contexts and the SCTP
/// association live outside this crate; their driver feeds `deliver_*` and
/// drains `poll_transmit`.
pub struct Manager {
    ice_agent: IceAgent,
    dtls_fingerprint: String,
    handlers: TransportHandlers,
    track_routes: Mutex<HashMap<SSRC, SyncSender<Packet>>>,
    transmits: Mutex<VecDeque<Transmit>>,
    we_offer: AtomicBool,
    started: AtomicBool,
    closed: AtomicBool,
}

impl Manager {
    pub(crate) fn new(dtls_fingerprint: String, handlers: TransportHandlers) -> Self {
        Self {
            ice_agent: IceAgent::new(),
            dtls_fingerprint,
            handlers,
            track_routes: Mutex::new(HashMap::new()),
            transmits: Mutex::new(VecDeque::new()),
            we_offer: AtomicBool::new(false),
            started: AtomicBool::new(false),
            closed: AtomicBool::new(false),
        }
    }

    /// The SHA-256 fingerprint of the certificate this connection
    /// authenticates with, as advertised in session descriptions.
    pub fn dtls_fingerprint(&self) -> &str {
        &self.dtls_fingerprint
    }

    pub fn ice_agent(&self) -> &IceAgent {
        &self.ice_agent
    }

    /// Registers a parsed ICE server URL with the agent.
    pub(crate) fn add_url(&self, url: IceUrl) -> Result<()> {
        self.ice_agent.add_url(url);
        Ok(())
    }

    /// Hands the remote ICE credentials down and marks the transport
    /// started. `we_offer` is false when the remote description was the
    /// offer, making this side the answerer.
    pub(crate) fn start(&self, we_offer: bool, remote_ufrag: &str, remote_pwd: &str) -> Result<()> {
        if remote_ufrag.is_empty() || remote_pwd.is_empty() {
            log::debug!("starting with incomplete remote ice credentials");
        }
        self.ice_agent
            .set_remote_credentials(remote_ufrag.to_owned(), remote_pwd.to_owned());
        self.we_offer.store(we_offer, Ordering::SeqCst);
        self.started.store(true, Ordering::SeqCst);
        Ok(())
    }

    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::SeqCst)
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Whether this side produced the offer in the exchange that started the
    /// transport.
    pub(crate) fn we_offer(&self) -> bool {
        self.we_offer.load(Ordering::SeqCst)
    }

    /// Queues an RTP packet for the wire. Packets sent while no peer is
    /// connected are dropped downstream, never surfaced as an error.
    pub(crate) fn send_rtp(&self, packet: Packet) {
        if self.is_closed() {
            log::trace!("dropping outbound rtp packet, transport closed");
            return;
        }
        self.transmits
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(Transmit::Rtp(packet));
    }

    /// Queues serialized RTCP for the wire, with the same drop semantics as
    /// [`send_rtp`](Self::send_rtp).
    pub(crate) fn send_rtcp(&self, raw: Bytes) {
        if self.is_closed() {
            log::trace!("dropping outbound rtcp packet, transport closed");
            return;
        }
        self.transmits
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(Transmit::Rtcp(raw));
    }

    /// Queues a DCEP or user payload for one SCTP stream.
    pub(crate) fn send_data_channel(&self, stream_id: u16, payload: Bytes) {
        if self.is_closed() {
            log::trace!("dropping outbound data channel payload, transport closed");
            return;
        }
        self.transmits
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(Transmit::DataChannel { stream_id, payload });
    }

    /// Takes the next queued outbound unit, if any.
    pub fn poll_transmit(&self) -> Option<Transmit> {
        self.transmits
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
    }

    /// Routes one inbound RTP packet. The first packet of an unknown SSRC
    /// asks the track-channel factory for a destination; a declined factory
    /// call drops the stream's packets.
    pub fn deliver_rtp(&self, packet: Packet) {
        if self.is_closed() {
            return;
        }

        let ssrc = packet.header.ssrc;
        let mut routes = self
            .track_routes
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if let Some(tx) = routes.get(&ssrc) {
            if tx.send(packet).is_err() {
                routes.remove(&ssrc);
            }
            return;
        }

        match (self.handlers.on_track_channel)(ssrc, packet.header.payload_type) {
            Some(tx) => {
                let _ = tx.send(packet);
                routes.insert(ssrc, tx);
            }
            None => {
                log::trace!("no track channel for inbound ssrc {ssrc}, dropping");
            }
        }
    }

    /// Reports one DCEP event inward.
    pub fn deliver_data_channel_event(&self, event: DataChannelEvent) {
        if self.is_closed() {
            return;
        }
        (self.handlers.on_data_channel_event)(event);
    }

    /// Reports an ICE connection state change inward.
    pub fn set_ice_connection_state(&self, state: RTCIceConnectionState) {
        if self.is_closed() {
            return;
        }
        (self.handlers.on_ice_state_change)(state);
    }

    /// Cancels all transport activity: inbound routing stops and queued
    /// outbound units are discarded.
    pub(crate) fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.track_routes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        self.transmits
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}
