use std::collections::HashMap;
use std::sync::mpsc::{channel, sync_channel, Sender};
use std::sync::{Arc, Mutex, PoisonError, RwLock, Weak};
use std::thread::JoinHandle;
use std::time::SystemTime;

use crate::data_channel::state::RTCDataChannelState;
use crate::data_channel::{DataChannelParameters, RTCDataChannel, RTCDataChannelInit};
use crate::error::{Error, Result};
use crate::media::track::{RTCTrack, TrackStream};
use crate::peer_connection::certificate::RTCCertificate;
use crate::peer_connection::configuration::{
    RTCAnswerOptions, RTCBundlePolicy, RTCConfiguration, RTCIceTransportPolicy, RTCOfferOptions,
    RTCRtcpMuxPolicy,
};
use crate::peer_connection::sdp::sdp_type::RTCSdpType;
use crate::peer_connection::sdp::session_description::RTCSessionDescription;
use crate::peer_connection::state::ice_connection_state::RTCIceConnectionState;
use crate::peer_connection::state::ice_gathering_state::RTCIceGatheringState;
use crate::peer_connection::state::peer_connection_state::RTCPeerConnectionState;
use crate::peer_connection::state::signaling_state::{
    check_next_signaling_state, RTCSignalingState, StateChangeOp,
};
use crate::rtp_transceiver::direction::RTCRtpTransceiverDirection;
use crate::rtp_transceiver::{
    PayloadType, RTCRtpReceiver, RTCRtpSender, RTCRtpTransceiver, SSRC,
};
use crate::transport::{Manager, RTCSctpTransport, RTCSctpTransportState, TransportHandlers};

pub mod certificate;
pub mod configuration;
pub(crate) mod internal;
pub mod sdp;
pub mod state;

pub type OnIceConnectionStateChangeHdlrFn = Box<dyn FnMut(RTCIceConnectionState) + Send>;
pub type OnTrackHdlrFn = Box<dyn FnMut(Arc<RTCTrack>) + Send>;
pub type OnDataChannelHdlrFn = Box<dyn FnMut(Arc<RTCDataChannel>) + Send>;

pub(crate) type Action = Box<dyn FnOnce() + Send + 'static>;

const RTP_OUTBOUND_MTU: usize = 1400;
pub(crate) const TRACK_CHANNEL_BUFFER: usize = 15;
const MAX_DATA_CHANNEL_ID: u16 = 65534;

/// Mutable peer-connection state, guarded by the connection's single
/// reader-writer lock.
pub(crate) struct PeerConnectionInner {
    pub(crate) configuration: RTCConfiguration,

    pub(crate) current_local_description: Option<RTCSessionDescription>,
    pub(crate) pending_local_description: Option<RTCSessionDescription>,
    pub(crate) current_remote_description: Option<RTCSessionDescription>,
    pub(crate) pending_remote_description: Option<RTCSessionDescription>,

    pub(crate) signaling_state: RTCSignalingState,
    pub(crate) ice_gathering_state: RTCIceGatheringState,
    pub(crate) ice_connection_state: RTCIceConnectionState,
    pub(crate) connection_state: RTCPeerConnectionState,

    pub(crate) idp_login_url: Option<String>,
    pub(crate) is_closed: bool,

    /// Source of monotonic unique transceiver mids.
    pub(crate) greater_mid: usize,
    pub(crate) rtp_transceivers: Vec<RTCRtpTransceiver>,
    pub(crate) data_channels: HashMap<u16, Arc<RTCDataChannel>>,
}

impl PeerConnectionInner {
    pub(crate) fn local_description(&self) -> Option<&RTCSessionDescription> {
        if self.pending_local_description.is_some() {
            self.pending_local_description.as_ref()
        } else {
            self.current_local_description.as_ref()
        }
    }

    pub(crate) fn remote_description(&self) -> Option<&RTCSessionDescription> {
        if self.pending_remote_description.is_some() {
            self.pending_remote_description.as_ref()
        } else {
            self.current_remote_description.as_ref()
        }
    }

    pub(crate) fn next_mid(&mut self) -> String {
        let mid = self.greater_mid.to_string();
        self.greater_mid += 1;
        mid
    }
}

/// Shared heart of a peer connection: the locked state, the network-manager
/// collaborator, the SCTP handle, the event hooks and the serial worker that
/// runs application callbacks.
pub(crate) struct PeerConnectionCore {
    pub(crate) inner: RwLock<PeerConnectionInner>,
    pub(crate) manager: Manager,
    pub(crate) sctp_transport: Arc<RTCSctpTransport>,

    pub(crate) actions: Mutex<Option<Sender<Action>>>,
    worker: Mutex<Option<JoinHandle<()>>>,

    pub(crate) on_ice_connection_state_change: Mutex<Option<OnIceConnectionStateChangeHdlrFn>>,
    pub(crate) on_track: Mutex<Option<OnTrackHdlrFn>>,
    pub(crate) on_data_channel: Mutex<Option<OnDataChannelHdlrFn>>,
}

/// A WebRTC connection between the local endpoint and a remote peer. It
/// drives session establishment through the offer/answer exchange, keeps the
/// transceiver inventory and the data-channel registry, and fans transport
/// events out to application callbacks.
///
/// The handle is cheap to clone; all clones drive the same connection.
///
/// ## Specifications
///
/// * [W3C](https://w3c.github.io/webrtc-pc/#dom-rtcpeerconnection)
#[derive(Clone)]
pub struct RTCPeerConnection {
    core: Arc<PeerConnectionCore>,
}

impl RTCPeerConnection {
    /// Creates a peer connection with the provided configuration. Defaults
    /// are applied first, then overlaid with the validated fields of the
    /// argument; a missing certificate list gets one generated ECDSA P-256
    /// certificate.
    pub fn new(configuration: RTCConfiguration) -> Result<Self> {
        let configuration = Self::init_configuration(configuration)?;

        let fingerprint = configuration.certificates[0]
            .get_fingerprints()
            .remove(0)
            .value;
        let ice_servers = configuration.ice_servers.clone();

        let core = Arc::new_cyclic(|weak: &Weak<PeerConnectionCore>| {
            let handlers = TransportHandlers {
                on_track_channel: {
                    let weak = weak.clone();
                    Box::new(move |ssrc, payload_type| {
                        weak.upgrade()
                            .and_then(|core| core.generate_channel(ssrc, payload_type))
                    })
                },
                on_data_channel_event: {
                    let weak = weak.clone();
                    Box::new(move |event| {
                        if let Some(core) = weak.upgrade() {
                            core.handle_data_channel_event(event);
                        }
                    })
                },
                on_ice_state_change: {
                    let weak = weak.clone();
                    Box::new(move |state| {
                        if let Some(core) = weak.upgrade() {
                            core.handle_ice_state_change(state);
                        }
                    })
                },
            };

            PeerConnectionCore {
                inner: RwLock::new(PeerConnectionInner {
                    configuration,
                    current_local_description: None,
                    pending_local_description: None,
                    current_remote_description: None,
                    pending_remote_description: None,
                    signaling_state: RTCSignalingState::Stable,
                    ice_gathering_state: RTCIceGatheringState::New,
                    ice_connection_state: RTCIceConnectionState::New,
                    connection_state: RTCPeerConnectionState::New,
                    idp_login_url: None,
                    is_closed: false,
                    greater_mid: 0,
                    rtp_transceivers: vec![],
                    data_channels: HashMap::new(),
                }),
                manager: Manager::new(fingerprint, handlers),
                sctp_transport: Arc::new(RTCSctpTransport::new()),
                actions: Mutex::new(None),
                worker: Mutex::new(None),
                on_ice_connection_state_change: Mutex::new(None),
                on_track: Mutex::new(None),
                on_data_channel: Mutex::new(None),
            }
        });

        for server in &ice_servers {
            for url in server.parse_urls()? {
                if let Err(err) = core.manager.add_url(url) {
                    log::warn!("failed to register ice url: {err}");
                }
            }
        }

        let (tx, rx) = channel::<Action>();
        let handle = std::thread::Builder::new()
            .name("rtc-peer-background".to_owned())
            .spawn(move || {
                for action in rx {
                    action();
                }
            })
            .map_err(|e| Error::Other(format!("failed to spawn background worker: {e}")))?;

        *core.actions.lock().unwrap_or_else(PoisonError::into_inner) = Some(tx);
        *core.worker.lock().unwrap_or_else(PoisonError::into_inner) = Some(handle);

        Ok(Self { core })
    }

    /// Validation and defaulting of the construction-time configuration.
    fn init_configuration(configuration: RTCConfiguration) -> Result<RTCConfiguration> {
        let mut config = RTCConfiguration {
            ice_servers: vec![],
            ice_transport_policy: RTCIceTransportPolicy::All,
            bundle_policy: RTCBundlePolicy::Balanced,
            rtcp_mux_policy: RTCRtcpMuxPolicy::Require,
            peer_identity: String::new(),
            certificates: vec![],
            ice_candidate_pool_size: 0,
            media_engine: configuration.media_engine,
        };

        if !configuration.peer_identity.is_empty() {
            config.peer_identity = configuration.peer_identity;
        }

        // https://www.w3.org/TR/webrtc/#constructor (step #3)
        if !configuration.certificates.is_empty() {
            let now = SystemTime::now();
            for cert in &configuration.certificates {
                if cert.expires() < now {
                    return Err(Error::ErrCertificateExpired);
                }
            }
            config.certificates = configuration.certificates;
        } else {
            config.certificates = vec![RTCCertificate::generate()?];
        }

        if configuration.bundle_policy != RTCBundlePolicy::Unspecified {
            config.bundle_policy = configuration.bundle_policy;
        }

        if configuration.rtcp_mux_policy != RTCRtcpMuxPolicy::Unspecified {
            config.rtcp_mux_policy = configuration.rtcp_mux_policy;
        }

        if configuration.ice_candidate_pool_size != 0 {
            config.ice_candidate_pool_size = configuration.ice_candidate_pool_size;
        }

        if configuration.ice_transport_policy != RTCIceTransportPolicy::Unspecified {
            config.ice_transport_policy = configuration.ice_transport_policy;
        }

        if !configuration.ice_servers.is_empty() {
            for server in &configuration.ice_servers {
                server.validate()?;
            }
            config.ice_servers = configuration.ice_servers;
        }

        Ok(config)
    }

    /// Updates the configuration of this peer connection. Peer identity,
    /// certificates, bundle policy and rtcp-mux policy are immutable once
    /// set; the candidate pool size freezes as soon as a local description
    /// exists. A rejected update leaves the previous configuration intact.
    /// The media engine is not part of the updatable surface.
    pub fn set_configuration(&self, configuration: RTCConfiguration) -> Result<()> {
        let mut inner = self
            .core
            .inner
            .write()
            .map_err(|e| Error::Poison(e.to_string()))?;

        // https://www.w3.org/TR/webrtc/#dom-rtcpeerconnection-setconfiguration (step #2)
        if inner.is_closed {
            return Err(Error::ErrConnectionClosed);
        }

        // Validate against the current configuration first; nothing is
        // assigned until every rule passed.
        let mut config = inner.configuration.clone();

        // https://www.w3.org/TR/webrtc/#set-the-configuration (step #3)
        if !configuration.peer_identity.is_empty() {
            if !config.peer_identity.is_empty()
                && configuration.peer_identity != config.peer_identity
            {
                return Err(Error::ErrModifyingPeerIdentity);
            }
            config.peer_identity = configuration.peer_identity;
        }

        // https://www.w3.org/TR/webrtc/#set-the-configuration (step #4)
        if !configuration.certificates.is_empty() {
            if configuration.certificates.len() != config.certificates.len() {
                return Err(Error::ErrModifyingCertificates);
            }
            for (i, certificate) in configuration.certificates.iter().enumerate() {
                if &config.certificates[i] != certificate {
                    return Err(Error::ErrModifyingCertificates);
                }
            }
            config.certificates = configuration.certificates;
        }

        // https://www.w3.org/TR/webrtc/#set-the-configuration (step #5)
        if configuration.bundle_policy != RTCBundlePolicy::Unspecified {
            if configuration.bundle_policy != config.bundle_policy {
                return Err(Error::ErrModifyingBundlePolicy);
            }
            config.bundle_policy = configuration.bundle_policy;
        }

        // https://www.w3.org/TR/webrtc/#set-the-configuration (step #6)
        if configuration.rtcp_mux_policy != RTCRtcpMuxPolicy::Unspecified {
            if configuration.rtcp_mux_policy != config.rtcp_mux_policy {
                return Err(Error::ErrModifyingRtcpMuxPolicy);
            }
            config.rtcp_mux_policy = configuration.rtcp_mux_policy;
        }

        // https://www.w3.org/TR/webrtc/#set-the-configuration (step #7)
        if configuration.ice_candidate_pool_size != 0 {
            if config.ice_candidate_pool_size != configuration.ice_candidate_pool_size
                && inner.local_description().is_some()
            {
                return Err(Error::ErrModifyingICECandidatePoolSize);
            }
            config.ice_candidate_pool_size = configuration.ice_candidate_pool_size;
        }

        // https://www.w3.org/TR/webrtc/#set-the-configuration (step #8)
        if configuration.ice_transport_policy != RTCIceTransportPolicy::Unspecified {
            config.ice_transport_policy = configuration.ice_transport_policy;
        }

        // https://www.w3.org/TR/webrtc/#set-the-configuration (step #11)
        if !configuration.ice_servers.is_empty() {
            for server in &configuration.ice_servers {
                server.validate()?;
            }
            config.ice_servers = configuration.ice_servers;
        }

        inner.configuration = config;
        Ok(())
    }

    /// Returns a snapshot of the current configuration. Mutating the
    /// returned value has no effect until it is passed back through
    /// `set_configuration`.
    pub fn get_configuration(&self) -> RTCConfiguration {
        let inner = self
            .core
            .inner
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        inner.configuration.clone()
    }

    /// Generates an SDP offer from the transceiver inventory and the
    /// gathered candidates, stores it as the pending local description and
    /// moves the signaling state to have-local-offer.
    pub fn create_offer(
        &self,
        options: Option<RTCOfferOptions>,
    ) -> Result<RTCSessionDescription> {
        if options.is_some() {
            return Err(Error::ErrOfferOptionsNotSupported);
        }

        let mut inner = self
            .core
            .inner
            .write()
            .map_err(|e| Error::Poison(e.to_string()))?;

        if inner.is_closed {
            return Err(Error::ErrConnectionClosed);
        }
        if inner.idp_login_url.is_some() {
            return Err(Error::ErrIdentityProviderNotSupported);
        }

        let d = internal::build_offer_sdp(&inner, &self.core.manager)?;
        let desc = RTCSessionDescription {
            sdp_type: RTCSdpType::Offer,
            sdp: d.marshal(),
            parsed: Some(d),
        };

        Self::set_description(&mut inner, desc.clone(), StateChangeOp::SetLocal)?;
        inner.ice_gathering_state = RTCIceGatheringState::Complete;

        Ok(desc)
    }

    /// Generates an SDP answer mirroring the remote offer's media sections,
    /// stores it as the local description and moves the exchange back to
    /// stable.
    pub fn create_answer(
        &self,
        options: Option<RTCAnswerOptions>,
    ) -> Result<RTCSessionDescription> {
        if options.is_some() {
            return Err(Error::ErrAnswerOptionsNotSupported);
        }

        let mut inner = self
            .core
            .inner
            .write()
            .map_err(|e| Error::Poison(e.to_string()))?;

        if inner.is_closed {
            return Err(Error::ErrConnectionClosed);
        }
        if inner.idp_login_url.is_some() {
            return Err(Error::ErrIdentityProviderNotSupported);
        }

        check_next_signaling_state(
            inner.signaling_state,
            RTCSignalingState::Stable,
            StateChangeOp::SetLocal,
            RTCSdpType::Answer,
        )?;

        let remote = match inner.remote_description() {
            Some(remote) => remote.clone(),
            None => {
                return Err(Error::ErrSignalingStateProposedTransitionInvalid(
                    "create answer without remote description".to_owned(),
                ))
            }
        };
        let remote_parsed = match &remote.parsed {
            Some(parsed) => parsed.clone(),
            None => remote.unmarshal()?,
        };

        let d = internal::build_answer_sdp(&inner, &self.core.manager, &remote_parsed)?;
        let desc = RTCSessionDescription {
            sdp_type: RTCSdpType::Answer,
            sdp: d.marshal(),
            parsed: Some(d),
        };

        Self::set_description(&mut inner, desc.clone(), StateChangeOp::SetLocal)?;
        inner.ice_gathering_state = RTCIceGatheringState::Complete;

        Ok(desc)
    }

    /// 4.4.1.6 Set the SessionDescription: validates the proposed signaling
    /// transition, then applies the description to the pending/current
    /// slots. Reaching stable promotes both pending descriptions.
    fn set_description(
        inner: &mut PeerConnectionInner,
        sd: RTCSessionDescription,
        op: StateChangeOp,
    ) -> Result<()> {
        let next_state = match (op, sd.sdp_type) {
            (StateChangeOp::SetLocal, RTCSdpType::Offer) => check_next_signaling_state(
                inner.signaling_state,
                RTCSignalingState::HaveLocalOffer,
                op,
                sd.sdp_type,
            )?,
            (StateChangeOp::SetLocal, RTCSdpType::Pranswer) => check_next_signaling_state(
                inner.signaling_state,
                RTCSignalingState::HaveLocalPranswer,
                op,
                sd.sdp_type,
            )?,
            (StateChangeOp::SetLocal, RTCSdpType::Answer) => check_next_signaling_state(
                inner.signaling_state,
                RTCSignalingState::Stable,
                op,
                sd.sdp_type,
            )?,
            (StateChangeOp::SetRemote, RTCSdpType::Offer) => check_next_signaling_state(
                inner.signaling_state,
                RTCSignalingState::HaveRemoteOffer,
                op,
                sd.sdp_type,
            )?,
            (StateChangeOp::SetRemote, RTCSdpType::Pranswer) => check_next_signaling_state(
                inner.signaling_state,
                RTCSignalingState::HaveRemotePranswer,
                op,
                sd.sdp_type,
            )?,
            (StateChangeOp::SetRemote, RTCSdpType::Answer) => check_next_signaling_state(
                inner.signaling_state,
                RTCSignalingState::Stable,
                op,
                sd.sdp_type,
            )?,
            _ => {
                return Err(Error::ErrSignalingStateProposedTransitionInvalid(format!(
                    "cannot apply {} as {}",
                    sd.sdp_type, op
                )))
            }
        };

        match (op, sd.sdp_type) {
            (StateChangeOp::SetLocal, RTCSdpType::Offer)
            | (StateChangeOp::SetLocal, RTCSdpType::Pranswer) => {
                inner.pending_local_description = Some(sd);
            }
            (StateChangeOp::SetLocal, RTCSdpType::Answer) => {
                inner.current_local_description = Some(sd);
                inner.current_remote_description = inner.pending_remote_description.take();
                inner.pending_local_description = None;
            }
            (StateChangeOp::SetRemote, RTCSdpType::Offer)
            | (StateChangeOp::SetRemote, RTCSdpType::Pranswer) => {
                inner.pending_remote_description = Some(sd);
            }
            (StateChangeOp::SetRemote, RTCSdpType::Answer) => {
                inner.current_remote_description = Some(sd);
                inner.current_local_description = inner.pending_local_description.take();
                inner.pending_remote_description = None;
            }
            _ => {}
        }
        inner.signaling_state = next_state;

        Ok(())
    }

    /// Applies a description received from the remote peer: the wire form is
    /// parsed, its candidates and ICE credentials are pushed down to the
    /// network manager, and the manager is started with the negotiated role.
    /// A parse failure or an invalid signaling transition mutates nothing.
    pub fn set_remote_description(&self, mut desc: RTCSessionDescription) -> Result<()> {
        let mut inner = self
            .core
            .inner
            .write()
            .map_err(|e| Error::Poison(e.to_string()))?;

        if inner.is_closed {
            return Err(Error::ErrConnectionClosed);
        }

        let parsed = match &desc.parsed {
            Some(parsed) => parsed.clone(),
            None => desc.unmarshal()?,
        };
        desc.parsed = Some(parsed.clone());

        let we_offer = desc.sdp_type != RTCSdpType::Offer;
        let is_offer = desc.sdp_type == RTCSdpType::Offer;

        Self::set_description(&mut inner, desc, StateChangeOp::SetRemote)?;

        if is_offer {
            internal::create_transceivers_from_remote(&mut inner, &parsed);
        }

        let (remote_ufrag, remote_pwd) =
            internal::apply_remote_description(&self.core.manager, &parsed);

        self.core.manager.start(we_offer, &remote_ufrag, &remote_pwd)
    }

    /// The pending local description if a negotiation is in progress,
    /// otherwise the current one.
    pub fn local_description(&self) -> Option<RTCSessionDescription> {
        let inner = self
            .core
            .inner
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        inner.local_description().cloned()
    }

    /// The pending remote description if a negotiation is in progress,
    /// otherwise the current one.
    pub fn remote_description(&self) -> Option<RTCSessionDescription> {
        let inner = self
            .core
            .inner
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        inner.remote_description().cloned()
    }

    /// Parses one SDP candidate attribute line and adds it to the remote
    /// candidate set.
    pub fn add_ice_candidate(&self, candidate: &str) -> Result<()> {
        {
            let inner = self
                .core
                .inner
                .read()
                .unwrap_or_else(PoisonError::into_inner);
            if inner.is_closed {
                return Err(Error::ErrConnectionClosed);
            }
        }

        let candidate = crate::transport::ice::unmarshal_candidate(candidate)?;
        self.core.manager.ice_agent().add_remote_candidate(candidate);
        Ok(())
    }

    /// The senders currently attached, in insertion order.
    pub fn get_senders(&self) -> Vec<RTCRtpSender> {
        let inner = self
            .core
            .inner
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        inner
            .rtp_transceivers
            .iter()
            .map(|t| t.sender.clone())
            .collect()
    }

    /// The receivers currently attached, in insertion order.
    pub fn get_receivers(&self) -> Vec<RTCRtpReceiver> {
        let inner = self
            .core
            .inner
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        inner
            .rtp_transceivers
            .iter()
            .map(|t| t.receiver.clone())
            .collect()
    }

    /// The transceivers currently attached, in insertion order.
    pub fn get_transceivers(&self) -> Vec<RTCRtpTransceiver> {
        let inner = self
            .core
            .inner
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        inner.rtp_transceivers.clone()
    }

    /// Attaches a local track. A transceiver that is receiving the same kind
    /// and not yet sending is reused; otherwise a fresh sendonly transceiver
    /// joins the inventory. The track's identifier must be unused.
    pub fn add_track(&self, track: Arc<RTCTrack>) -> Result<RTCRtpSender> {
        let mut inner = self
            .core
            .inner
            .write()
            .map_err(|e| Error::Poison(e.to_string()))?;

        if inner.is_closed {
            return Err(Error::ErrConnectionClosed);
        }

        for transceiver in &inner.rtp_transceivers {
            if let Some(existing) = &transceiver.sender.track {
                if existing.id == track.id {
                    return Err(Error::ErrExistingTrack);
                }
            }
        }

        let reusable = inner.rtp_transceivers.iter().position(|t| {
            !t.stopped
                && t.sender.track.is_none()
                && t.receiver
                    .track
                    .as_ref()
                    .is_some_and(|r| r.kind == track.kind)
        });

        let index = match reusable {
            Some(index) => {
                inner.rtp_transceivers[index].set_sending_track(Arc::clone(&track))?;
                index
            }
            None => {
                let transceiver = RTCRtpTransceiver::new(
                    RTCRtpSender::new(Some(Arc::clone(&track))),
                    RTCRtpReceiver::new(track.kind),
                    RTCRtpTransceiverDirection::Sendonly,
                    track.kind,
                );
                inner.rtp_transceivers.push(transceiver);
                inner.rtp_transceivers.len() - 1
            }
        };

        if inner.rtp_transceivers[index].mid.is_none() {
            let mid = inner.next_mid();
            inner.rtp_transceivers[index].mid = Some(mid);
        }

        Ok(inner.rtp_transceivers[index].sender.clone())
    }

    /// Creates a data channel with the given label, registers it and
    /// allocates its stream id unless the channel was negotiated
    /// out-of-band.
    pub fn create_data_channel(
        &self,
        label: &str,
        options: Option<RTCDataChannelInit>,
    ) -> Result<Arc<RTCDataChannel>> {
        let mut inner = self
            .core
            .inner
            .write()
            .map_err(|e| Error::Poison(e.to_string()))?;

        // https://w3c.github.io/webrtc-pc/#peer-to-peer-data-api (step #2)
        if inner.is_closed {
            return Err(Error::ErrConnectionClosed);
        }

        // https://w3c.github.io/webrtc-pc/#peer-to-peer-data-api (step #5)
        if label.len() > 65535 {
            return Err(Error::ErrStringSizeLimit);
        }

        let mut params = DataChannelParameters {
            label: label.to_owned(),
            ordered: true,
            max_packet_life_time: None,
            max_retransmits: None,
            protocol: String::new(),
            negotiated: false,
            id: 0,
            priority: Default::default(),
            ready_state: RTCDataChannelState::Connecting,
        };

        let mut supplied_id = None;
        if let Some(options) = options {
            if let Some(ordered) = options.ordered {
                params.ordered = ordered;
            }
            params.max_packet_life_time = options.max_packet_life_time;
            params.max_retransmits = options.max_retransmits;
            if let Some(protocol) = options.protocol {
                params.protocol = protocol;
            }
            if let Some(negotiated) = options.negotiated {
                params.negotiated = negotiated;
            }
            if params.negotiated {
                supplied_id = options.id;
            }
            if let Some(priority) = options.priority {
                params.priority = priority;
            }
        }

        // https://w3c.github.io/webrtc-pc/#peer-to-peer-data-api (step #11)
        if params.protocol.len() > 65535 {
            return Err(Error::ErrStringSizeLimit);
        }

        // https://w3c.github.io/webrtc-pc/#peer-to-peer-data-api (step #14)
        if params.negotiated && supplied_id.is_none() {
            return Err(Error::ErrNegotiatedWithoutID);
        }

        // https://w3c.github.io/webrtc-pc/#peer-to-peer-data-api (step #16)
        if params.max_packet_life_time.is_some() && params.max_retransmits.is_some() {
            return Err(Error::ErrRetransmitsOrPacketLifeTime);
        }

        // https://w3c.github.io/webrtc-pc/#peer-to-peer-data-api (step #19)
        params.id = match supplied_id {
            Some(id) => id,
            None => {
                // DCEP parity: the offering side takes even stream ids, the
                // answering side odd ones.
                let client = !matches!(
                    inner.remote_description().map(|d| d.sdp_type),
                    Some(RTCSdpType::Offer)
                );
                Self::generate_data_channel_id(&inner, client, self.sctp_max_channels())?
            }
        };

        // https://w3c.github.io/webrtc-pc/#peer-to-peer-data-api (step #18)
        if params.id > MAX_DATA_CHANNEL_ID {
            return Err(Error::ErrMaxDataChannelID);
        }

        if self.core.sctp_transport.state() == RTCSctpTransportState::Connected
            && params.id >= self.sctp_max_channels()
        {
            return Err(Error::ErrNoAvailableDataChannelID);
        }

        let id = params.id;
        let channel = Arc::new(RTCDataChannel::new(params, Arc::downgrade(&self.core)));
        inner.data_channels.insert(id, Arc::clone(&channel));

        Ok(channel)
    }

    fn sctp_max_channels(&self) -> u16 {
        self.core.sctp_transport.max_channels()
    }

    fn generate_data_channel_id(
        inner: &PeerConnectionInner,
        client: bool,
        max_channels: u16,
    ) -> Result<u16> {
        let mut id = u16::from(!client);

        while id < max_channels.saturating_sub(1) {
            if !inner.data_channels.contains_key(&id) {
                return Ok(id);
            }
            id += 2;
        }

        Err(Error::ErrNoAvailableDataChannelID)
    }

    /// Serializes user-provided RTCP packets and forwards the raw bytes to
    /// the network manager. If no peer is connected the payload is discarded
    /// downstream.
    pub fn send_rtcp(
        &self,
        packets: &[Box<dyn rtcp::packet::Packet + Send + Sync>],
    ) -> Result<()> {
        {
            let inner = self
                .core
                .inner
                .read()
                .unwrap_or_else(PoisonError::into_inner);
            if inner.is_closed {
                return Err(Error::ErrConnectionClosed);
            }
        }

        let raw = rtcp::packet::marshal(packets)
            .map_err(|e| Error::Other(format!("rtcp marshal: {e}")))?;
        self.core.manager.send_rtcp(raw);
        Ok(())
    }

    /// Ends the peer connection: the background worker is drained and
    /// stopped, the network manager is closed and every state moves to
    /// closed. Closing an already-closed connection is a no-op.
    pub fn close(&self) -> Result<()> {
        {
            let mut inner = self
                .core
                .inner
                .write()
                .map_err(|e| Error::Poison(e.to_string()))?;

            // https://www.w3.org/TR/webrtc/#dom-rtcpeerconnection-close (step #2)
            if inner.is_closed {
                return Ok(());
            }
            inner.is_closed = true;

            inner.signaling_state = RTCSignalingState::Closed;
            inner.ice_connection_state = RTCIceConnectionState::Closed;
            inner.connection_state = RTCPeerConnectionState::Closed;
        }

        let tx = self
            .core
            .actions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        drop(tx);
        let worker = self
            .core
            .worker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(worker) = worker {
            let _ = worker.join();
        }

        self.core.manager.close();

        Ok(())
    }

    /// Creates a track that consumes media samples and packetizes them with
    /// the codec's payloader. The SSRC is chosen at random.
    pub fn new_sample_track(
        &self,
        payload_type: PayloadType,
        id: &str,
        label: &str,
    ) -> Result<Arc<RTCTrack>> {
        self.new_track(payload_type, 0, id, label)
    }

    /// Creates a track that accepts ready-made RTP packets for forwarding.
    ///
    /// If the source RTP stream is broadcast to multiple tracks, each track
    /// must receive its own copies of the source packets to avoid packet
    /// corruption.
    pub fn new_raw_rtp_track(
        &self,
        payload_type: PayloadType,
        ssrc: SSRC,
        id: &str,
        label: &str,
    ) -> Result<Arc<RTCTrack>> {
        if ssrc == 0 {
            return Err(Error::ErrRawTrackSSRCZero);
        }
        self.new_track(payload_type, ssrc, id, label)
    }

    fn new_track(
        &self,
        payload_type: PayloadType,
        mut ssrc: SSRC,
        id: &str,
        label: &str,
    ) -> Result<Arc<RTCTrack>> {
        let codec = {
            let inner = self
                .core
                .inner
                .read()
                .unwrap_or_else(PoisonError::into_inner);
            if inner.is_closed {
                return Err(Error::ErrConnectionClosed);
            }
            inner.configuration.media_engine.get_codec(payload_type)?
        };

        let payloader = codec.payloader.clone().ok_or(Error::ErrPayloaderNotSet)?;
        let weak = Arc::downgrade(&self.core);

        let stream = if ssrc == 0 {
            while ssrc == 0 {
                ssrc = crate::util::crypto_rand_u32();
            }

            let (tx, rx) = sync_channel::<crate::media::Sample>(TRACK_CHANNEL_BUFFER);
            let mut packetizer = crate::media::packetizer::Packetizer::new(
                RTP_OUTBOUND_MTU,
                payload_type,
                ssrc,
                payloader,
            );
            std::thread::spawn(move || {
                while let Ok(sample) = rx.recv() {
                    let Some(core) = weak.upgrade() else { break };
                    for packet in packetizer.packetize(&sample.data, sample.samples) {
                        core.manager.send_rtp(packet);
                    }
                }
            });
            TrackStream::Sample(tx)
        } else {
            let (tx, rx) = sync_channel::<rtp::packet::Packet>(TRACK_CHANNEL_BUFFER);
            std::thread::spawn(move || {
                while let Ok(packet) = rx.recv() {
                    let Some(core) = weak.upgrade() else { break };
                    core.manager.send_rtp(packet);
                }
            });
            TrackStream::RawRtp(tx)
        };

        Ok(Arc::new(RTCTrack {
            payload_type,
            ssrc,
            id: id.to_owned(),
            label: label.to_owned(),
            kind: codec.kind,
            codec,
            stream,
        }))
    }

    /// Configures an identity provider for identity assertions. Not
    /// supported by this implementation.
    pub fn set_identity_provider(&self, _provider: &str) -> Result<()> {
        Err(Error::ErrIdentityProviderNotSupported)
    }

    pub fn signaling_state(&self) -> RTCSignalingState {
        self.core
            .inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .signaling_state
    }

    pub fn ice_gathering_state(&self) -> RTCIceGatheringState {
        self.core
            .inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .ice_gathering_state
    }

    pub fn ice_connection_state(&self) -> RTCIceConnectionState {
        self.core
            .inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .ice_connection_state
    }

    pub fn connection_state(&self) -> RTCPeerConnectionState {
        self.core
            .inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .connection_state
    }

    /// Sets the handler called when the ICE connection state changes. The
    /// handler runs on the background worker; it must not call `close`
    /// synchronously.
    pub fn on_ice_connection_state_change(&self, f: OnIceConnectionStateChangeHdlrFn) {
        *self
            .core
            .on_ice_connection_state_change
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(f);
    }

    /// Sets the handler called when a remote track arrives. The handler runs
    /// on the background worker.
    pub fn on_track(&self, f: OnTrackHdlrFn) {
        *self
            .core
            .on_track
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(f);
    }

    /// Sets the handler called when the remote peer opens a data channel.
    /// The handler runs on the background worker.
    pub fn on_data_channel(&self, f: OnDataChannelHdlrFn) {
        *self
            .core
            .on_data_channel
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(f);
    }

    /// The network-manager collaborator: the handle the external transport
    /// drives for inbound delivery and outbound polling.
    pub fn network_manager(&self) -> &Manager {
        &self.core.manager
    }

    /// The handle onto the SCTP association backing the data channels.
    pub fn sctp_transport(&self) -> Arc<RTCSctpTransport> {
        Arc::clone(&self.core.sctp_transport)
    }
}
