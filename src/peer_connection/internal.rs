use std::sync::mpsc::{sync_channel, SyncSender};
use std::sync::{Arc, Mutex, PoisonError};

use sdp::description::common::{Address, ConnectionInformation};
use sdp::description::media::{MediaDescription, MediaName, RangedPort};
use sdp::description::session::{
    SessionDescription, ATTR_KEY_CANDIDATE, ATTR_KEY_CONNECTION_SETUP, ATTR_KEY_END_OF_CANDIDATES,
    ATTR_KEY_GROUP, ATTR_KEY_MID, ATTR_KEY_RTCPMUX, ATTR_KEY_RTCPRSIZE,
};
use sdp::util::ConnectionRole;

use crate::data_channel::message::DataChannelMessage;
use crate::data_channel::state::RTCDataChannelState;
use crate::data_channel::{DataChannelParameters, RTCDataChannel};
use crate::error::Result;
use crate::media::track::{RTCTrack, TrackStream};
use crate::peer_connection::sdp::{get_mid_value, get_peer_direction};
use crate::peer_connection::state::ice_connection_state::RTCIceConnectionState;
use crate::peer_connection::{
    Action, PeerConnectionCore, PeerConnectionInner, TRACK_CHANNEL_BUFFER,
};
use crate::rtp_transceiver::direction::{local_direction, RTCRtpTransceiverDirection};
use crate::rtp_transceiver::rtp_codec::RTPCodecType;
use crate::rtp_transceiver::{PayloadType, RTCRtpReceiver, RTCRtpSender, RTCRtpTransceiver, SSRC};
use crate::transport::{DataChannelEvent, Manager};

const MEDIA_SECTION_APPLICATION: &str = "application";
const SDP_ATTR_ICE_UFRAG: &str = "ice-ufrag";
const SDP_ATTR_ICE_PWD: &str = "ice-pwd";

/// Generates the offer SDP: session-level fingerprint, canonical per-kind
/// media sections for every kind the media engine knows, one data section,
/// and the BUNDLE group listing the emitted mids.
pub(super) fn build_offer_sdp(
    inner: &PeerConnectionInner,
    manager: &Manager,
) -> Result<SessionDescription> {
    let mut d = SessionDescription::new_jsep_session_description(false).with_fingerprint(
        "sha-256".to_owned(),
        manager.dtls_fingerprint().to_owned(),
    );

    let candidates = local_candidate_attributes(manager);
    let mut bundle_value = "BUNDLE".to_owned();

    for (kind, mid_value) in [(RTPCodecType::Audio, "audio"), (RTPCodecType::Video, "video")] {
        let peer_direction = offer_peer_direction(inner, kind);
        let (next, added) = add_rtp_media_section(
            d,
            inner,
            manager,
            kind,
            mid_value,
            peer_direction,
            &candidates,
            ConnectionRole::Actpass,
        );
        d = next;
        if added {
            bundle_value += &format!(" {mid_value}");
        }
    }

    d = add_data_media_section(d, manager, "data", &candidates, ConnectionRole::Actpass);

    Ok(d.with_value_attribute(ATTR_KEY_GROUP.to_owned(), bundle_value + " data"))
}

/// Generates the answer SDP by walking the remote description's media
/// sections in order, mirroring each section's mid and kind.
pub(super) fn build_answer_sdp(
    inner: &PeerConnectionInner,
    manager: &Manager,
    remote: &SessionDescription,
) -> Result<SessionDescription> {
    let mut d = SessionDescription::new_jsep_session_description(false).with_fingerprint(
        "sha-256".to_owned(),
        manager.dtls_fingerprint().to_owned(),
    );

    let candidates = local_candidate_attributes(manager);
    let mut bundle_value = "BUNDLE".to_owned();

    for remote_media in &remote.media_descriptions {
        let mid_value = get_mid_value(remote_media).unwrap_or_default().to_owned();
        let peer_direction = get_peer_direction(remote_media);

        match remote_media.media_name.media.as_str() {
            MEDIA_SECTION_APPLICATION => {
                d = add_data_media_section(d, manager, &mid_value, &candidates, ConnectionRole::Active);
                bundle_value += &format!(" {mid_value}");
            }
            media => {
                let kind = RTPCodecType::from(media);
                if kind == RTPCodecType::Unspecified {
                    continue;
                }
                let (next, added) = add_rtp_media_section(
                    d,
                    inner,
                    manager,
                    kind,
                    &mid_value,
                    peer_direction,
                    &candidates,
                    ConnectionRole::Active,
                );
                d = next;
                if added {
                    bundle_value += &format!(" {mid_value}");
                }
            }
        }
    }

    Ok(d.with_value_attribute(ATTR_KEY_GROUP.to_owned(), bundle_value))
}

/// The direction an offer advertises for one kind before any answer exists:
/// the peer is assumed send-capable exactly when some live transceiver of
/// the kind wants to receive.
fn offer_peer_direction(
    inner: &PeerConnectionInner,
    kind: RTPCodecType,
) -> RTCRtpTransceiverDirection {
    let wants_recv = inner
        .rtp_transceivers
        .iter()
        .any(|t| !t.stopped && t.kind == kind && t.direction.has_recv());
    if wants_recv {
        RTCRtpTransceiverDirection::Sendrecv
    } else {
        RTCRtpTransceiverDirection::Recvonly
    }
}

fn local_candidate_attributes(manager: &Manager) -> Vec<String> {
    manager
        .ice_agent()
        .local_candidates()
        .iter()
        .map(|c| c.marshal())
        .collect()
}

#[allow(clippy::too_many_arguments)]
fn add_rtp_media_section(
    d: SessionDescription,
    inner: &PeerConnectionInner,
    manager: &Manager,
    kind: RTPCodecType,
    mid_value: &str,
    peer_direction: RTCRtpTransceiverDirection,
    candidates: &[String],
    dtls_role: ConnectionRole,
) -> (SessionDescription, bool) {
    let codecs = inner.configuration.media_engine.get_codecs_by_kind(kind);
    if codecs.is_empty() {
        return (d, false);
    }

    let mut media = MediaDescription::new_jsep_media_description(kind.to_string(), vec![])
        .with_value_attribute(ATTR_KEY_CONNECTION_SETUP.to_owned(), dtls_role.to_string())
        .with_value_attribute(ATTR_KEY_MID.to_owned(), mid_value.to_owned())
        .with_ice_credentials(
            manager.ice_agent().local_ufrag().to_owned(),
            manager.ice_agent().local_pwd().to_owned(),
        )
        .with_property_attribute(ATTR_KEY_RTCPMUX.to_owned())
        .with_property_attribute(ATTR_KEY_RTCPRSIZE.to_owned());

    for codec in &codecs {
        media = media.with_codec(
            codec.payload_type,
            codec.name.clone(),
            codec.clock_rate,
            codec.channels,
            codec.sdp_fmtp_line.clone(),
        );
    }

    let mut we_send = false;
    for transceiver in &inner.rtp_transceivers {
        let track = match &transceiver.sender.track {
            Some(track) if !transceiver.stopped && track.kind == kind => track,
            _ => continue,
        };
        we_send = true;
        media = media.with_media_source(
            track.ssrc,
            track.label.clone(), /* cname */
            track.label.clone(), /* streamLabel */
            track.label.clone(),
        );
    }
    media = media.with_property_attribute(local_direction(we_send, peer_direction).to_string());

    for candidate in candidates {
        media = media.with_candidate(candidate.clone());
    }
    media = media.with_property_attribute(ATTR_KEY_END_OF_CANDIDATES.to_owned());

    (d.with_media(media), true)
}

fn add_data_media_section(
    d: SessionDescription,
    manager: &Manager,
    mid_value: &str,
    candidates: &[String],
    dtls_role: ConnectionRole,
) -> SessionDescription {
    let mut media = MediaDescription {
        media_name: MediaName {
            media: MEDIA_SECTION_APPLICATION.to_owned(),
            port: RangedPort {
                value: 9,
                range: None,
            },
            protos: vec!["DTLS".to_owned(), "SCTP".to_owned()],
            formats: vec!["5000".to_owned()],
        },
        connection_information: Some(ConnectionInformation {
            network_type: "IN".to_owned(),
            address_type: "IP4".to_owned(),
            address: Some(Address {
                address: "0.0.0.0".to_owned(),
                ttl: None,
                range: None,
            }),
        }),
        ..Default::default()
    }
    .with_value_attribute(ATTR_KEY_CONNECTION_SETUP.to_owned(), dtls_role.to_string())
    .with_value_attribute(ATTR_KEY_MID.to_owned(), mid_value.to_owned())
    .with_property_attribute(RTCRtpTransceiverDirection::Sendrecv.to_string())
    .with_property_attribute("sctpmap:5000 webrtc-datachannel 1024".to_owned())
    .with_ice_credentials(
        manager.ice_agent().local_ufrag().to_owned(),
        manager.ice_agent().local_pwd().to_owned(),
    );

    for candidate in candidates {
        media = media.with_candidate(candidate.clone());
    }
    media = media.with_property_attribute(ATTR_KEY_END_OF_CANDIDATES.to_owned());

    d.with_media(media)
}

/// Walks a parsed remote description, feeding every candidate attribute to
/// the ICE agent and collecting the remote ICE credentials. Unparseable
/// candidate lines are logged and skipped.
pub(super) fn apply_remote_description(
    manager: &Manager,
    parsed: &SessionDescription,
) -> (String, String) {
    let mut remote_ufrag = String::new();
    let mut remote_pwd = String::new();

    for media in &parsed.media_descriptions {
        for attribute in &media.attributes {
            match attribute.key.as_str() {
                ATTR_KEY_CANDIDATE => {
                    if let Some(value) = &attribute.value {
                        match crate::transport::ice::unmarshal_candidate(value) {
                            Ok(candidate) => {
                                manager.ice_agent().add_remote_candidate(candidate);
                            }
                            Err(err) => {
                                log::warn!("tried to parse ice candidate, but failed: {err}");
                            }
                        }
                    }
                }
                SDP_ATTR_ICE_UFRAG => {
                    remote_ufrag = attribute.value.clone().unwrap_or_default();
                }
                SDP_ATTR_ICE_PWD => {
                    remote_pwd = attribute.value.clone().unwrap_or_default();
                }
                _ => {}
            }
        }
    }

    (remote_ufrag, remote_pwd)
}

/// Applying a remote offer appends a recvonly transceiver slot for every
/// section the peer wants to send on, so inbound tracks have a slot to bind
/// to and later `add_track` calls can reuse it.
pub(super) fn create_transceivers_from_remote(
    inner: &mut PeerConnectionInner,
    parsed: &SessionDescription,
) {
    for media in &parsed.media_descriptions {
        let kind = RTPCodecType::from(media.media_name.media.as_str());
        if kind == RTPCodecType::Unspecified {
            continue;
        }
        if !get_peer_direction(media).has_send() {
            continue;
        }

        let mid_value = get_mid_value(media).map(ToOwned::to_owned);
        if let Some(mid) = &mid_value {
            if inner
                .rtp_transceivers
                .iter()
                .any(|t| t.mid.as_deref() == Some(mid))
            {
                continue;
            }
        }

        let mut transceiver = RTCRtpTransceiver::new(
            RTCRtpSender::new(None),
            RTCRtpReceiver::new(kind),
            RTCRtpTransceiverDirection::Recvonly,
            kind,
        );
        transceiver.mid = match mid_value {
            Some(mid) => Some(mid),
            None => Some(inner.next_mid()),
        };
        inner.rtp_transceivers.push(transceiver);
    }
}

impl PeerConnectionCore {
    pub(crate) fn enqueue_action(&self, action: Action) {
        let actions = self.actions.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(tx) = actions.as_ref() {
            let _ = tx.send(action);
        }
    }

    /// Track-channel factory: called by the network manager on the first
    /// inbound RTP packet of an unknown SSRC. Builds the remote track, binds
    /// it into a free receive slot and schedules the on-track callback.
    pub(crate) fn generate_channel(
        self: &Arc<Self>,
        ssrc: SSRC,
        payload_type: PayloadType,
    ) -> Option<SyncSender<rtp::packet::Packet>> {
        let has_handler = self
            .on_track
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some();
        if !has_handler {
            log::warn!("on_track is unset, discarding inbound stream {ssrc}");
            return None;
        }

        let codec = {
            let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
            match inner.configuration.media_engine.get_codec(payload_type) {
                Ok(codec) => codec,
                Err(_) => {
                    log::warn!("no codec could be found for payload type {payload_type}");
                    return None;
                }
            }
        };

        let (tx, rx) = sync_channel::<rtp::packet::Packet>(TRACK_CHANNEL_BUFFER);
        let track = Arc::new(RTCTrack {
            payload_type,
            ssrc,
            id: "0".to_owned(),
            label: String::new(),
            kind: codec.kind,
            codec,
            stream: TrackStream::Remote(Mutex::new(rx)),
        });

        {
            let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
            let kind = track.kind;
            if let Some(transceiver) = inner
                .rtp_transceivers
                .iter_mut()
                .find(|t| !t.stopped && t.kind == kind && t.receiver.track.is_none())
            {
                transceiver.receiver.track = Some(Arc::clone(&track));
            }
        }

        let core = Arc::clone(self);
        self.enqueue_action(Box::new(move || {
            let mut handler = core
                .on_track
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            if let Some(f) = handler.as_mut() {
                f(track);
            }
        }));

        Some(tx)
    }

    /// Dispatches one DCEP event from the transport into the data-channel
    /// registry. Application callbacks are scheduled onto the background
    /// worker, never invoked from the transport's context.
    pub(crate) fn handle_data_channel_event(self: &Arc<Self>, event: DataChannelEvent) {
        match event {
            DataChannelEvent::Created { stream_id, label } => {
                let channel = Arc::new(RTCDataChannel::new(
                    DataChannelParameters {
                        label,
                        ordered: true,
                        max_packet_life_time: None,
                        max_retransmits: None,
                        protocol: String::new(),
                        negotiated: false,
                        id: stream_id,
                        priority: Default::default(),
                        ready_state: RTCDataChannelState::Open,
                    },
                    Arc::downgrade(self),
                ));

                {
                    let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
                    inner.data_channels.insert(stream_id, Arc::clone(&channel));
                }

                let has_handler = self
                    .on_data_channel
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .is_some();
                if has_handler {
                    let core = Arc::clone(self);
                    self.enqueue_action(Box::new(move || {
                        {
                            let mut handler = core
                                .on_data_channel
                                .lock()
                                .unwrap_or_else(PoisonError::into_inner);
                            if let Some(f) = handler.as_mut() {
                                f(Arc::clone(&channel));
                            }
                        }
                        let mut on_open = channel
                            .on_open
                            .lock()
                            .unwrap_or_else(PoisonError::into_inner);
                        if let Some(f) = on_open.as_mut() {
                            f();
                        }
                    }));
                } else {
                    log::warn!("on_data_channel is unset, discarding channel {stream_id}");
                }
            }
            DataChannelEvent::Message {
                stream_id,
                is_string,
                payload,
            } => {
                let channel = {
                    let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
                    inner.data_channels.get(&stream_id).cloned()
                };

                match channel {
                    Some(channel) => {
                        let has_handler = channel
                            .on_message
                            .lock()
                            .unwrap_or_else(PoisonError::into_inner)
                            .is_some();
                        if has_handler {
                            self.enqueue_action(Box::new(move || {
                                let mut handler = channel
                                    .on_message
                                    .lock()
                                    .unwrap_or_else(PoisonError::into_inner);
                                if let Some(f) = handler.as_mut() {
                                    f(DataChannelMessage {
                                        is_string,
                                        data: payload,
                                    });
                                }
                            }));
                        } else {
                            log::warn!(
                                "on_message has not been set for data channel {} {stream_id}",
                                channel.label()
                            );
                        }
                    }
                    None => {
                        log::warn!("no data channel found for stream id {stream_id}");
                    }
                }
            }
            DataChannelEvent::Open => {
                let channels: Vec<Arc<RTCDataChannel>> = {
                    let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
                    inner.data_channels.values().cloned().collect()
                };

                for channel in channels {
                    if let Err(err) = channel.send_open_channel_message() {
                        log::warn!("failed to send open channel message: {err}");
                        continue;
                    }
                    channel.set_ready_state(RTCDataChannelState::Open);

                    self.enqueue_action(Box::new(move || {
                        let mut on_open = channel
                            .on_open
                            .lock()
                            .unwrap_or_else(PoisonError::into_inner);
                        if let Some(f) = on_open.as_mut() {
                            f();
                        }
                    }));
                }
            }
        }
    }

    /// Records an ICE connection state reported by the transport and
    /// schedules the application's state-change callback.
    pub(crate) fn handle_ice_state_change(self: &Arc<Self>, state: RTCIceConnectionState) {
        {
            let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
            inner.ice_connection_state = state;
        }

        let core = Arc::clone(self);
        self.enqueue_action(Box::new(move || {
            let mut handler = core
                .on_ice_connection_state_change
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            if let Some(f) = handler.as_mut() {
                f(state);
            }
        }));
    }
}
