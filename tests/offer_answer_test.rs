use std::sync::Arc;

use anyhow::Result;

use rtc_peer::error::{Error, ErrorKind};
use rtc_peer::media::packetizer::OpusPayloader;
use rtc_peer::peer_connection::configuration::media_engine::MediaEngine;
use rtc_peer::peer_connection::configuration::RTCConfigurationBuilder;
use rtc_peer::peer_connection::sdp::session_description::RTCSessionDescription;
use rtc_peer::peer_connection::state::ice_gathering_state::RTCIceGatheringState;
use rtc_peer::peer_connection::state::signaling_state::RTCSignalingState;
use rtc_peer::rtp_transceiver::direction::RTCRtpTransceiverDirection;
use rtc_peer::rtp_transceiver::rtp_codec::{RTCRtpCodec, RTPCodecType};
use rtc_peer::RTCPeerConnection;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn audio_only_media_engine() -> MediaEngine {
    let mut media_engine = MediaEngine::default();
    media_engine.register_codec(RTCRtpCodec {
        payload_type: 111,
        name: "opus".to_owned(),
        kind: RTPCodecType::Audio,
        clock_rate: 48000,
        channels: 2,
        sdp_fmtp_line: "minptime=10;useinbandfec=1".to_owned(),
        payloader: Some(Arc::new(OpusPayloader)),
    });
    media_engine
}

fn new_peer_connection(media_engine: MediaEngine) -> Result<RTCPeerConnection> {
    Ok(RTCPeerConnection::new(
        RTCConfigurationBuilder::new()
            .with_media_engine(media_engine)
            .build(),
    )?)
}

fn group_attribute(desc: &RTCSessionDescription) -> Option<String> {
    let parsed = desc.unmarshal().ok()?;
    parsed
        .attributes
        .iter()
        .find(|a| a.key == "group")
        .and_then(|a| a.value.clone())
}

fn section_mids(desc: &RTCSessionDescription) -> Vec<String> {
    let parsed = desc.unmarshal().expect("offer must parse");
    parsed
        .media_descriptions
        .iter()
        .map(|m| {
            m.attributes
                .iter()
                .find(|a| a.key == "mid")
                .and_then(|a| a.value.clone())
                .unwrap_or_default()
        })
        .collect()
}

fn section_has_property(desc: &RTCSessionDescription, section: usize, key: &str) -> bool {
    let parsed = desc.unmarshal().expect("description must parse");
    parsed.media_descriptions[section]
        .attributes
        .iter()
        .any(|a| a.key == key)
}

const REMOTE_OFFER: &str = "v=0\r\n\
o=- 884499 2 IN IP4 127.0.0.1\r\n\
s=-\r\n\
t=0 0\r\n\
m=video 9 UDP/TLS/RTP/SAVPF 96\r\n\
c=IN IP4 0.0.0.0\r\n\
a=setup:actpass\r\n\
a=mid:v0\r\n\
a=sendonly\r\n\
a=ice-ufrag:remoteufrag\r\n\
a=ice-pwd:remotepwdremotepwdremote\r\n\
a=rtpmap:96 VP8/90000\r\n\
a=candidate:1966762133 1 udp 2130706431 192.168.20.129 47298 typ host\r\n\
m=application 9 DTLS/SCTP 5000\r\n\
c=IN IP4 0.0.0.0\r\n\
a=setup:actpass\r\n\
a=mid:d0\r\n\
a=sctpmap:5000 webrtc-datachannel 1024\r\n";

#[test]
fn test_empty_offer_has_only_data_section() -> Result<()> {
    init_logging();

    // No codecs registered: the offer carries no audio or video sections.
    let pc = new_peer_connection(MediaEngine::default())?;
    let offer = pc.create_offer(None)?;

    let parsed = offer.unmarshal()?;
    assert_eq!(parsed.media_descriptions.len(), 1);
    assert_eq!(parsed.media_descriptions[0].media_name.media, "application");
    assert_eq!(
        parsed.media_descriptions[0].media_name.protos,
        vec!["DTLS".to_owned(), "SCTP".to_owned()]
    );
    assert_eq!(group_attribute(&offer).as_deref(), Some("BUNDLE data"));

    assert_eq!(pc.signaling_state(), RTCSignalingState::HaveLocalOffer);
    assert_eq!(pc.ice_gathering_state(), RTCIceGatheringState::Complete);

    pc.close()?;
    Ok(())
}

#[test]
fn test_create_offer_stores_local_description_with_matching_bundle() -> Result<()> {
    init_logging();

    let mut media_engine = MediaEngine::default();
    media_engine.register_default_codecs()?;
    let pc = new_peer_connection(media_engine)?;

    let offer = pc.create_offer(None)?;
    let local = pc.local_description().expect("local description stored");
    assert_eq!(local.sdp, offer.sdp);

    // The BUNDLE group names exactly the mids of the emitted sections.
    let mids = section_mids(&local);
    let group = group_attribute(&local).expect("bundle group present");
    let expected = format!("BUNDLE {}", mids.join(" "));
    assert_eq!(group, expected);
    assert_eq!(mids, vec!["audio", "video", "data"]);

    pc.close()?;
    Ok(())
}

#[test]
fn test_offer_reparse_preserves_sections_and_mids() -> Result<()> {
    init_logging();

    let mut media_engine = MediaEngine::default();
    media_engine.register_default_codecs()?;
    let pc = new_peer_connection(media_engine)?;

    let offer = pc.create_offer(None)?;
    let reparsed = RTCSessionDescription::offer(offer.sdp.clone())?;
    assert_eq!(section_mids(&offer), section_mids(&reparsed));

    pc.close()?;
    Ok(())
}

#[test]
fn test_audio_track_offer() -> Result<()> {
    init_logging();

    let pc = new_peer_connection(audio_only_media_engine())?;

    let track = pc.new_raw_rtp_track(111, 42, "a", "a-label")?;
    pc.add_track(track)?;

    let offer = pc.create_offer(None)?;
    let parsed = offer.unmarshal()?;

    assert_eq!(parsed.media_descriptions.len(), 2);
    assert_eq!(parsed.media_descriptions[0].media_name.media, "audio");
    assert_eq!(parsed.media_descriptions[1].media_name.media, "application");
    assert_eq!(group_attribute(&offer).as_deref(), Some("BUNDLE audio data"));

    let audio = &parsed.media_descriptions[0];
    assert!(audio
        .attributes
        .iter()
        .any(|a| a.key == "ssrc" && a.value.as_deref().is_some_and(|v| v.starts_with("42"))));
    assert!(section_has_property(&offer, 0, "sendonly"));
    assert!(audio
        .attributes
        .iter()
        .any(|a| a.key == "setup" && a.value.as_deref() == Some("actpass")));

    pc.close()?;
    Ok(())
}

#[test]
fn test_answer_mirrors_remote_sections() -> Result<()> {
    init_logging();

    let mut media_engine = MediaEngine::default();
    media_engine.register_default_codecs()?;
    let pc = new_peer_connection(media_engine)?;

    let offer = RTCSessionDescription::offer(REMOTE_OFFER.to_owned())?;
    pc.set_remote_description(offer)?;
    assert_eq!(pc.signaling_state(), RTCSignalingState::HaveRemoteOffer);

    let answer = pc.create_answer(None)?;
    assert_eq!(section_mids(&answer), vec!["v0", "d0"]);

    // The peer sends, we don't: the mirrored section must be recvonly with
    // the answering DTLS role.
    assert!(section_has_property(&answer, 0, "recvonly"));
    let parsed = answer.unmarshal()?;
    for media in &parsed.media_descriptions {
        assert!(media
            .attributes
            .iter()
            .any(|a| a.key == "setup" && a.value.as_deref() == Some("active")));
    }
    assert_eq!(group_attribute(&answer).as_deref(), Some("BUNDLE v0 d0"));

    // Answer applied: the exchange is back to stable with promoted
    // descriptions.
    assert_eq!(pc.signaling_state(), RTCSignalingState::Stable);
    assert_eq!(
        pc.local_description().map(|d| d.sdp),
        Some(answer.sdp.clone())
    );
    assert!(pc.remote_description().is_some());

    pc.close()?;
    Ok(())
}

#[test]
fn test_remote_offer_feeds_ice_agent_and_starts_manager() -> Result<()> {
    init_logging();

    let mut media_engine = MediaEngine::default();
    media_engine.register_default_codecs()?;
    let pc = new_peer_connection(media_engine)?;

    pc.set_remote_description(RTCSessionDescription::offer(REMOTE_OFFER.to_owned())?)?;

    let agent = pc.network_manager().ice_agent();
    assert_eq!(agent.remote_candidates().len(), 1);
    assert_eq!(
        agent.remote_credentials(),
        Some((
            "remoteufrag".to_owned(),
            "remotepwdremotepwdremote".to_owned()
        ))
    );
    assert!(pc.network_manager().is_started());

    pc.close()?;
    Ok(())
}

#[test]
fn test_duplicate_set_remote_description_fails() -> Result<()> {
    init_logging();

    let mut media_engine = MediaEngine::default();
    media_engine.register_default_codecs()?;
    let pc = new_peer_connection(media_engine)?;

    let offer = RTCSessionDescription::offer(REMOTE_OFFER.to_owned())?;
    pc.set_remote_description(offer.clone())?;
    let before = pc.remote_description().map(|d| d.sdp);

    let err = pc.set_remote_description(offer).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidState);
    assert_eq!(pc.remote_description().map(|d| d.sdp), before);

    pc.close()?;
    Ok(())
}

#[test]
fn test_malformed_remote_description_rejected_without_mutation() -> Result<()> {
    init_logging();

    let pc = new_peer_connection(MediaEngine::default())?;

    let mut desc = RTCSessionDescription::default();
    desc.sdp_type = rtc_peer::peer_connection::sdp::RTCSdpType::Offer;
    desc.sdp = "definitely not sdp".to_owned();
    assert!(pc.set_remote_description(desc).is_err());
    assert!(pc.remote_description().is_none());
    assert_eq!(pc.signaling_state(), RTCSignalingState::Stable);

    pc.close()?;
    Ok(())
}

#[test]
fn test_bad_candidate_lines_are_tolerated() -> Result<()> {
    init_logging();

    let mut media_engine = MediaEngine::default();
    media_engine.register_default_codecs()?;
    let pc = new_peer_connection(media_engine)?;

    let offer_sdp = REMOTE_OFFER.replace(
        "a=candidate:1966762133 1 udp 2130706431 192.168.20.129 47298 typ host\r\n",
        "a=candidate:1966762133 1 udp 2130706431 192.168.20.129 47298 typ host\r\n\
         a=candidate:garbage\r\n",
    );

    pc.set_remote_description(RTCSessionDescription::offer(offer_sdp)?)?;
    assert_eq!(
        pc.network_manager().ice_agent().remote_candidates().len(),
        1
    );

    pc.close()?;
    Ok(())
}

#[test]
fn test_remote_offer_appends_recvonly_transceiver() -> Result<()> {
    init_logging();

    let mut media_engine = MediaEngine::default();
    media_engine.register_default_codecs()?;
    let pc = new_peer_connection(media_engine)?;

    pc.set_remote_description(RTCSessionDescription::offer(REMOTE_OFFER.to_owned())?)?;

    let transceivers = pc.get_transceivers();
    assert_eq!(transceivers.len(), 1);
    assert_eq!(transceivers[0].kind(), RTPCodecType::Video);
    assert_eq!(
        transceivers[0].direction(),
        RTCRtpTransceiverDirection::Recvonly
    );
    assert_eq!(transceivers[0].mid(), Some("v0"));

    pc.close()?;
    Ok(())
}

#[test]
fn test_create_answer_without_remote_description_fails() -> Result<()> {
    init_logging();

    let pc = new_peer_connection(MediaEngine::default())?;
    let err = pc.create_answer(None).map(|_| ()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidState);

    pc.close()?;
    Ok(())
}

#[test]
fn test_create_offer_rejects_options() -> Result<()> {
    init_logging();

    let pc = new_peer_connection(MediaEngine::default())?;
    let err = pc
        .create_offer(Some(Default::default()))
        .map(|_| ())
        .unwrap_err();
    assert_eq!(err, Error::ErrOfferOptionsNotSupported);

    pc.close()?;
    Ok(())
}
