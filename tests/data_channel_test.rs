use std::sync::mpsc::channel;
use std::time::Duration;

use anyhow::Result;
use bytes::Bytes;

use rtc_peer::data_channel::{RTCDataChannelInit, RTCDataChannelState, RTCPriorityType};
use rtc_peer::error::{Error, ErrorKind};
use rtc_peer::peer_connection::configuration::media_engine::MediaEngine;
use rtc_peer::peer_connection::configuration::{RTCConfiguration, RTCConfigurationBuilder};
use rtc_peer::peer_connection::sdp::session_description::RTCSessionDescription;
use rtc_peer::transport::{DataChannelEvent, Transmit};
use rtc_peer::RTCPeerConnection;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

const REMOTE_OFFER: &str = "v=0\r\n\
o=- 884499 2 IN IP4 127.0.0.1\r\n\
s=-\r\n\
t=0 0\r\n\
m=application 9 DTLS/SCTP 5000\r\n\
c=IN IP4 0.0.0.0\r\n\
a=setup:actpass\r\n\
a=mid:d0\r\n\
a=ice-ufrag:remoteufrag\r\n\
a=ice-pwd:remotepwdremotepwdremote\r\n\
a=sctpmap:5000 webrtc-datachannel 1024\r\n";

#[test]
fn test_create_data_channel_defaults() -> Result<()> {
    init_logging();

    let pc = RTCPeerConnection::new(RTCConfiguration::default())?;
    let channel = pc.create_data_channel("data", None)?;

    assert_eq!(channel.label(), "data");
    assert!(channel.ordered());
    assert_eq!(channel.protocol(), "");
    assert!(!channel.negotiated());
    assert_eq!(channel.max_packet_life_time(), None);
    assert_eq!(channel.max_retransmits(), None);
    assert_eq!(channel.priority(), RTCPriorityType::Low);
    assert_eq!(channel.ready_state(), RTCDataChannelState::Connecting);
    assert_eq!(channel.buffered_amount(), 0);
    assert_eq!(channel.id(), 0);

    pc.close()?;
    Ok(())
}

#[test]
fn test_create_data_channel_options_round_trip() -> Result<()> {
    init_logging();

    let pc = RTCPeerConnection::new(RTCConfiguration::default())?;
    let channel = pc.create_data_channel(
        "chat",
        Some(RTCDataChannelInit {
            ordered: Some(false),
            max_retransmits: Some(5),
            protocol: Some("prot".to_owned()),
            negotiated: Some(true),
            id: Some(66),
            priority: Some(RTCPriorityType::High),
            ..Default::default()
        }),
    )?;

    assert_eq!(channel.label(), "chat");
    assert!(!channel.ordered());
    assert_eq!(channel.max_retransmits(), Some(5));
    assert_eq!(channel.protocol(), "prot");
    assert!(channel.negotiated());
    assert_eq!(channel.id(), 66);
    assert_eq!(channel.priority(), RTCPriorityType::High);

    pc.close()?;
    Ok(())
}

#[test]
fn test_create_data_channel_validation() -> Result<()> {
    init_logging();

    let pc = RTCPeerConnection::new(RTCConfiguration::default())?;

    let long_label = "x".repeat(65536);
    let err = pc
        .create_data_channel(&long_label, None)
        .map(|_| ())
        .unwrap_err();
    assert_eq!(err, Error::ErrStringSizeLimit);
    assert_eq!(err.kind(), ErrorKind::Type);

    let err = pc
        .create_data_channel(
            "data",
            Some(RTCDataChannelInit {
                negotiated: Some(true),
                ..Default::default()
            }),
        )
        .map(|_| ())
        .unwrap_err();
    assert_eq!(err, Error::ErrNegotiatedWithoutID);

    let err = pc
        .create_data_channel(
            "data",
            Some(RTCDataChannelInit {
                max_packet_life_time: Some(1000),
                max_retransmits: Some(5),
                ..Default::default()
            }),
        )
        .map(|_| ())
        .unwrap_err();
    assert_eq!(err, Error::ErrRetransmitsOrPacketLifeTime);

    pc.close()?;
    Ok(())
}

#[test]
fn test_data_channel_id_parity() -> Result<()> {
    init_logging();

    // The offering side allocates even ids.
    let offerer = RTCPeerConnection::new(RTCConfiguration::default())?;
    let first = offerer.create_data_channel("a", None)?;
    let second = offerer.create_data_channel("b", None)?;
    assert_eq!(first.id(), 0);
    assert_eq!(second.id(), 2);

    // A connection that applied a remote offer answers, and allocates odd
    // ids.
    let mut media_engine = MediaEngine::default();
    media_engine.register_default_codecs()?;
    let answerer = RTCPeerConnection::new(
        RTCConfigurationBuilder::new()
            .with_media_engine(media_engine)
            .build(),
    )?;
    answerer.set_remote_description(RTCSessionDescription::offer(REMOTE_OFFER.to_owned())?)?;
    let first = answerer.create_data_channel("a", None)?;
    let second = answerer.create_data_channel("b", None)?;
    assert_eq!(first.id(), 1);
    assert_eq!(second.id(), 3);

    offerer.close()?;
    answerer.close()?;
    Ok(())
}

#[test]
fn test_data_channel_id_exhaustion() -> Result<()> {
    init_logging();

    let pc = RTCPeerConnection::new(RTCConfiguration::default())?;
    pc.sctp_transport().set_max_channels(4);

    assert_eq!(pc.create_data_channel("a", None)?.id(), 0);
    assert_eq!(pc.create_data_channel("b", None)?.id(), 2);

    let err = pc.create_data_channel("c", None).map(|_| ()).unwrap_err();
    assert_eq!(err, Error::ErrNoAvailableDataChannelID);
    assert_eq!(err.kind(), ErrorKind::Operation);

    pc.close()?;
    Ok(())
}

#[test]
fn test_inbound_channel_created_event() -> Result<()> {
    init_logging();

    let pc = RTCPeerConnection::new(RTCConfiguration::default())?;

    let (channel_tx, channel_rx) = channel();
    pc.on_data_channel(Box::new(move |channel| {
        let _ = channel_tx.send(channel);
    }));

    pc.network_manager()
        .deliver_data_channel_event(DataChannelEvent::Created {
            stream_id: 1,
            label: "inbound".to_owned(),
        });

    let channel = channel_rx.recv_timeout(DEFAULT_TIMEOUT)?;
    assert_eq!(channel.label(), "inbound");
    assert_eq!(channel.id(), 1);
    assert_eq!(channel.ready_state(), RTCDataChannelState::Open);

    pc.close()?;
    Ok(())
}

#[test]
fn test_inbound_message_dispatch() -> Result<()> {
    init_logging();

    let pc = RTCPeerConnection::new(RTCConfiguration::default())?;

    let (channel_tx, channel_rx) = channel();
    pc.on_data_channel(Box::new(move |channel| {
        let _ = channel_tx.send(channel);
    }));

    pc.network_manager()
        .deliver_data_channel_event(DataChannelEvent::Created {
            stream_id: 1,
            label: "inbound".to_owned(),
        });
    let data_channel = channel_rx.recv_timeout(DEFAULT_TIMEOUT)?;

    let (message_tx, message_rx) = channel();
    data_channel.on_message(Box::new(move |message| {
        let _ = message_tx.send(message);
    }));

    pc.network_manager()
        .deliver_data_channel_event(DataChannelEvent::Message {
            stream_id: 1,
            is_string: true,
            payload: Bytes::from_static(b"hello"),
        });

    let message = message_rx.recv_timeout(DEFAULT_TIMEOUT)?;
    assert!(message.is_string);
    assert_eq!(&message.data[..], b"hello");

    // Messages for unknown streams are dropped without side effects.
    pc.network_manager()
        .deliver_data_channel_event(DataChannelEvent::Message {
            stream_id: 9,
            is_string: false,
            payload: Bytes::from_static(b"void"),
        });

    pc.close()?;
    Ok(())
}

#[test]
fn test_channel_open_sweep_sends_dcep_open() -> Result<()> {
    init_logging();

    let pc = RTCPeerConnection::new(RTCConfiguration::default())?;
    let data_channel = pc.create_data_channel("announce", None)?;
    assert_eq!(data_channel.ready_state(), RTCDataChannelState::Connecting);

    let (open_tx, open_rx) = channel();
    data_channel.on_open(Box::new(move || {
        let _ = open_tx.send(());
    }));

    pc.network_manager()
        .deliver_data_channel_event(DataChannelEvent::Open);

    open_rx.recv_timeout(DEFAULT_TIMEOUT)?;
    assert_eq!(data_channel.ready_state(), RTCDataChannelState::Open);

    match pc.network_manager().poll_transmit() {
        Some(Transmit::DataChannel { stream_id, payload }) => {
            assert_eq!(stream_id, data_channel.id());
            // DCEP DATA_CHANNEL_OPEN message type
            assert_eq!(payload[0], 0x03);
        }
        other => panic!("expected a dcep open transmit, got {other:?}"),
    }

    pc.close()?;
    Ok(())
}

#[test]
fn test_send_requires_open_state_and_counts_buffered_bytes() -> Result<()> {
    init_logging();

    let pc = RTCPeerConnection::new(RTCConfiguration::default())?;
    let data_channel = pc.create_data_channel("bytes", None)?;

    let err = data_channel.send(Bytes::from_static(b"early")).unwrap_err();
    assert_eq!(err, Error::ErrDataChannelNotOpen);

    pc.network_manager()
        .deliver_data_channel_event(DataChannelEvent::Open);
    // drain the DCEP open transmit
    assert!(pc.network_manager().poll_transmit().is_some());

    data_channel.send(Bytes::from_static(b"hello"))?;
    data_channel.send_text("world!")?;
    assert_eq!(data_channel.buffered_amount(), 11);

    match pc.network_manager().poll_transmit() {
        Some(Transmit::DataChannel { payload, .. }) => assert_eq!(&payload[..], b"hello"),
        other => panic!("expected data transmit, got {other:?}"),
    }

    pc.close()?;
    Ok(())
}
