use std::sync::mpsc::{Receiver, RecvTimeoutError, SyncSender, TryRecvError};
use std::sync::Mutex;
use std::time::Duration;

use rtp::packet::Packet;

use crate::error::{Error, Result};
use crate::media::Sample;
use crate::rtp_transceiver::rtp_codec::{RTCRtpCodec, RTPCodecType};
use crate::rtp_transceiver::{PayloadType, SSRC};

/// The media stream behind a track. Exactly one shape exists per track:
/// outbound tracks accept either samples (packetizer mode) or ready-made RTP
/// packets (raw mode), inbound tracks hand received packets to the
/// application.
pub enum TrackStream {
    Sample(SyncSender<Sample>),
    RawRtp(SyncSender<Packet>),
    Remote(Mutex<Receiver<Packet>>),
}

/// A single stream of media bound to a transceiver slot.
///
/// Local tracks are created through the peer connection's sample/raw-RTP
/// track constructors; remote tracks arrive through the on-track hook.
pub struct RTCTrack {
    pub payload_type: PayloadType,
    pub ssrc: SSRC,
    pub id: String,
    pub label: String,
    pub kind: RTPCodecType,
    pub codec: RTCRtpCodec,
    pub(crate) stream: TrackStream,
}

impl RTCTrack {
    /// Queues a media sample for packetization. Fails unless the track was
    /// created in sample mode.
    pub fn write_sample(&self, sample: Sample) -> Result<()> {
        match &self.stream {
            TrackStream::Sample(tx) => tx.send(sample).map_err(|_| Error::ErrTrackClosed),
            _ => Err(Error::ErrNotSampleTrack),
        }
    }

    /// Queues a ready-made RTP packet for forwarding. Fails unless the track
    /// was created in raw-RTP mode.
    pub fn write_rtp(&self, packet: Packet) -> Result<()> {
        match &self.stream {
            TrackStream::RawRtp(tx) => tx.send(packet).map_err(|_| Error::ErrTrackClosed),
            _ => Err(Error::ErrNotRawRTPTrack),
        }
    }

    /// Blocks until the next inbound RTP packet. Fails unless this is a
    /// remote track.
    pub fn recv(&self) -> Result<Packet> {
        match &self.stream {
            TrackStream::Remote(rx) => {
                let rx = rx.lock().map_err(|e| Error::Poison(e.to_string()))?;
                rx.recv().map_err(|_| Error::ErrTrackClosed)
            }
            _ => Err(Error::ErrNotRemoteTrack),
        }
    }

    /// Like [`recv`](Self::recv) with an upper bound on the wait.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<Packet> {
        match &self.stream {
            TrackStream::Remote(rx) => {
                let rx = rx.lock().map_err(|e| Error::Poison(e.to_string()))?;
                rx.recv_timeout(timeout).map_err(|e| match e {
                    RecvTimeoutError::Timeout => Error::ErrTimeout,
                    RecvTimeoutError::Disconnected => Error::ErrTrackClosed,
                })
            }
            _ => Err(Error::ErrNotRemoteTrack),
        }
    }

    /// Non-blocking variant of [`recv`](Self::recv).
    pub fn try_recv(&self) -> Result<Packet> {
        match &self.stream {
            TrackStream::Remote(rx) => {
                let rx = rx.lock().map_err(|e| Error::Poison(e.to_string()))?;
                rx.try_recv().map_err(|e| match e {
                    TryRecvError::Empty => Error::ErrTimeout,
                    TryRecvError::Disconnected => Error::ErrTrackClosed,
                })
            }
            _ => Err(Error::ErrNotRemoteTrack),
        }
    }
}
