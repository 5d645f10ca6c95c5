use std::num::ParseIntError;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Coarse error taxonomy mirroring the DOMException names the W3C WebRTC
/// specification assigns to peer-connection failures.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidState,
    InvalidModification,
    InvalidAccess,
    Type,
    Operation,
    Unknown,
}

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("connection closed")]
    ErrConnectionClosed,
    #[error("invalid proposed signaling state transition: {0}")]
    ErrSignalingStateProposedTransitionInvalid(String),
    #[error("can't rollback from stable state")]
    ErrSignalingStateCannotRollback,
    #[error("data channel is not open")]
    ErrDataChannelNotOpen,
    #[error("track channel closed")]
    ErrTrackClosed,
    #[error("i/o timeout")]
    ErrTimeout,

    #[error("peer identity cannot be modified")]
    ErrModifyingPeerIdentity,
    #[error("certificates cannot be modified")]
    ErrModifyingCertificates,
    #[error("bundle policy cannot be modified")]
    ErrModifyingBundlePolicy,
    #[error("rtcp mux policy cannot be modified")]
    ErrModifyingRtcpMuxPolicy,
    #[error("ice candidate pool size cannot be modified once a local description is set")]
    ErrModifyingICECandidatePoolSize,

    #[error("certificate expired")]
    ErrCertificateExpired,
    #[error("track already attached to a sender")]
    ErrExistingTrack,
    #[error("turn server credentials required")]
    ErrNoTurnCredentials,
    #[error("codec not found for payload type")]
    ErrCodecNotFound,
    #[error("codec payloader not set")]
    ErrPayloaderNotSet,
    #[error("track is not a sample track")]
    ErrNotSampleTrack,
    #[error("track is not a raw RTP track")]
    ErrNotRawRTPTrack,
    #[error("track is not a remote track")]
    ErrNotRemoteTrack,
    #[error("transceiver direction does not allow a sending track")]
    ErrRTPTransceiverSetSendingInvalidState,

    #[error("string exceeds the 65535 byte limit")]
    ErrStringSizeLimit,
    #[error("negotiated data channel requires an id")]
    ErrNegotiatedWithoutID,
    #[error("cannot set both max packet life time and max retransmits")]
    ErrRetransmitsOrPacketLifeTime,
    #[error("data channel id greater than the maximum")]
    ErrMaxDataChannelID,
    #[error("raw RTP track requires a non-zero SSRC")]
    ErrRawTrackSSRCZero,
    #[error("ice server has no urls")]
    ErrICEServerNoURLs,
    #[error("unknown ice url scheme")]
    ErrSchemeType,
    #[error("invalid ice url host")]
    ErrHost,
    #[error("invalid ice url port")]
    ErrPort,
    #[error("invalid ice url transport")]
    ErrProtoType,
    #[error("attribute too short for an ice candidate")]
    ErrAttributeTooShortICECandidate,
    #[error("unknown ice candidate type: {0}")]
    ErrICECandidateTypeUnknown(String),
    #[error("related address incomplete in ice candidate")]
    ErrParseRelatedAddr,
    #[error("dcep message too short")]
    ErrDCEPMessageTooShort,
    #[error("unexpected dcep message type: {0}")]
    ErrDCEPInvalidMessageType(u8),

    #[error("no available data channel id below the SCTP maximum")]
    ErrNoAvailableDataChannelID,

    #[error("offer options are not supported")]
    ErrOfferOptionsNotSupported,
    #[error("answer options are not supported")]
    ErrAnswerOptionsNotSupported,
    #[error("identity provider is not supported")]
    ErrIdentityProviderNotSupported,

    #[error("sdp: {0}")]
    Sdp(#[from] sdp::Error),
    #[error("rcgen: {0}")]
    Rcgen(#[from] rcgen::Error),
    #[error("parse int: {0}")]
    ParseInt(#[from] ParseIntError),
    #[error("mutex poison: {0}")]
    Poison(String),
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Maps the error onto the DOMException-style kind the W3C specification
    /// prescribes for the failing operation.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::ErrConnectionClosed
            | Error::ErrSignalingStateProposedTransitionInvalid(_)
            | Error::ErrSignalingStateCannotRollback
            | Error::ErrDataChannelNotOpen
            | Error::ErrTrackClosed => ErrorKind::InvalidState,

            Error::ErrModifyingPeerIdentity
            | Error::ErrModifyingCertificates
            | Error::ErrModifyingBundlePolicy
            | Error::ErrModifyingRtcpMuxPolicy
            | Error::ErrModifyingICECandidatePoolSize => ErrorKind::InvalidModification,

            Error::ErrCertificateExpired
            | Error::ErrExistingTrack
            | Error::ErrNoTurnCredentials
            | Error::ErrCodecNotFound
            | Error::ErrPayloaderNotSet
            | Error::ErrNotSampleTrack
            | Error::ErrNotRawRTPTrack
            | Error::ErrNotRemoteTrack
            | Error::ErrRTPTransceiverSetSendingInvalidState => ErrorKind::InvalidAccess,

            Error::ErrStringSizeLimit
            | Error::ErrNegotiatedWithoutID
            | Error::ErrRetransmitsOrPacketLifeTime
            | Error::ErrMaxDataChannelID
            | Error::ErrRawTrackSSRCZero
            | Error::ErrICEServerNoURLs
            | Error::ErrSchemeType
            | Error::ErrHost
            | Error::ErrPort
            | Error::ErrProtoType
            | Error::ErrAttributeTooShortICECandidate
            | Error::ErrICECandidateTypeUnknown(_)
            | Error::ErrParseRelatedAddr
            | Error::ErrDCEPMessageTooShort
            | Error::ErrDCEPInvalidMessageType(_)
            | Error::ParseInt(_) => ErrorKind::Type,

            Error::ErrNoAvailableDataChannelID => ErrorKind::Operation,

            _ => ErrorKind::Unknown,
        }
    }
}

impl PartialEq for Error {
    fn eq(&self, other: &Self) -> bool {
        self.to_string() == other.to_string()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_error_kind() {
        let tests = vec![
            (Error::ErrConnectionClosed, ErrorKind::InvalidState),
            (
                Error::ErrModifyingBundlePolicy,
                ErrorKind::InvalidModification,
            ),
            (Error::ErrCertificateExpired, ErrorKind::InvalidAccess),
            (Error::ErrExistingTrack, ErrorKind::InvalidAccess),
            (Error::ErrStringSizeLimit, ErrorKind::Type),
            (Error::ErrRetransmitsOrPacketLifeTime, ErrorKind::Type),
            (Error::ErrNoAvailableDataChannelID, ErrorKind::Operation),
            (Error::Other("key generation".to_owned()), ErrorKind::Unknown),
        ];

        for (err, expected_kind) in tests {
            assert_eq!(err.kind(), expected_kind, "{err}");
        }
    }
}
