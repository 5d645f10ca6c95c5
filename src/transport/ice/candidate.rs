use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// The type of an ICE candidate per RFC 5245 section 15.1.
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq)]
pub enum CandidateType {
    #[default]
    Unspecified,

    Host,
    ServerReflexive,
    PeerReflexive,
    Relay,
}

impl fmt::Display for CandidateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            CandidateType::Host => write!(f, "host"),
            CandidateType::ServerReflexive => write!(f, "srflx"),
            CandidateType::PeerReflexive => write!(f, "prflx"),
            CandidateType::Relay => write!(f, "relay"),
            _ => write!(f, "unknown"),
        }
    }
}

/// The transport address a reflexive or relayed candidate is related to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateRelatedAddress {
    pub address: String,
    pub port: u16,
}

/// A single ICE candidate in the shape the candidate attribute line carries.
///
/// Gathering and connectivity checks happen in the external agent; this type
/// is the unit exchanged with it and with session descriptions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub foundation: String,
    pub component: u16,
    pub network: String,
    pub priority: u32,
    pub address: String,
    pub port: u16,
    pub typ: CandidateType,
    pub related_address: Option<CandidateRelatedAddress>,
}

impl Candidate {
    /// Returns the candidate attribute value per RFC 5245 section 15.1,
    /// without the leading `candidate:` key.
    pub fn marshal(&self) -> String {
        let mut val = format!(
            "{} {} {} {} {} {} typ {}",
            self.foundation,
            self.component,
            self.network,
            self.priority,
            self.address,
            self.port,
            self.typ
        );

        if let Some(related_address) = &self.related_address {
            val += format!(
                " raddr {} rport {}",
                related_address.address, related_address.port,
            )
            .as_str();
        }

        val
    }
}

impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}:{}",
            self.network, self.typ, self.address, self.port
        )
    }
}

/// Creates a candidate from its attribute form. A leading `candidate:` key
/// is tolerated so full SDP attribute lines can be fed in directly.
pub fn unmarshal_candidate(raw: &str) -> Result<Candidate> {
    let raw = raw.trim().trim_start_matches("candidate:");

    let split: Vec<&str> = raw.split_whitespace().collect();
    if split.len() < 8 {
        return Err(Error::ErrAttributeTooShortICECandidate);
    }

    let foundation = split[0].to_owned();
    let component: u16 = split[1].parse()?;
    let network = split[2].to_owned();
    let priority: u32 = split[3].parse()?;
    let address = split[4].to_owned();
    let port: u16 = split[5].parse()?;

    let typ = match split[7] {
        "host" => CandidateType::Host,
        "srflx" => CandidateType::ServerReflexive,
        "prflx" => CandidateType::PeerReflexive,
        "relay" => CandidateType::Relay,
        other => return Err(Error::ErrICECandidateTypeUnknown(other.to_owned())),
    };

    let mut related_address = None;
    if split.len() > 8 && split[8] == "raddr" {
        if split.len() < 12 {
            return Err(Error::ErrParseRelatedAddr);
        }
        related_address = Some(CandidateRelatedAddress {
            address: split[9].to_owned(),
            port: split[11].parse()?,
        });
    }

    Ok(Candidate {
        foundation,
        component,
        network,
        priority,
        address,
        port,
        typ,
        related_address,
    })
}

/// ICECandidateInit is used to serialize ice candidates over the signaling
/// channel.
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RTCIceCandidateInit {
    pub candidate: String,
    pub sdp_mid: Option<String>,
    #[serde(rename = "sdpMLineIndex")]
    pub sdp_mline_index: Option<u16>,
    pub username_fragment: Option<String>,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_candidate_marshal_unmarshal_round_trip() {
        let tests = vec![
            "1966762133 1 udp 2130706431 192.168.20.129 47298 typ host",
            "1966762134 1 tcp 1671430143 10.0.75.1 53634 typ host",
            "848194626 1 udp 1694498815 203.0.113.3 56559 typ srflx raddr 192.168.20.129 rport 56559",
            "848194627 1 udp 16777215 203.0.113.99 34567 typ relay raddr 192.168.20.129 rport 34567",
        ];

        for raw in tests {
            let candidate = unmarshal_candidate(raw).unwrap();
            assert_eq!(candidate.marshal(), raw, "round trip mismatch");
        }
    }

    #[test]
    fn test_candidate_unmarshal_with_attribute_key() {
        let candidate =
            unmarshal_candidate("candidate:4207374051 1 udp 2130706431 10.0.0.1 9999 typ host")
                .unwrap();
        assert_eq!(candidate.foundation, "4207374051");
        assert_eq!(candidate.address, "10.0.0.1");
        assert_eq!(candidate.port, 9999);
        assert_eq!(candidate.typ, CandidateType::Host);
    }

    #[test]
    fn test_candidate_unmarshal_failure() {
        let tests = vec![
            "",
            "1966762133 1 udp 2130706431 192.168.20.129",
            "1966762133 1 udp 2130706431 192.168.20.129 47298 typ tunnel",
            "1966762133 x udp 2130706431 192.168.20.129 47298 typ host",
        ];

        for raw in tests {
            assert!(unmarshal_candidate(raw).is_err(), "{raw:?} should fail");
        }
    }

    #[test]
    fn test_ice_candidate_init_serialization() {
        let tests = vec![
            (
                RTCIceCandidateInit {
                    candidate: "candidate:abc123".to_string(),
                    sdp_mid: Some("0".to_string()),
                    sdp_mline_index: Some(0),
                    username_fragment: Some("def".to_string()),
                },
                r#"{"candidate":"candidate:abc123","sdpMid":"0","sdpMLineIndex":0,"usernameFragment":"def"}"#,
            ),
            (
                RTCIceCandidateInit {
                    candidate: "candidate:abc123".to_string(),
                    sdp_mid: None,
                    sdp_mline_index: None,
                    username_fragment: None,
                },
                r#"{"candidate":"candidate:abc123","sdpMid":null,"sdpMLineIndex":null,"usernameFragment":null}"#,
            ),
        ];

        for (candidate_init, expected_string) in tests {
            let result = serde_json::to_string(&candidate_init);
            assert!(result.is_ok(), "testCase: marshal err: {result:?}");
            let candidate_data = result.unwrap();
            assert_eq!(candidate_data, expected_string, "string is not expected");

            let result = serde_json::from_str::<RTCIceCandidateInit>(&candidate_data);
            assert!(result.is_ok(), "testCase: unmarshal err: {result:?}");
            if let Ok(actual_candidate_init) = result {
                assert_eq!(actual_candidate_init, candidate_init);
            }
        }
    }
}
