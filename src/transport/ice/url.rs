use std::fmt;

use crate::error::{Error, Result};

/// Scheme of an ICE server URL per RFC 7064 / RFC 7065.
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq)]
pub enum SchemeType {
    #[default]
    Unspecified,

    Stun,
    Stuns,
    Turn,
    Turns,
}

impl From<&str> for SchemeType {
    fn from(raw: &str) -> Self {
        match raw {
            "stun" => SchemeType::Stun,
            "stuns" => SchemeType::Stuns,
            "turn" => SchemeType::Turn,
            "turns" => SchemeType::Turns,
            _ => SchemeType::Unspecified,
        }
    }
}

impl fmt::Display for SchemeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            SchemeType::Stun => write!(f, "stun"),
            SchemeType::Stuns => write!(f, "stuns"),
            SchemeType::Turn => write!(f, "turn"),
            SchemeType::Turns => write!(f, "turns"),
            _ => write!(f, "unknown"),
        }
    }
}

/// Transport protocol carried in the `?transport=` query of TURN URLs.
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq)]
pub enum ProtoType {
    #[default]
    Udp,
    Tcp,
}

impl fmt::Display for ProtoType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            ProtoType::Udp => write!(f, "udp"),
            ProtoType::Tcp => write!(f, "tcp"),
        }
    }
}

/// A parsed STUN/TURN server URL as registered with the network manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IceUrl {
    pub scheme: SchemeType,
    pub host: String,
    pub port: u16,
    pub proto: ProtoType,
}

impl fmt::Display for IceUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.scheme, self.host, self.port)
    }
}

impl IceUrl {
    pub fn is_secure(&self) -> bool {
        self.scheme == SchemeType::Stuns || self.scheme == SchemeType::Turns
    }

    /// Parses a raw ICE server URL of the form
    /// `scheme:host[:port][?transport=udp|tcp]`.
    pub fn parse_url(raw: &str) -> Result<IceUrl> {
        let (scheme_str, rest) = raw.split_once(':').ok_or(Error::ErrSchemeType)?;
        let scheme = SchemeType::from(scheme_str);
        if scheme == SchemeType::Unspecified {
            return Err(Error::ErrSchemeType);
        }

        let (authority, query) = match rest.split_once('?') {
            Some((authority, query)) => (authority, Some(query)),
            None => (rest, None),
        };

        let mut proto = match scheme {
            SchemeType::Stuns | SchemeType::Turns => ProtoType::Tcp,
            _ => ProtoType::Udp,
        };
        if let Some(query) = query {
            proto = match query.strip_prefix("transport=") {
                Some("udp") => ProtoType::Udp,
                Some("tcp") => ProtoType::Tcp,
                _ => return Err(Error::ErrProtoType),
            };
        }

        // IPv6 literals keep their brackets in the authority part.
        let (host, port_str) = if let Some(stripped) = authority.strip_prefix('[') {
            let (host, after) = stripped.split_once(']').ok_or(Error::ErrHost)?;
            (host, after.strip_prefix(':'))
        } else {
            match authority.rsplit_once(':') {
                Some((host, port)) => (host, Some(port)),
                None => (authority, None),
            }
        };

        if host.is_empty() {
            return Err(Error::ErrHost);
        }

        let port = match port_str {
            Some(port) => port.parse::<u16>().map_err(|_| Error::ErrPort)?,
            None => match scheme {
                SchemeType::Stun | SchemeType::Turn => 3478,
                _ => 5349,
            },
        };

        Ok(IceUrl {
            scheme,
            host: host.to_owned(),
            port,
            proto,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_parse_url_success() {
        let tests = vec![
            (
                "stun:google.de",
                SchemeType::Stun,
                "google.de",
                3478,
                ProtoType::Udp,
            ),
            (
                "stun:google.de:6666",
                SchemeType::Stun,
                "google.de",
                6666,
                ProtoType::Udp,
            ),
            (
                "stuns:google.de",
                SchemeType::Stuns,
                "google.de",
                5349,
                ProtoType::Tcp,
            ),
            (
                "turn:google.de",
                SchemeType::Turn,
                "google.de",
                3478,
                ProtoType::Udp,
            ),
            (
                "turn:google.de:1234?transport=tcp",
                SchemeType::Turn,
                "google.de",
                1234,
                ProtoType::Tcp,
            ),
            (
                "turns:google.de?transport=udp",
                SchemeType::Turns,
                "google.de",
                5349,
                ProtoType::Udp,
            ),
            (
                "stun:[::1]:123",
                SchemeType::Stun,
                "::1",
                123,
                ProtoType::Udp,
            ),
        ];

        for (raw, scheme, host, port, proto) in tests {
            let url = IceUrl::parse_url(raw).unwrap();
            assert_eq!(url.scheme, scheme, "{raw} scheme");
            assert_eq!(url.host, host, "{raw} host");
            assert_eq!(url.port, port, "{raw} port");
            assert_eq!(url.proto, proto, "{raw} proto");
        }
    }

    #[test]
    fn test_parse_url_failure() {
        let tests = vec![
            ("", Error::ErrSchemeType),
            ("google.de", Error::ErrSchemeType),
            ("ftp:google.de", Error::ErrSchemeType),
            ("stun:", Error::ErrHost),
            ("stun:google.de:port", Error::ErrPort),
            ("turn:google.de?trans=udp", Error::ErrProtoType),
            ("turns:google.de?transport=ftp", Error::ErrProtoType),
        ];

        for (raw, expected) in tests {
            let err = IceUrl::parse_url(raw).unwrap_err();
            assert_eq!(err, expected, "{raw}");
        }
    }
}
