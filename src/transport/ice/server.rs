use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::transport::ice::url::{IceUrl, SchemeType};

/// Describes a single STUN or TURN server that can be used by the ICE agent.
///
/// ## Specifications
///
/// * [W3C](https://w3c.github.io/webrtc-pc/#rtciceserver-dictionary)
#[derive(Default, Debug, Clone, Serialize, Deserialize)]
pub struct RTCIceServer {
    pub urls: Vec<String>,
    pub username: String,
    pub credential: String,
}

impl RTCIceServer {
    /// Parses every configured URL, enforcing that TURN servers come with
    /// credentials.
    pub(crate) fn parse_urls(&self) -> Result<Vec<IceUrl>> {
        let mut urls = Vec::with_capacity(self.urls.len());

        for raw_url in &self.urls {
            let url = IceUrl::parse_url(raw_url)?;

            if (url.scheme == SchemeType::Turn || url.scheme == SchemeType::Turns)
                && (self.username.is_empty() || self.credential.is_empty())
            {
                return Err(Error::ErrNoTurnCredentials);
            }

            urls.push(url);
        }

        Ok(urls)
    }

    /// Validates the server entry without keeping the parse result.
    pub(crate) fn validate(&self) -> Result<()> {
        if self.urls.is_empty() {
            return Err(Error::ErrICEServerNoURLs);
        }
        self.parse_urls().map(|_| ())
    }
}
