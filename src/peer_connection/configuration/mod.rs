use crate::peer_connection::certificate::RTCCertificate;
pub use crate::transport::ice::server::RTCIceServer;

pub(crate) mod bundle_policy;
pub(crate) mod ice_transport_policy;
pub mod media_engine;
pub(crate) mod offer_answer_options;
pub(crate) mod rtcp_mux_policy;

pub use bundle_policy::RTCBundlePolicy;
pub use ice_transport_policy::RTCIceTransportPolicy;
pub use offer_answer_options::{RTCAnswerOptions, RTCOfferOptions};
pub use rtcp_mux_policy::RTCRtcpMuxPolicy;

use media_engine::MediaEngine;

pub(crate) const UNSPECIFIED_STR: &str = "Unspecified";

/// A Configuration defines how peer-to-peer communication via a
/// PeerConnection is established or re-established.
///
/// Policy enums and the candidate pool size default to their unspecified
/// values here; the peer connection overlays the W3C defaults at
/// construction time, so `get_configuration` snapshots always carry concrete
/// values.
///
/// ## Specifications
///
/// * [W3C](https://w3c.github.io/webrtc-pc/#rtcconfiguration-dictionary)
#[derive(Default, Clone)]
pub struct RTCConfiguration {
    /// Servers available to the ICE agent, such as STUN and TURN servers.
    pub ice_servers: Vec<RTCIceServer>,

    /// Which candidates the ICE agent is allowed to use.
    pub ice_transport_policy: RTCIceTransportPolicy,

    /// Which media-bundling policy to use when gathering ICE candidates.
    pub bundle_policy: RTCBundlePolicy,

    /// Which rtcp-mux policy to use when gathering ICE candidates.
    pub rtcp_mux_policy: RTCRtcpMuxPolicy,

    /// The target peer identity. The connection will not establish unless it
    /// can be successfully authenticated with the provided name.
    pub peer_identity: String,

    /// Certificates the connection authenticates with. When empty, one
    /// ECDSA P-256 certificate is generated at construction time.
    pub certificates: Vec<RTCCertificate>,

    /// Size of the prefetched ICE candidate pool.
    pub ice_candidate_pool_size: u8,

    /// The codec registry this connection negotiates with. Immutable once
    /// the connection is constructed.
    pub media_engine: MediaEngine,
}

/// Builder for [`RTCConfiguration`].
#[derive(Default)]
pub struct RTCConfigurationBuilder {
    configuration: RTCConfiguration,
}

impl RTCConfigurationBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ice_servers(mut self, ice_servers: Vec<RTCIceServer>) -> Self {
        self.configuration.ice_servers = ice_servers;
        self
    }

    pub fn with_ice_transport_policy(
        mut self,
        ice_transport_policy: RTCIceTransportPolicy,
    ) -> Self {
        self.configuration.ice_transport_policy = ice_transport_policy;
        self
    }

    pub fn with_bundle_policy(mut self, bundle_policy: RTCBundlePolicy) -> Self {
        self.configuration.bundle_policy = bundle_policy;
        self
    }

    pub fn with_rtcp_mux_policy(mut self, rtcp_mux_policy: RTCRtcpMuxPolicy) -> Self {
        self.configuration.rtcp_mux_policy = rtcp_mux_policy;
        self
    }

    pub fn with_peer_identity(mut self, peer_identity: String) -> Self {
        self.configuration.peer_identity = peer_identity;
        self
    }

    pub fn with_certificates(mut self, certificates: Vec<RTCCertificate>) -> Self {
        self.configuration.certificates = certificates;
        self
    }

    pub fn with_ice_candidate_pool_size(mut self, ice_candidate_pool_size: u8) -> Self {
        self.configuration.ice_candidate_pool_size = ice_candidate_pool_size;
        self
    }

    pub fn with_media_engine(mut self, media_engine: MediaEngine) -> Self {
        self.configuration.media_engine = media_engine;
        self
    }

    pub fn build(self) -> RTCConfiguration {
        self.configuration
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_configuration_builder() {
        let cfg = RTCConfigurationBuilder::new()
            .with_ice_servers(vec![RTCIceServer {
                urls: vec!["stun:stun.l.google.com:19302".to_owned()],
                ..Default::default()
            }])
            .with_bundle_policy(RTCBundlePolicy::MaxBundle)
            .with_ice_candidate_pool_size(5)
            .build();

        assert_eq!(cfg.ice_servers.len(), 1);
        assert_eq!(cfg.bundle_policy, RTCBundlePolicy::MaxBundle);
        assert_eq!(cfg.ice_candidate_pool_size, 5);
        assert_eq!(cfg.rtcp_mux_policy, RTCRtcpMuxPolicy::Unspecified);
    }
}
