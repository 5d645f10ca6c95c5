use std::sync::{PoisonError, RwLock};

use base64::{prelude::BASE64_STANDARD, Engine};
use ring::rand::{SecureRandom, SystemRandom};

pub mod candidate;
pub mod server;
pub mod url;

pub use candidate::{unmarshal_candidate, Candidate, CandidateType, RTCIceCandidateInit};
pub use server::RTCIceServer;
pub use url::{IceUrl, ProtoType, SchemeType};

/// The ICE half of the network-manager contract: local credentials, the
/// gathered local candidates and the remote candidates pushed in from
/// descriptions and trickle updates.
///
/// Candidate gathering and connectivity checks live in the external agent;
/// both candidate lists are guarded by read-write locks so enumeration can
/// run concurrently with the transport's own bookkeeping.
pub struct IceAgent {
    local_ufrag: String,
    local_pwd: String,
    urls: RwLock<Vec<IceUrl>>,
    local_candidates: RwLock<Vec<Candidate>>,
    remote_candidates: RwLock<Vec<Candidate>>,
    remote_credentials: RwLock<Option<(String, String)>>,
}

impl Default for IceAgent {
    fn default() -> Self {
        Self::new()
    }
}

impl IceAgent {
    pub(crate) fn new() -> Self {
        let rng = SystemRandom::new();

        let mut user = [0u8; 9];
        let _ = rng.fill(&mut user);
        let mut password = [0u8; 18];
        let _ = rng.fill(&mut password);

        Self {
            local_ufrag: BASE64_STANDARD.encode(&user[..]),
            local_pwd: BASE64_STANDARD.encode(&password[..]),
            urls: RwLock::new(vec![]),
            local_candidates: RwLock::new(vec![]),
            remote_candidates: RwLock::new(vec![]),
            remote_credentials: RwLock::new(None),
        }
    }

    pub fn local_ufrag(&self) -> &str {
        &self.local_ufrag
    }

    pub fn local_pwd(&self) -> &str {
        &self.local_pwd
    }

    pub(crate) fn add_url(&self, url: IceUrl) {
        self.urls
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(url);
    }

    pub fn urls(&self) -> Vec<IceUrl> {
        self.urls
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Seeds a gathered local candidate, the way the external gatherer hands
    /// its results in.
    pub fn add_local_candidate(&self, candidate: Candidate) {
        self.local_candidates
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(candidate);
    }

    pub fn local_candidates(&self) -> Vec<Candidate> {
        self.local_candidates
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn add_remote_candidate(&self, candidate: Candidate) {
        self.remote_candidates
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(candidate);
    }

    pub fn remote_candidates(&self) -> Vec<Candidate> {
        self.remote_candidates
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub(crate) fn set_remote_credentials(&self, ufrag: String, pwd: String) {
        *self
            .remote_credentials
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some((ufrag, pwd));
    }

    pub fn remote_credentials(&self) -> Option<(String, String)> {
        self.remote_credentials
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
