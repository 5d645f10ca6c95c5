use std::time::SystemTime;

use rcgen::{CertificateParams, KeyPair};
use sha2::{Digest, Sha256};

use crate::error::{Error, Result};
use crate::transport::dtls::RTCDtlsFingerprint;
use crate::util::math_rand_alpha;

/// X.509 certificate used to authenticate the DTLS side of a peer
/// connection.
///
/// The certificate and its PKCS#8 private key are held in DER form and
/// handed to the external DTLS transport; within this crate the certificate
/// only surfaces through its expiry, its structural equality and the SHA-256
/// fingerprint advertised in session descriptions.
///
/// ## Specifications
///
/// * [W3C](https://w3c.github.io/webrtc-pc/#dom-rtccertificate)
#[derive(Debug, Clone)]
pub struct RTCCertificate {
    pub(crate) certificate: Vec<u8>,
    pub(crate) private_key_der: Vec<u8>,
    pub(crate) expires: SystemTime,
}

impl PartialEq for RTCCertificate {
    fn eq(&self, other: &Self) -> bool {
        self.certificate == other.certificate
    }
}

impl RTCCertificate {
    fn from_params(params: CertificateParams, key_pair: KeyPair) -> Result<Self> {
        let not_after = params.not_after;
        let x509_cert = params.self_signed(&key_pair)?;

        Ok(Self {
            certificate: x509_cert.der().as_ref().to_vec(),
            private_key_der: key_pair.serialize_der(),
            expires: not_after.into(),
        })
    }

    /// Builds a self-signed certificate with a random subject from the given
    /// key pair. ECDSA P-256 and Ed25519 keys are supported.
    pub fn from_key_pair(key_pair: KeyPair) -> Result<Self> {
        if !(key_pair.is_compatible(&rcgen::PKCS_ED25519)
            || key_pair.is_compatible(&rcgen::PKCS_ECDSA_P256_SHA256))
        {
            return Err(Error::Other("Unsupported key_pair".to_owned()));
        }

        RTCCertificate::from_params(CertificateParams::new(vec![math_rand_alpha(16)])?, key_pair)
    }

    /// Generates the default ECDSA P-256 certificate used when a
    /// configuration supplies none.
    pub(crate) fn generate() -> Result<Self> {
        let key_pair = KeyPair::generate_for(&rcgen::PKCS_ECDSA_P256_SHA256)?;
        RTCCertificate::from_key_pair(key_pair)
    }

    /// The instant after which this certificate must not be used.
    pub fn expires(&self) -> SystemTime {
        self.expires
    }

    /// The certificate in X.509 DER form.
    pub fn der(&self) -> &[u8] {
        &self.certificate
    }

    /// SHA-256 fingerprints of the certificate for SDP signaling.
    pub fn get_fingerprints(&self) -> Vec<RTCDtlsFingerprint> {
        let digest = Sha256::digest(&self.certificate);
        let value = digest
            .iter()
            .map(|b| format!("{b:02x}"))
            .collect::<Vec<_>>()
            .join(":");

        vec![RTCDtlsFingerprint {
            algorithm: "sha-256".to_owned(),
            value,
        }]
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_generate_certificate_expires_in_future() {
        let cert = RTCCertificate::generate().unwrap();
        assert!(cert.expires() > SystemTime::now());
        assert!(!cert.der().is_empty());
    }

    #[test]
    fn test_certificate_fingerprint_shape() {
        let cert = RTCCertificate::generate().unwrap();
        let fingerprints = cert.get_fingerprints();
        assert_eq!(fingerprints.len(), 1);
        assert_eq!(fingerprints[0].algorithm, "sha-256");
        // 32 hex byte pairs joined by colons
        assert_eq!(fingerprints[0].value.len(), 32 * 3 - 1);
    }

    #[test]
    fn test_certificate_equality() {
        let a = RTCCertificate::generate().unwrap();
        let b = RTCCertificate::generate().unwrap();
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
    }

    #[test]
    fn test_from_key_pair_ed25519() {
        let key_pair = KeyPair::generate_for(&rcgen::PKCS_ED25519).unwrap();
        assert!(RTCCertificate::from_key_pair(key_pair).is_ok());
    }
}
