//! Server certificate verification strategies
//!
//! The verifier installed on every session is picked here. `AcceptAny` is the
//! bad-certificate override used against throwaway test servers and must be
//! requested explicitly; the default validates the chain against trust anchors.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;

use rustls::client::WebPkiServerVerifier;
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::{CryptoProvider, WebPkiSupportedAlgorithms};
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{DigitallySignedStruct, RootCertStore, SignatureScheme};

use super::errors::TlsError;
use crate::config::{VerificationConfig, VerificationMode};

/// SHA-256 fingerprint of a DER certificate.
pub type Fingerprint = [u8; 32];

#[derive(Debug, Clone)]
pub enum VerificationStrategy {
    /// Accept every certificate. Handshake signatures are still checked.
    AcceptAny,
    ChainValidate { roots: Arc<RootCertStore> },
    /// Accept only end-entity certificates whose fingerprint is listed.
    PinnedIdentity { pins: Vec<Fingerprint> },
}

/// Trust anchors compare by identity: clones of one strategy are equal, two
/// separately loaded stores are not.
impl PartialEq for VerificationStrategy {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::AcceptAny, Self::AcceptAny) => true,
            (Self::ChainValidate { roots: a }, Self::ChainValidate { roots: b }) => Arc::ptr_eq(a, b),
            (Self::PinnedIdentity { pins: a }, Self::PinnedIdentity { pins: b }) => a == b,
            _ => false,
        }
    }
}

impl VerificationStrategy {
    pub fn from_config(config: &VerificationConfig) -> Result<Self, TlsError> {
        match config.mode {
            VerificationMode::AcceptAny => Ok(Self::AcceptAny),
            VerificationMode::ChainValidate => {
                let roots = load_roots(config)?;
                Ok(Self::ChainValidate {
                    roots: Arc::new(roots),
                })
            }
            VerificationMode::PinnedIdentity => {
                let pins = config
                    .pins
                    .iter()
                    .map(|pin| parse_pin(pin))
                    .collect::<Result<Vec<_>, _>>()?;
                if pins.is_empty() {
                    return Err(TlsError::InvalidPin("no pins configured".to_string()));
                }
                Ok(Self::PinnedIdentity { pins })
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::AcceptAny => "accept-any",
            Self::ChainValidate { .. } => "chain-validate",
            Self::PinnedIdentity { .. } => "pinned-identity",
        }
    }

    /// Build the rustls verifier for this strategy.
    pub fn build(
        &self,
        provider: &Arc<CryptoProvider>,
    ) -> Result<Arc<dyn ServerCertVerifier>, TlsError> {
        let algorithms = provider.signature_verification_algorithms;
        match self {
            Self::AcceptAny => Ok(Arc::new(AcceptAnyVerifier { algorithms })),
            Self::ChainValidate { roots } => {
                let verifier =
                    WebPkiServerVerifier::builder_with_provider(Arc::clone(roots), Arc::clone(provider))
                        .build()
                        .map_err(|e| TlsError::Verifier(e.to_string()))?;
                Ok(verifier)
            }
            Self::PinnedIdentity { pins } => Ok(Arc::new(PinnedVerifier {
                pins: pins.clone(),
                algorithms,
            })),
        }
    }
}

/// Parse a hex SHA-256 pin. Colon separators are allowed.
pub fn parse_pin(pin: &str) -> Result<Fingerprint, TlsError> {
    let cleaned: String = pin.chars().filter(|c| *c != ':').collect();
    let bytes = hex::decode(cleaned.trim()).map_err(|e| TlsError::InvalidPin(format!("{pin}: {e}")))?;
    bytes
        .try_into()
        .map_err(|_| TlsError::InvalidPin(format!("{pin}: expected 32 bytes")))
}

#[must_use]
pub fn fingerprint(cert: &CertificateDer<'_>) -> Fingerprint {
    let digest = ring::digest::digest(&ring::digest::SHA256, cert.as_ref());
    let mut out = [0u8; 32];
    out.copy_from_slice(digest.as_ref());
    out
}

fn load_roots(config: &VerificationConfig) -> Result<RootCertStore, TlsError> {
    let mut root_store = RootCertStore::empty();
    root_store.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

    if config.native_roots {
        let cert_result = rustls_native_certs::load_native_certs();
        for err in &cert_result.errors {
            tracing::warn!("Certificate load error: {}", err);
        }
        let (added, ignored) = root_store.add_parsable_certificates(cert_result.certs);
        tracing::debug!(added, ignored, "loaded native roots");
    }

    for path in &config.ca_files {
        add_pem_file(&mut root_store, path)?;
    }

    if root_store.is_empty() {
        return Err(TlsError::NoTrustAnchors);
    }
    Ok(root_store)
}

fn add_pem_file(root_store: &mut RootCertStore, path: &Path) -> Result<(), TlsError> {
    let mut reader = BufReader::new(File::open(path)?);
    let mut added = 0usize;
    for cert in rustls_pemfile::certs(&mut reader) {
        let cert = cert?;
        root_store
            .add(cert)
            .map_err(|e| TlsError::CertificateParsing(format!("{}: {e}", path.display())))?;
        added += 1;
    }
    if added == 0 {
        return Err(TlsError::CertificateParsing(format!(
            "{}: no certificates found",
            path.display()
        )));
    }
    tracing::debug!(path = %path.display(), added, "added CA file");
    Ok(())
}

#[derive(Debug)]
struct AcceptAnyVerifier {
    algorithms: WebPkiSupportedAlgorithms,
}

impl ServerCertVerifier for AcceptAnyVerifier {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        tracing::warn!(?server_name, "accepting any certificate");
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        rustls::crypto::verify_tls12_signature(message, cert, dss, &self.algorithms)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        rustls::crypto::verify_tls13_signature(message, cert, dss, &self.algorithms)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.algorithms.supported_schemes()
    }
}

#[derive(Debug)]
struct PinnedVerifier {
    pins: Vec<Fingerprint>,
    algorithms: WebPkiSupportedAlgorithms,
}

impl ServerCertVerifier for PinnedVerifier {
    fn verify_server_cert(
        &self,
        end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        let presented = fingerprint(end_entity);
        if self.pins.iter().any(|pin| *pin == presented) {
            tracing::debug!(?server_name, "certificate matches pin");
            return Ok(ServerCertVerified::assertion());
        }
        tracing::error!(?server_name, fingerprint = %hex::encode(presented), "certificate pin mismatch");
        Err(rustls::Error::InvalidCertificate(
            rustls::CertificateError::ApplicationVerificationFailure,
        ))
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        rustls::crypto::verify_tls12_signature(message, cert, dss, &self.algorithms)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        rustls::crypto::verify_tls13_signature(message, cert, dss, &self.algorithms)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.algorithms.supported_schemes()
    }
}
