//! TLS-specific error types

use std::fmt;

/// Session option whose application was refused during configuration.
///
/// Disabling early data, session tickets or the session cache is never
/// refused; those settings only turn resumption off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOption {
    /// Hostname binding for SNI and identity matching
    Url,
    Security,
    HandshakeAsClient,
    Locking,
    CertificateVerifier,
}

impl fmt::Display for SessionOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SessionOption::Url => "url",
            SessionOption::Security => "security",
            SessionOption::HandshakeAsClient => "handshake-as-client",
            SessionOption::Locking => "locking",
            SessionOption::CertificateVerifier => "certificate verifier",
        })
    }
}

/// Which configuration step failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigureKind {
    ImportFailed,
    OptionSetFailed(SessionOption),
    VersionRangeRejected,
}

impl fmt::Display for ConfigureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigureKind::ImportFailed => f.write_str("import into TLS layer failed"),
            ConfigureKind::OptionSetFailed(option) => write!(f, "error setting {option} option"),
            ConfigureKind::VersionRangeRejected => f.write_str("version range rejected"),
        }
    }
}

/// Errors raised while building verifiers and client configurations.
#[derive(Debug, thiserror::Error)]
pub enum TlsError {
    #[error("Certificate parsing failed: {0}")]
    CertificateParsing(String),
    #[error("Certificate pin mismatch: {0}")]
    PinMismatch(String),
    #[error("Invalid certificate pin: {0}")]
    InvalidPin(String),
    #[error("No trust anchors available")]
    NoTrustAnchors,
    #[error("Session option refused: {0}")]
    OptionRefused(SessionOption),
    #[error("Unsupported protocol version range {min}..={max}")]
    UnsupportedVersions { min: String, max: String },
    #[error("Invalid server name: {0}")]
    InvalidServerName(String),
    #[error("Socket is not a stream socket")]
    NotAStream,
    #[error("Engine busy: {0} session(s) still alive")]
    Busy(usize),
    #[error("Crypto provider has no TLS 1.3 cipher suites")]
    NoTls13Suites,
    #[error("Verifier construction failed: {0}")]
    Verifier(String),
    #[error("TLS error: {0}")]
    Rustls(#[from] rustls::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
