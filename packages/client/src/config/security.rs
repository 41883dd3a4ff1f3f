//! Security Configuration Module
//!
//! TLS parameters applied to every session: the protocol version range, the
//! session option toggles and the certificate verification policy.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::validation::{ConfigResult, ConfigurationError, Validator};

/// TLS version enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum TlsVersion {
    #[serde(rename = "1.2")]
    Tls12,
    #[default]
    #[serde(rename = "1.3")]
    Tls13,
}

impl std::fmt::Display for TlsVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TlsVersion::Tls12 => f.write_str("TLS 1.2"),
            TlsVersion::Tls13 => f.write_str("TLS 1.3"),
        }
    }
}

/// Enabled protocol version range. Only `1.3..=1.3` is accepted by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionRange {
    pub min: TlsVersion,
    pub max: TlsVersion,
}

impl Default for VersionRange {
    fn default() -> Self {
        Self::TLS13_ONLY
    }
}

impl VersionRange {
    pub const TLS13_ONLY: VersionRange = VersionRange {
        min: TlsVersion::Tls13,
        max: TlsVersion::Tls13,
    };

    #[must_use]
    pub fn contains(&self, version: TlsVersion) -> bool {
        self.min <= version && version <= self.max
    }
}

/// Session option toggles, applied in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
#[allow(clippy::struct_excessive_bools)]
pub struct SessionOptions {
    pub security: bool,
    pub handshake_as_client: bool,
    /// Allow 0-RTT. Whether early data is actually sent depends on stored
    /// resumption material and on the caller sending right after connect.
    pub enable_early_data: bool,
    /// Sessions are used from one thread; internal locking stays disabled.
    pub no_locks: bool,
    pub session_tickets: bool,
    /// Keep the shared session cache in use. Without it 0-RTT silently
    /// degrades to a full handshake.
    pub session_cache: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            security: true,
            handshake_as_client: true,
            enable_early_data: true,
            no_locks: true,
            session_tickets: true,
            session_cache: true,
        }
    }
}

/// Certificate verification policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationMode {
    /// Accept any certificate. Test fixtures only.
    AcceptAny,
    #[default]
    ChainValidate,
    PinnedIdentity,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VerificationConfig {
    pub mode: VerificationMode,
    /// Extra PEM trust anchors for `ChainValidate`.
    pub ca_files: Vec<PathBuf>,
    /// Add the platform trust store to the webpki roots.
    pub native_roots: bool,
    /// Hex SHA-256 fingerprints of accepted end-entity certificates.
    pub pins: Vec<String>,
}

impl Validator for VerificationConfig {
    fn validate(&self) -> ConfigResult<()> {
        if self.mode == VerificationMode::PinnedIdentity && self.pins.is_empty() {
            return Err(ConfigurationError::Conflict(
                "pinned identity verification requires at least one pin".to_string(),
            ));
        }
        Ok(())
    }
}
