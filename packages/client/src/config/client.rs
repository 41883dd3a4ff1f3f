//! Client settings
//!
//! Everything one two-phase session run needs, loadable from JSON and
//! overridable field by field.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::network::{ConnectFailurePolicy, IoSettings, ServerEndpoint};
use super::security::{SessionOptions, VerificationConfig, VersionRange};
use super::validation::{ConfigDefaults, ConfigResult, ConfigValidator, Validator};

/// Application payloads written in each phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Payloads {
    /// Sent after the forced handshake of the first connection.
    pub hello: String,
    /// Sent as early data right after the second connect.
    pub early_data: String,
}

impl Default for Payloads {
    fn default() -> Self {
        Self {
            hello: ConfigDefaults::HELLO_PAYLOAD.to_string(),
            early_data: ConfigDefaults::EARLY_DATA_PAYLOAD.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientSettings {
    pub endpoint: ServerEndpoint,
    pub session: SessionOptions,
    pub versions: VersionRange,
    pub verification: VerificationConfig,
    pub io: IoSettings,
    pub connect_failure: ConnectFailurePolicy,
    pub payloads: Payloads,
}

impl ClientSettings {
    /// Load settings from a JSON file. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::Io` or `ConfigurationError::Parse`.
    pub fn from_json_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    /// # Errors
    ///
    /// Returns `ConfigurationError::Parse` for malformed JSON.
    pub fn from_json_str(raw: &str) -> ConfigResult<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    #[must_use]
    pub fn with_endpoint(mut self, endpoint: ServerEndpoint) -> Self {
        self.endpoint = endpoint;
        self
    }
}

impl Validator for ClientSettings {
    fn validate(&self) -> ConfigResult<()> {
        self.endpoint.validate()?;
        self.io.validate()?;
        self.verification.validate()?;
        ConfigValidator::validate_payload(&self.payloads.hello, "hello payload")?;
        ConfigValidator::validate_payload(&self.payloads.early_data, "early data payload")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::config::{TrailingBytePolicy, VerificationMode};

    #[test]
    fn defaults_mirror_the_reference_client() {
        let settings = ClientSettings::default();
        assert_eq!(settings.payloads.hello, "hello\n\n");
        assert_eq!(settings.payloads.early_data, "0-RTT\n\n");
        assert_eq!(settings.io.recv_buffer_size, 4000);
        assert_eq!(settings.io.io_timeout_ms, None);
        assert!(!settings.io.non_blocking);
        assert_eq!(settings.connect_failure, ConnectFailurePolicy::Continue);
        assert_eq!(settings.versions, VersionRange::TLS13_ONLY);
        assert_eq!(settings.verification.mode, VerificationMode::ChainValidate);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let settings = ClientSettings::from_json_str(
            r#"{
                "endpoint": { "hostname": "example.test", "port": 4433 },
                "io": { "trailing_byte": "strip" },
                "verification": { "mode": "accept_any" }
            }"#,
        )
        .expect("parse settings");

        assert_eq!(settings.endpoint.hostname, "example.test");
        assert_eq!(settings.endpoint.ip, "127.0.0.1");
        assert_eq!(settings.endpoint.port, 4433);
        assert_eq!(settings.io.trailing_byte, TrailingBytePolicy::Strip);
        assert_eq!(settings.verification.mode, VerificationMode::AcceptAny);
        assert!(settings.session.enable_early_data);
    }

    #[test]
    fn settings_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(file, r#"{{ "connect_failure": "abort" }}"#).expect("write settings");

        let settings = ClientSettings::from_json_file(file.path()).expect("load settings");
        assert_eq!(settings.connect_failure, ConnectFailurePolicy::Abort);
    }

    #[test]
    fn empty_payload_fails_validation() {
        let mut settings = ClientSettings::default();
        settings.payloads.early_data.clear();
        assert!(settings.validate().is_err());
    }
}
