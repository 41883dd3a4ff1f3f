//! Network Configuration Module
//!
//! Target endpoint and socket I/O behaviour for a connection lifecycle.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::validation::{ConfigResult, ConfigValidator, ConfigurationError, Validator};

/// Server endpoint, immutable for the lifetime of a session run.
///
/// The hostname is only used for TLS identity binding (SNI and certificate
/// matching). The socket connects to the literal `ip`, so the two may differ.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerEndpoint {
    pub hostname: String,
    pub ip: String,
    pub port: u16,
}

impl Default for ServerEndpoint {
    fn default() -> Self {
        Self {
            hostname: "localhost".to_string(),
            ip: "127.0.0.1".to_string(),
            port: 9913,
        }
    }
}

impl ServerEndpoint {
    #[must_use]
    pub fn new(hostname: impl Into<String>, ip: impl Into<String>, port: u16) -> Self {
        Self {
            hostname: hostname.into(),
            ip: ip.into(),
            port,
        }
    }
}

impl std::fmt::Display for ServerEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}:{})", self.hostname, self.ip, self.port)
    }
}

impl Validator for ServerEndpoint {
    fn validate(&self) -> ConfigResult<()> {
        if self.hostname.trim().is_empty() {
            return Err(ConfigurationError::InvalidAddress(
                "hostname cannot be empty".to_string(),
            ));
        }
        if self.ip.trim().is_empty() {
            return Err(ConfigurationError::InvalidAddress(
                "ip cannot be empty".to_string(),
            ));
        }
        ConfigValidator::validate_range(self.port, 1, u16::MAX, "port")
    }
}

/// What to do when the blocking TCP connect reports a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectFailurePolicy {
    /// Log the failure and still attempt the handshake or early-data send.
    /// The following TLS step fails on its own if the socket never connected.
    #[default]
    Continue,
    /// Stop with a `Connect` error.
    Abort,
}

/// How the final received byte of a response is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrailingBytePolicy {
    /// All N received bytes are payload.
    #[default]
    Keep,
    /// Drop the last received byte (N bytes yield N-1).
    Strip,
}

/// Socket and read-path settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IoSettings {
    /// Open sockets in non-blocking mode. Every operation of the client still
    /// waits for completion.
    pub non_blocking: bool,
    /// Upper bound for poll, send and receive. `None` waits forever.
    pub io_timeout_ms: Option<u64>,
    pub recv_buffer_size: usize,
    pub trailing_byte: TrailingBytePolicy,
}

impl Default for IoSettings {
    fn default() -> Self {
        Self {
            non_blocking: false,
            io_timeout_ms: None,
            recv_buffer_size: super::ConfigDefaults::RECV_BUFFER_SIZE,
            trailing_byte: TrailingBytePolicy::Keep,
        }
    }
}

impl IoSettings {
    #[must_use]
    pub fn io_timeout(&self) -> Option<Duration> {
        self.io_timeout_ms.map(Duration::from_millis)
    }
}

impl Validator for IoSettings {
    fn validate(&self) -> ConfigResult<()> {
        ConfigValidator::validate_buffer_size(self.recv_buffer_size, "recv_buffer_size")?;
        if let Some(timeout) = self.io_timeout() {
            ConfigValidator::validate_timeout(timeout, "io_timeout")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_endpoint_is_valid() {
        assert!(ServerEndpoint::default().validate().is_ok());
    }

    #[test]
    fn port_zero_is_rejected() {
        let endpoint = ServerEndpoint::new("localhost", "127.0.0.1", 0);
        assert!(matches!(
            endpoint.validate(),
            Err(ConfigurationError::InvalidParameter(_))
        ));
    }

    #[test]
    fn blank_hostname_is_rejected() {
        let endpoint = ServerEndpoint::new("  ", "127.0.0.1", 443);
        assert!(matches!(
            endpoint.validate(),
            Err(ConfigurationError::InvalidAddress(_))
        ));
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let io = IoSettings {
            io_timeout_ms: Some(0),
            ..IoSettings::default()
        };
        assert!(matches!(io.validate(), Err(ConfigurationError::InvalidTimeout(_))));
    }
}
