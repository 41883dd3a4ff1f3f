//! Configuration
//!
//! Serializable settings for the endpoint, the TLS session parameters, the
//! verification policy and the socket read path.

pub mod client;
pub mod network;
pub mod security;
pub mod validation;

pub use client::{ClientSettings, Payloads};
pub use network::{ConnectFailurePolicy, IoSettings, ServerEndpoint, TrailingBytePolicy};
pub use security::{SessionOptions, TlsVersion, VerificationConfig, VerificationMode, VersionRange};
pub use validation::{ConfigDefaults, ConfigResult, ConfigValidator, ConfigurationError, Validator};
