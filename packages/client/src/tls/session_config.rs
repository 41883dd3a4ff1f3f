//! TLS session configuration
//!
//! Turns an open transport socket into a TLS client session. Each step can
//! fail on its own and the first failure ends configuration; the socket is
//! then handed back so the caller can close it.

use std::fmt;
use std::sync::Arc;

use rustls::client::Resumption;
use rustls::pki_types::ServerName;
use rustls::{ClientConfig, ClientConnection};

use super::engine::TlsEngine;
use super::errors::{ConfigureKind, SessionOption, TlsError};
use super::handle::TlsHandle;
use super::verifier::VerificationStrategy;
use crate::config::{SessionOptions, TlsVersion, VersionRange};
use crate::connect::tcp::TransportSocket;
use crate::error;

/// Parameters applied to every session.
///
/// Sessions configured from equal parameters on one engine share a client
/// config, which is what lets the second of them resume the first.
#[derive(Debug, Clone, PartialEq)]
pub struct TlsParameters {
    pub options: SessionOptions,
    pub versions: VersionRange,
    pub verification: VerificationStrategy,
}

/// A refused configuration step together with the socket it was applied to.
#[derive(Debug)]
pub struct ConfigureError {
    kind: ConfigureKind,
    source: TlsError,
    socket: TransportSocket,
}

impl ConfigureError {
    fn new(kind: ConfigureKind, source: TlsError, socket: TransportSocket) -> Self {
        Self {
            kind,
            source,
            socket,
        }
    }

    #[must_use]
    pub fn kind(&self) -> ConfigureKind {
        self.kind
    }

    /// Split into the crate error and the socket that still needs closing.
    #[must_use]
    pub fn into_parts(self) -> (error::Error, TransportSocket) {
        (error::tls_configuration(self.kind, self.source), self.socket)
    }
}

impl fmt::Display for ConfigureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.source)
    }
}

impl std::error::Error for ConfigureError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

fn refused(option: SessionOption) -> (ConfigureKind, TlsError) {
    (
        ConfigureKind::OptionSetFailed(option),
        TlsError::OptionRefused(option),
    )
}

/// Configure a TLS client session on `socket`, bound to `hostname`.
///
/// No network I/O happens here. The handshake starts on the first connect,
/// send or forced handshake.
///
/// # Errors
///
/// Returns the first refused step; the socket is returned inside the error.
pub fn configure(
    engine: &TlsEngine,
    socket: TransportSocket,
    hostname: &str,
    params: &TlsParameters,
) -> Result<TlsHandle, ConfigureError> {
    match build_connection(engine, &socket, hostname, params) {
        Ok(conn) => {
            tracing::debug!(hostname, verifier = params.verification.name(), "TLS session configured");
            Ok(TlsHandle::new(socket, conn, hostname, engine.session_token()))
        }
        Err((kind, source)) => {
            tracing::error!(hostname, %kind, error = %source, "TLS configuration failed");
            Err(ConfigureError::new(kind, source, socket))
        }
    }
}

fn build_connection(
    engine: &TlsEngine,
    socket: &TransportSocket,
    hostname: &str,
    params: &TlsParameters,
) -> Result<ClientConnection, (ConfigureKind, TlsError)> {
    let options = &params.options;

    // Import
    match socket.is_stream() {
        Ok(true) => {}
        Ok(false) => return Err((ConfigureKind::ImportFailed, TlsError::NotAStream)),
        Err(e) => return Err((ConfigureKind::ImportFailed, TlsError::Io(e))),
    }

    let server_name = ServerName::try_from(hostname.to_string()).map_err(|_| {
        (
            ConfigureKind::OptionSetFailed(SessionOption::Url),
            TlsError::InvalidServerName(hostname.to_string()),
        )
    })?;

    if !options.security {
        return Err(refused(SessionOption::Security));
    }
    if !options.handshake_as_client {
        return Err(refused(SessionOption::HandshakeAsClient));
    }
    if params.versions != VersionRange::TLS13_ONLY {
        return Err((
            ConfigureKind::VersionRangeRejected,
            TlsError::UnsupportedVersions {
                min: params.versions.min.to_string(),
                max: params.versions.max.to_string(),
            },
        ));
    }
    // Sessions are single-threaded; a locking session is not offered.
    if !options.no_locks {
        return Err(refused(SessionOption::Locking));
    }

    let config = client_config(engine, params)?;
    ClientConnection::new(config, server_name)
        .map_err(|e| (ConfigureKind::ImportFailed, TlsError::Rustls(e)))
}

/// The engine's client config for `params`, built on first use.
pub(crate) fn client_config(
    engine: &TlsEngine,
    params: &TlsParameters,
) -> Result<Arc<ClientConfig>, (ConfigureKind, TlsError)> {
    engine.client_config(params, || build_config(engine, params))
}

fn build_config(
    engine: &TlsEngine,
    params: &TlsParameters,
) -> Result<ClientConfig, (ConfigureKind, TlsError)> {
    let options = &params.options;
    let builder = ClientConfig::builder_with_provider(Arc::clone(engine.provider()))
        .with_protocol_versions(&[&rustls::version::TLS13])
        .map_err(|e| (ConfigureKind::VersionRangeRejected, TlsError::Rustls(e)))?;

    let resumption = match (options.session_tickets, options.session_cache) {
        (true, true) => Resumption::store(engine.session_cache().clone()),
        (tickets, cache) => {
            tracing::debug!(tickets, cache, "resumption disabled, 0-RTT will not be attempted");
            Resumption::disabled()
        }
    };

    let verifier = params
        .verification
        .build(engine.provider())
        .map_err(|e| (ConfigureKind::OptionSetFailed(SessionOption::CertificateVerifier), e))?;

    let mut config = builder
        .dangerous()
        .with_custom_certificate_verifier(verifier)
        .with_no_client_auth();
    config.enable_early_data =
        options.enable_early_data && params.versions.contains(TlsVersion::Tls13);
    config.resumption = resumption;
    Ok(config)
}
