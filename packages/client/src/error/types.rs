use std::error::Error as StdError;
use std::fmt;

use crate::tls::ConfigureKind;

/// A Result alias where the Err case is `zrtt_client::Error`.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents a failed step of a connection lifecycle.
pub struct Error {
    pub inner: Box<Inner>,
}

pub struct Inner {
    pub kind: Kind,
    pub source: Option<Box<dyn StdError + Send + Sync>>,
    pub endpoint: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Kind {
    /// Crypto provider / engine initialization
    Initialization,
    SocketCreation,
    /// One TLS configuration step was refused
    TlsConfiguration(ConfigureKind),
    Connect,
    Handshake,
    /// Partial or failed write
    Send,
    Poll,
    /// Peer closed without sending data
    EmptyResponse,
    /// Receive failed; the source is the untouched io error
    Receive,
    Shutdown,
    /// Settings could not be loaded or validated
    Config,
}

impl Error {
    pub fn new(kind: Kind) -> Error {
        Error {
            inner: Box::new(Inner {
                kind,
                source: None,
                endpoint: None,
            }),
        }
    }

    #[must_use = "Error builder methods return a new Error and should be used"]
    pub fn with<E: Into<Box<dyn StdError + Send + Sync>>>(mut self, source: E) -> Error {
        self.inner.source = Some(source.into());
        self
    }

    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.inner.endpoint = Some(endpoint.into());
        self
    }

    #[must_use]
    pub fn kind(&self) -> &Kind {
        &self.inner.kind
    }

    /// Get the endpoint associated with this error, if any
    #[must_use]
    pub fn endpoint(&self) -> Option<&str> {
        self.inner.endpoint.as_deref()
    }

    /// Numeric OS error code from the first io error in the source chain.
    #[must_use]
    pub fn code(&self) -> Option<i32> {
        let mut source = self.source();
        while let Some(err) = source {
            if let Some(io) = err.downcast_ref::<std::io::Error>()
                && let Some(code) = io.raw_os_error()
            {
                return Some(code);
            }
            source = err.source();
        }
        None
    }

    /// Consume the error and return the boxed source, if any.
    pub fn into_source(self) -> Option<Box<dyn StdError + Send + Sync>> {
        self.inner.source
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut f = f.debug_struct("zrtt_client::Error");

        f.field("kind", &self.inner.kind);

        if let Some(ref source) = self.inner.source {
            f.field("source", source);
        }

        if let Some(ref endpoint) = self.inner.endpoint {
            f.field("endpoint", endpoint);
        }

        f.finish()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.inner.kind {
            Kind::Initialization => f.write_str("TLS engine initialization failed")?,
            Kind::SocketCreation => f.write_str("error creating socket")?,
            Kind::TlsConfiguration(which) => write!(f, "TLS configuration failed: {which}")?,
            Kind::Connect => f.write_str("TCP connect failed")?,
            Kind::Handshake => f.write_str("TLS handshake failed")?,
            Kind::Send => f.write_str("error sending data to the server")?,
            Kind::Poll => f.write_str("polling socket for server response failed")?,
            Kind::EmptyResponse => f.write_str("empty server response")?,
            Kind::Receive => f.write_str("error receiving server response")?,
            Kind::Shutdown => f.write_str("TLS engine shutdown failed")?,
            Kind::Config => f.write_str("invalid client settings")?,
        }

        if let Some(ref source) = self.inner.source {
            write!(f, ": {source}")?;
        }
        Ok(())
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.inner
            .source
            .as_ref()
            .map(|err| &**err as &(dyn StdError + 'static))
    }
}
