use std::error::Error as StdError;
use std::io;

use super::types::{Error, Kind};

impl Error {
    #[must_use]
    pub fn is_initialization(&self) -> bool {
        matches!(self.inner.kind, Kind::Initialization)
    }

    #[must_use]
    pub fn is_socket_creation(&self) -> bool {
        matches!(self.inner.kind, Kind::SocketCreation)
    }

    #[must_use]
    pub fn is_tls_configuration(&self) -> bool {
        matches!(self.inner.kind, Kind::TlsConfiguration(_))
    }

    /// Returns true if the TCP connect was reported as failed.
    #[must_use]
    pub fn is_connect(&self) -> bool {
        matches!(self.inner.kind, Kind::Connect)
    }

    #[must_use]
    pub fn is_handshake(&self) -> bool {
        matches!(self.inner.kind, Kind::Handshake)
    }

    #[must_use]
    pub fn is_send(&self) -> bool {
        matches!(self.inner.kind, Kind::Send)
    }

    #[must_use]
    pub fn is_poll(&self) -> bool {
        matches!(self.inner.kind, Kind::Poll)
    }

    /// Returns true if the peer closed without sending any data.
    #[must_use]
    pub fn is_empty_response(&self) -> bool {
        matches!(self.inner.kind, Kind::EmptyResponse)
    }

    #[must_use]
    pub fn is_receive(&self) -> bool {
        matches!(self.inner.kind, Kind::Receive)
    }

    #[must_use]
    pub fn is_shutdown(&self) -> bool {
        matches!(self.inner.kind, Kind::Shutdown)
    }

    #[must_use]
    pub fn is_config(&self) -> bool {
        matches!(self.inner.kind, Kind::Config)
    }

    /// Returns true if the error is related to a timeout.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        let mut source = self.source();

        while let Some(err) = source {
            if let Some(io) = err.downcast_ref::<io::Error>()
                && matches!(io.kind(), io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock)
            {
                return true;
            }
            source = err.source();
        }

        false
    }
}
