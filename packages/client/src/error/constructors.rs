use std::io;

use super::types::{Error, Kind};
use crate::tls::ConfigureKind;

pub(crate) type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Creates an `Error` for a crypto provider / engine initialization failure.
pub fn initialization<E: Into<BoxError>>(e: E) -> Error {
    Error::new(Kind::Initialization).with(e.into())
}

/// Creates an `Error` for a socket that could not be opened.
pub fn socket_creation(e: io::Error) -> Error {
    Error::new(Kind::SocketCreation).with(e)
}

/// Creates an `Error` for a refused TLS configuration step.
pub fn tls_configuration<E: Into<BoxError>>(which: ConfigureKind, e: E) -> Error {
    Error::new(Kind::TlsConfiguration(which)).with(e.into())
}

pub fn connect(e: io::Error) -> Error {
    Error::new(Kind::Connect).with(e)
}

pub fn handshake<E: Into<BoxError>>(e: E) -> Error {
    Error::new(Kind::Handshake).with(e.into())
}

pub fn send<E: Into<BoxError>>(e: E) -> Error {
    Error::new(Kind::Send).with(e.into())
}

pub fn poll<E: Into<BoxError>>(e: E) -> Error {
    Error::new(Kind::Poll).with(e.into())
}

pub fn empty_response() -> Error {
    Error::new(Kind::EmptyResponse)
}

/// The io error is kept as-is so callers see the engine's report unmodified.
pub fn receive(e: io::Error) -> Error {
    Error::new(Kind::Receive).with(e)
}

pub fn shutdown<E: Into<BoxError>>(e: E) -> Error {
    Error::new(Kind::Shutdown).with(e.into())
}

pub fn config<E: Into<BoxError>>(e: E) -> Error {
    Error::new(Kind::Config).with(e.into())
}
