//! Transport socket
//!
//! One TCP endpoint owned by exactly one connection at a time. The socket can
//! be opened in non-blocking mode; every operation offered here still waits
//! for completion, switching the descriptor to blocking for its duration.

use std::io::{self, Read, Write};
use std::mem::MaybeUninit;
use std::net::{Shutdown, SocketAddr};
use std::time::Duration;

use socket2::{Domain, Protocol, SockAddr, Socket, Type};

use crate::error::{self, Result};

/// Address family of the socket to open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AddressFamily {
    #[default]
    V4,
    V6,
}

impl AddressFamily {
    /// Family matching a textual address; host names default to IPv4.
    #[must_use]
    pub fn for_address(text: &str) -> Self {
        match text.parse::<std::net::IpAddr>() {
            Ok(std::net::IpAddr::V6(_)) => AddressFamily::V6,
            _ => AddressFamily::V4,
        }
    }

    fn domain(self) -> Domain {
        match self {
            AddressFamily::V4 => Domain::IPV4,
            AddressFamily::V6 => Domain::IPV6,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SocketOptions {
    pub family: AddressFamily,
    pub non_blocking: bool,
    /// Bound for connect, poll, send and receive. `None` waits forever.
    pub io_timeout: Option<Duration>,
}

/// Result of waiting for read-or-error readiness.
#[derive(Debug)]
pub enum Readiness {
    /// Data, end of stream, or a hang-up is pending.
    Readable,
    /// The descriptor reported an error condition.
    Error(io::Error),
    /// Nothing became ready within the timeout.
    TimedOut,
}

#[derive(Debug)]
pub struct TransportSocket {
    socket: Socket,
    non_blocking: bool,
    io_timeout: Option<Duration>,
}

/// Open a TCP socket.
///
/// # Errors
///
/// Returns a `SocketCreation` error if the OS refuses the descriptor or the
/// requested blocking mode.
pub fn open(options: SocketOptions) -> Result<TransportSocket> {
    let socket = Socket::new(options.family.domain(), Type::STREAM, Some(Protocol::TCP))
        .map_err(error::socket_creation)?;
    socket
        .set_nonblocking(options.non_blocking)
        .map_err(error::socket_creation)?;
    socket
        .set_read_timeout(options.io_timeout)
        .map_err(error::socket_creation)?;
    socket
        .set_write_timeout(options.io_timeout)
        .map_err(error::socket_creation)?;

    tracing::debug!(
        family = ?options.family,
        non_blocking = options.non_blocking,
        "opened TCP socket"
    );

    Ok(TransportSocket {
        socket,
        non_blocking: options.non_blocking,
        io_timeout: options.io_timeout,
    })
}

impl TransportSocket {
    #[must_use]
    pub fn is_non_blocking(&self) -> bool {
        self.non_blocking
    }

    #[must_use]
    pub fn io_timeout(&self) -> Option<Duration> {
        self.io_timeout
    }

    /// Returns true if the descriptor is a stream socket.
    ///
    /// # Errors
    ///
    /// Propagates the `getsockopt` failure.
    pub fn is_stream(&self) -> io::Result<bool> {
        Ok(self.socket.r#type()? == Type::STREAM)
    }

    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.socket.peer_addr().ok().and_then(|addr| addr.as_socket())
    }

    /// Run `op` with the descriptor in blocking mode, restoring the caller's
    /// mode afterwards.
    ///
    /// # Errors
    ///
    /// Returns the error of `op`, or of leaving non-blocking mode. A failure to
    /// switch back afterwards is only logged, since `op` may already have
    /// consumed data.
    pub fn blocking<T>(&mut self, op: impl FnOnce(&mut Socket) -> io::Result<T>) -> io::Result<T> {
        if !self.non_blocking {
            return op(&mut self.socket);
        }

        self.socket.set_nonblocking(false)?;
        let result = op(&mut self.socket);
        settle(result, self.socket.set_nonblocking(true))
    }

    /// Blocking connect, bounded by the socket's I/O timeout when one is set.
    ///
    /// # Errors
    ///
    /// Returns the OS connect failure unchanged.
    pub fn connect(&mut self, addr: SocketAddr) -> io::Result<()> {
        let target = SockAddr::from(addr);
        let timeout = self.io_timeout;
        self.blocking(|socket| match timeout {
            Some(t) => socket.connect_timeout(&target, t),
            None => socket.connect(&target),
        })
    }

    /// Wait until the socket is readable or reports an error.
    ///
    /// `timeout` of `None` waits forever. Readiness is detected by peeking one
    /// byte, so nothing is consumed.
    pub fn wait_readable(&mut self, timeout: Option<Duration>) -> Readiness {
        let restore = self.io_timeout;
        let outcome = self.blocking(|socket| {
            socket.set_read_timeout(timeout)?;
            let mut probe = [MaybeUninit::<u8>::uninit(); 1];
            let peeked = loop {
                match socket.peek(&mut probe) {
                    Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                    other => break other,
                }
            };
            socket.set_read_timeout(restore)?;
            Ok(peeked)
        });

        match outcome {
            Ok(Ok(_)) => Readiness::Readable,
            Ok(Err(e))
                if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut) =>
            {
                Readiness::TimedOut
            }
            Ok(Err(e)) | Err(e) => Readiness::Error(e),
        }
    }

    /// Shut down both directions and release the descriptor.
    ///
    /// # Errors
    ///
    /// Returns the shutdown failure; `NotConnected` is ignored.
    pub fn close(self) -> io::Result<()> {
        match self.socket.shutdown(Shutdown::Both) {
            Err(e) if e.kind() != io::ErrorKind::NotConnected => Err(e),
            _ => Ok(()),
        }
    }
}

impl Read for TransportSocket {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.blocking(|socket| socket.read(buf))
    }
}

impl Write for TransportSocket {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.blocking(|socket| socket.write(buf))
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn settle<T>(result: io::Result<T>, restore: io::Result<()>) -> io::Result<T> {
    if let Err(e) = restore {
        tracing::warn!(error = %e, "restoring non-blocking mode failed");
    }
    result
}
