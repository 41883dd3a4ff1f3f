//! Address resolution
//!
//! Turns the textual endpoint address into a socket address, with a fast
//! path for IP literals.

use std::io;
use std::net::{IpAddr, SocketAddr, ToSocketAddrs};
use std::str::FromStr;

/// Resolve `host` to the first socket address for `port`.
///
/// # Errors
///
/// Returns `InvalidInput` if nothing could be resolved.
pub fn resolve_address(host: &str, port: u16) -> io::Result<SocketAddr> {
    // Fast path for IP addresses
    if let Ok(ip) = IpAddr::from_str(host) {
        return Ok(SocketAddr::new(ip, port));
    }

    let host_port = format!("{host}:{port}");
    host_port.to_socket_addrs()?.next().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("No addresses resolved for {host}"),
        )
    })
}
