//! Basic TCP connection establishment
//!
//! Resolves the endpoint address and issues the blocking connect. A failed
//! connect is reported and, under `ConnectFailurePolicy::Continue`, tolerated:
//! the TLS step that follows fails by itself if the socket never connected.

use std::net::SocketAddr;

use super::dns_resolution::resolve_address;
use super::socket::TransportSocket;
use crate::config::ConnectFailurePolicy;
use crate::error::{self, Result};

/// Connect `socket` to `ip:port`.
///
/// Returns the peer address when the connect succeeded and `None` when it
/// failed but the policy allows the lifecycle to continue.
///
/// # Errors
///
/// Returns a `Connect` error only under `ConnectFailurePolicy::Abort`.
pub fn connect_with_policy(
    socket: &mut TransportSocket,
    ip: &str,
    port: u16,
    policy: ConnectFailurePolicy,
) -> Result<Option<SocketAddr>> {
    let attempt = resolve_address(ip, port).and_then(|addr| socket.connect(addr).map(|()| addr));

    match attempt {
        Ok(addr) => {
            tracing::debug!(%addr, "connect returned");
            Ok(Some(addr))
        }
        Err(e) => {
            let code = e.raw_os_error().unwrap_or(-1);
            match policy {
                ConnectFailurePolicy::Continue => {
                    tracing::warn!(ip, port, code, error = %e, "connect failed, continuing");
                    Ok(None)
                }
                ConnectFailurePolicy::Abort => {
                    tracing::error!(ip, port, code, error = %e, "connect failed");
                    Err(error::connect(e).with_endpoint(format!("{ip}:{port}")))
                }
            }
        }
    }
}
