//! Connection establishers
//!
//! Both establishers share the connect step and its failure policy. The plain
//! establisher forces the handshake before returning; the early-data
//! establisher writes its payload straight after the connect and lets the
//! response read finish the handshake.

use super::tcp::connect_with_policy;
use crate::config::ConnectFailurePolicy;
use crate::error::Result;
use crate::response::{read_once, ReadOptions, Response};
use crate::tls::{HandshakeSummary, TlsHandle};

/// Connect and force a full handshake.
///
/// Under `ConnectFailurePolicy::Continue` a failed connect is only logged and
/// the handshake is still attempted; it then fails by itself.
///
/// # Errors
///
/// `Connect` under the abort policy, otherwise `Handshake` with the
/// underlying error code.
pub fn connect(
    handle: &mut TlsHandle,
    ip: &str,
    port: u16,
    policy: ConnectFailurePolicy,
) -> Result<HandshakeSummary> {
    connect_with_policy(handle.transport_mut(), ip, port, policy)?;
    let summary = handle
        .force_handshake()
        .map_err(|e| e.with_endpoint(format!("{ip}:{port}")))?;
    tracing::info!(ip, port, resumed = summary.is_resumed(), "handshake forced");
    Ok(summary)
}

/// Connect and write `payload` as early data without forcing the handshake.
///
/// # Errors
///
/// `Connect` under the abort policy, or `Send` on a short or failed write.
pub fn start_early_data(
    handle: &mut TlsHandle,
    ip: &str,
    port: u16,
    payload: &[u8],
    policy: ConnectFailurePolicy,
) -> Result<usize> {
    connect_with_policy(handle.transport_mut(), ip, port, policy)?;
    handle
        .send_early_data(payload)
        .map_err(|e| e.with_endpoint(format!("{ip}:{port}")))
}

/// Connect, send `payload` as early data and read the reply.
///
/// # Errors
///
/// Any error of [`start_early_data`] or [`read_once`].
pub fn connect_with_early_data(
    handle: &mut TlsHandle,
    ip: &str,
    port: u16,
    payload: &[u8],
    policy: ConnectFailurePolicy,
    read: ReadOptions,
) -> Result<Response> {
    start_early_data(handle, ip, port, payload, policy)?;
    read_once(handle, read)
}

/// Send application data on an established session.
///
/// # Errors
///
/// `Send` on a short or failed write.
pub fn send(handle: &mut TlsHandle, payload: &[u8]) -> Result<usize> {
    handle.send(payload)
}
