//! Connection handle
//!
//! A TLS client session together with the transport socket it was imported
//! from. The handle owns the socket for the rest of its life and must be
//! closed explicitly; it is never reused after `close`.

use std::fmt;
use std::io::{self, Read, Write};
use std::sync::Arc;
use std::time::Duration;

use rustls::ClientConnection;

use super::handshake::{EarlyDataOutcome, HandshakeKind, HandshakeSignal, HandshakeSummary};
use crate::connect::tcp::{Readiness, TransportSocket};
use crate::error::{self, Result};
use crate::response::PollRecv;

pub struct TlsHandle {
    transport: TransportSocket,
    conn: ClientConnection,
    hostname: String,
    signal: HandshakeSignal,
    summary: Option<HandshakeSummary>,
    /// Early data written before the handshake finished, kept until the
    /// server's decision is known.
    early_payload: Option<Vec<u8>>,
    pending_error: Option<io::Error>,
    bytes_sent: u64,
    bytes_received: u64,
    _session: Arc<()>,
}

impl fmt::Debug for TlsHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TlsHandle")
            .field("hostname", &self.hostname)
            .field("peer", &self.transport.peer_addr())
            .field("handshaking", &self.conn.is_handshaking())
            .field("handshake_completed", &self.signal.has_fired())
            .finish_non_exhaustive()
    }
}

impl From<rustls::HandshakeKind> for HandshakeKind {
    fn from(kind: rustls::HandshakeKind) -> Self {
        match kind {
            rustls::HandshakeKind::Resumed => HandshakeKind::Resumed,
            rustls::HandshakeKind::FullWithHelloRetryRequest => {
                HandshakeKind::FullWithHelloRetryRequest
            }
            _ => HandshakeKind::Full,
        }
    }
}

impl TlsHandle {
    pub(crate) fn new(
        transport: TransportSocket,
        conn: ClientConnection,
        hostname: &str,
        session: Arc<()>,
    ) -> Self {
        Self {
            transport,
            conn,
            hostname: hostname.to_string(),
            signal: HandshakeSignal::new(),
            summary: None,
            early_payload: None,
            pending_error: None,
            bytes_sent: 0,
            bytes_received: 0,
            _session: session,
        }
    }

    #[must_use]
    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    pub fn transport_mut(&mut self) -> &mut TransportSocket {
        &mut self.transport
    }

    /// Per-connection diagnostic flag. A fresh handle always reports false.
    #[must_use]
    pub fn handshake_completed(&self) -> bool {
        self.signal.has_fired()
    }

    #[must_use]
    pub fn signal(&self) -> &HandshakeSignal {
        &self.signal
    }

    #[must_use]
    pub fn summary(&self) -> Option<&HandshakeSummary> {
        self.summary.as_ref()
    }

    #[must_use]
    pub fn bytes_sent(&self) -> u64 {
        self.bytes_sent
    }

    #[must_use]
    pub fn bytes_received(&self) -> u64 {
        self.bytes_received
    }

    /// Drive the handshake to completion.
    ///
    /// # Errors
    ///
    /// Returns a `Handshake` error carrying the transport or TLS failure,
    /// including a peer that closed before the handshake finished.
    pub fn force_handshake(&mut self) -> Result<HandshakeSummary> {
        while self.conn.is_handshaking() {
            if let Err(e) = self.conn.complete_io(&mut self.transport) {
                tracing::error!(code = e.raw_os_error().unwrap_or(-1), error = %e, "handshake failed");
                return Err(error::handshake(e));
            }
        }
        self.observe_handshake().map_err(error::handshake)?;
        self.flush_tls().map_err(error::handshake)?;
        self.summary
            .clone()
            .ok_or_else(|| error::handshake(io::Error::other("handshake summary unavailable")))
    }

    /// Write `payload` as 0-RTT data when resumption material allows it,
    /// otherwise queue it as ordinary application data, then flush the first
    /// flight. The handshake is not forced.
    ///
    /// # Errors
    ///
    /// Returns a `Send` error on a short or failed write.
    pub fn send_early_data(&mut self, payload: &[u8]) -> Result<usize> {
        let written = match self.conn.early_data() {
            Some(mut early) => {
                let limit = early.bytes_left();
                let written = early.write(payload).map_err(error::send)?;
                tracing::debug!(written, limit, "sent early data");
                self.early_payload = Some(payload.to_vec());
                written
            }
            None => {
                tracing::debug!("no resumption material, early data falls back to a full handshake");
                self.conn.writer().write(payload).map_err(error::send)?
            }
        };

        if written < payload.len() {
            return Err(error::send(io::Error::new(
                io::ErrorKind::WriteZero,
                format!("wrote {written} of {} bytes", payload.len()),
            )));
        }
        self.bytes_sent += written as u64;
        self.flush_tls().map_err(error::send)?;
        Ok(written)
    }

    /// Send application data.
    ///
    /// # Errors
    ///
    /// Returns a `Send` error on a short or failed write.
    pub fn send(&mut self, payload: &[u8]) -> Result<usize> {
        let written = self.conn.writer().write(payload).map_err(error::send)?;
        if written < payload.len() {
            return Err(error::send(io::Error::new(
                io::ErrorKind::WriteZero,
                format!("wrote {written} of {} bytes", payload.len()),
            )));
        }
        self.flush_tls().map_err(error::send)?;
        self.bytes_sent += written as u64;
        tracing::debug!(written, "sent application data");
        Ok(written)
    }

    fn flush_tls(&mut self) -> io::Result<()> {
        while self.conn.wants_write() {
            self.conn.write_tls(&mut self.transport)?;
        }
        Ok(())
    }

    /// Fire the handshake signal once the session leaves the handshake.
    /// Rejected early data is queued again so the request is not lost.
    fn observe_handshake(&mut self) -> io::Result<()> {
        if self.conn.is_handshaking() || self.signal.has_fired() {
            return Ok(());
        }

        let early_data = match self.early_payload.take() {
            None => EarlyDataOutcome::NotAttempted,
            Some(_) if self.conn.is_early_data_accepted() => EarlyDataOutcome::Accepted,
            Some(payload) => {
                tracing::warn!(len = payload.len(), "early data rejected, resending");
                self.conn.writer().write_all(&payload)?;
                EarlyDataOutcome::Rejected
            }
        };

        let summary = HandshakeSummary {
            protocol: self.conn.protocol_version().map(|v| format!("{v:?}")),
            cipher_suite: self
                .conn
                .negotiated_cipher_suite()
                .map(|suite| format!("{:?}", suite.suite())),
            kind: self.conn.handshake_kind().map(HandshakeKind::from),
            early_data,
        };
        self.summary = Some(summary.clone());
        self.signal.fire(summary);
        Ok(())
    }

    /// Read and process one batch of TLS records. Returns false at end of
    /// stream.
    fn pump(&mut self) -> io::Result<bool> {
        let read = self.conn.read_tls(&mut self.transport)?;
        if let Err(e) = self.conn.process_new_packets() {
            // Best effort: deliver the alert before reporting.
            let _ = self.flush_tls();
            return Err(io::Error::new(io::ErrorKind::InvalidData, e));
        }
        self.observe_handshake()?;
        self.flush_tls()?;
        Ok(read > 0)
    }

    /// Send close_notify and release the socket.
    ///
    /// # Errors
    ///
    /// Returns the transport shutdown failure.
    pub fn close(mut self) -> io::Result<()> {
        self.conn.send_close_notify();
        if let Err(e) = self.flush_tls() {
            tracing::debug!(error = %e, "close_notify not delivered");
        }
        let Self {
            transport,
            hostname,
            ..
        } = self;
        transport.close()?;
        tracing::info!(hostname = %hostname, "connection closed");
        Ok(())
    }
}

impl PollRecv for TlsHandle {
    fn poll_readable(&mut self, timeout: Option<Duration>) -> Result<()> {
        if self.pending_error.is_some() || self.has_pending() {
            return Ok(());
        }
        match self.transport.wait_readable(timeout) {
            Readiness::Readable => Ok(()),
            Readiness::Error(e) => {
                // An error event counts as readiness; the receive reports it.
                self.pending_error = Some(e);
                Ok(())
            }
            Readiness::TimedOut => Err(error::poll(io::Error::new(
                io::ErrorKind::TimedOut,
                "no descriptor became ready",
            ))),
        }
    }

    fn recv(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if let Some(e) = self.pending_error.take() {
            return Err(e);
        }

        let mut eof = false;
        loop {
            match self.conn.reader().read(buf) {
                Ok(n) => {
                    self.bytes_received += n as u64;
                    return Ok(n);
                }
                // Peer went away without close_notify.
                Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(0),
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                    if eof {
                        return Ok(0);
                    }
                }
                Err(e) => return Err(e),
            }
            eof = !self.pump()?;
        }
    }

    fn has_pending(&mut self) -> bool {
        match self.conn.process_new_packets() {
            Ok(state) => state.plaintext_bytes_to_read() > 0,
            Err(e) => {
                tracing::warn!(hostname = %self.hostname, error = %e, "TLS error behind received data");
                false
            }
        }
    }
}
