//! Response reader
//!
//! One readiness wait followed by exactly one bounded receive. Oversized
//! replies are cut at the buffer size and flagged rather than dropped.

use std::io;
use std::time::Duration;

use bytes::Bytes;

use crate::config::{IoSettings, TrailingBytePolicy};
use crate::error::{self, Result};

/// A readable session: readiness wait plus one receive.
pub trait PollRecv {
    /// Block until data, end of stream or an error is pending.
    ///
    /// # Errors
    ///
    /// Returns a `Poll` error when nothing became ready.
    fn poll_readable(&mut self, timeout: Option<Duration>) -> Result<()>;

    /// Receive into `buf`. `Ok(0)` means the peer closed without data.
    ///
    /// # Errors
    ///
    /// The transport or TLS failure, unmodified.
    fn recv(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// True when more received plaintext is waiting after the last `recv`.
    fn has_pending(&mut self) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadOptions {
    pub buffer_size: usize,
    pub timeout: Option<Duration>,
    pub trailing_byte: TrailingBytePolicy,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self::from(&IoSettings::default())
    }
}

impl From<&IoSettings> for ReadOptions {
    fn from(io: &IoSettings) -> Self {
        Self {
            buffer_size: io.recv_buffer_size,
            timeout: io.io_timeout(),
            trailing_byte: io.trailing_byte,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// Payload after applying the trailing-byte policy.
    pub bytes: Bytes,
    /// Bytes actually returned by the receive.
    pub received: usize,
    /// The buffer filled up and more plaintext was still pending.
    pub truncated: bool,
}

impl Response {
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.bytes).into_owned()
    }
}

/// Wait for the server's reply and receive it once.
///
/// # Errors
///
/// `Poll` when the wait fails, `EmptyResponse` when the peer closed without
/// data, and `Receive` carrying the untouched error of a failed receive.
pub fn read_once<S: PollRecv + ?Sized>(source: &mut S, options: ReadOptions) -> Result<Response> {
    tracing::debug!("polling for server response");
    source.poll_readable(options.timeout)?;

    let mut buf = vec![0u8; options.buffer_size];
    let received = match source.recv(&mut buf) {
        Ok(0) => {
            tracing::error!("empty server response");
            return Err(error::empty_response());
        }
        Ok(n) => n,
        Err(e) => {
            tracing::error!(code = e.raw_os_error().unwrap_or(-1), error = %e, "receive failed");
            return Err(error::receive(e));
        }
    };
    tracing::debug!(received, "read {received} bytes");

    let truncated = received == buf.len() && source.has_pending();
    if truncated {
        tracing::warn!(limit = buf.len(), "response truncated at buffer size");
    }

    let kept = match options.trailing_byte {
        TrailingBytePolicy::Keep => received,
        TrailingBytePolicy::Strip => received - 1,
    };
    buf.truncate(kept);

    Ok(Response {
        bytes: Bytes::from(buf),
        received,
        truncated,
    })
}
