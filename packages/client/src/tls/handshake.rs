//! Handshake completion notification
//!
//! Each connection owns a single-shot signal that is fulfilled the first
//! time its handshake is observed complete. The blocking call that drove
//! the handshake is the synchronization point; the signal only reports.

use crossbeam_channel::{Receiver, Sender, TryRecvError};

/// How the session keys were established.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeKind {
    Full,
    FullWithHelloRetryRequest,
    Resumed,
}

/// What happened to application data offered before the handshake finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EarlyDataOutcome {
    /// No early data was written, or no resumption material existed and the
    /// payload travelled as ordinary application data.
    #[default]
    NotAttempted,
    Accepted,
    /// The server refused the early data; the payload was sent again after
    /// the handshake.
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandshakeSummary {
    pub protocol: Option<String>,
    pub cipher_suite: Option<String>,
    pub kind: Option<HandshakeKind>,
    pub early_data: EarlyDataOutcome,
}

impl HandshakeSummary {
    #[must_use]
    pub fn is_resumed(&self) -> bool {
        self.kind == Some(HandshakeKind::Resumed)
    }
}

#[derive(Debug)]
pub struct HandshakeSignal {
    tx: Sender<HandshakeSummary>,
    rx: Receiver<HandshakeSummary>,
    fired: bool,
}

impl Default for HandshakeSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl HandshakeSignal {
    #[must_use]
    pub fn new() -> Self {
        let (tx, rx) = crossbeam_channel::bounded(1);
        Self {
            tx,
            rx,
            fired: false,
        }
    }

    /// Fulfil the signal. Later calls are ignored.
    pub fn fire(&mut self, summary: HandshakeSummary) -> bool {
        if self.fired {
            return false;
        }
        self.fired = true;
        tracing::info!(
            protocol = summary.protocol.as_deref().unwrap_or("unknown"),
            kind = ?summary.kind,
            early_data = ?summary.early_data,
            "handshake done"
        );
        // Capacity is one and this is the only send.
        let _ = self.tx.try_send(summary);
        true
    }

    /// Diagnostic flag: true once the handshake was observed complete.
    #[must_use]
    pub fn has_fired(&self) -> bool {
        self.fired
    }

    /// Take the summary if the signal has been fulfilled and not yet consumed.
    pub fn try_take(&self) -> Option<HandshakeSummary> {
        match self.rx.try_recv() {
            Ok(summary) => Some(summary),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }

    /// Receiver half for callers that want to observe completion elsewhere.
    #[must_use]
    pub fn receiver(&self) -> Receiver<HandshakeSummary> {
        self.rx.clone()
    }
}
