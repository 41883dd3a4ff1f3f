//! Connection statistics with cache-padded atomic counters

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use crossbeam_utils::CachePadded;

use crate::tls::{EarlyDataOutcome, HandshakeSummary};

/// Counters updated as the lifecycle advances. Each counter is cache-padded.
#[derive(Debug, Default)]
pub struct ConnectionStats {
    pub connections_opened: CachePadded<AtomicUsize>,
    pub handshakes_completed: CachePadded<AtomicUsize>,
    /// Handshakes that resumed a stored session
    pub resumed_handshakes: CachePadded<AtomicUsize>,
    pub early_data_accepted: CachePadded<AtomicUsize>,
    pub early_data_rejected: CachePadded<AtomicUsize>,
    pub bytes_sent: CachePadded<AtomicU64>,
    pub bytes_received: CachePadded<AtomicU64>,
}

/// Point-in-time copy of [`ConnectionStats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConnectionStatsSnapshot {
    pub connections_opened: usize,
    pub handshakes_completed: usize,
    pub resumed_handshakes: usize,
    pub early_data_accepted: usize,
    pub early_data_rejected: usize,
    pub bytes_sent: u64,
    pub bytes_received: u64,
}

impl ConnectionStats {
    #[inline]
    pub fn record_open(&self) {
        self.connections_opened.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_handshake(&self, summary: &HandshakeSummary) {
        self.handshakes_completed.fetch_add(1, Ordering::Relaxed);
        if summary.is_resumed() {
            self.resumed_handshakes.fetch_add(1, Ordering::Relaxed);
        }
        match summary.early_data {
            EarlyDataOutcome::Accepted => {
                self.early_data_accepted.fetch_add(1, Ordering::Relaxed);
            }
            EarlyDataOutcome::Rejected => {
                self.early_data_rejected.fetch_add(1, Ordering::Relaxed);
            }
            EarlyDataOutcome::NotAttempted => {}
        }
    }

    #[inline]
    pub fn record_traffic(&self, sent: u64, received: u64) {
        self.bytes_sent.fetch_add(sent, Ordering::Relaxed);
        self.bytes_received.fetch_add(received, Ordering::Relaxed);
    }

    #[inline]
    pub fn snapshot(&self) -> ConnectionStatsSnapshot {
        ConnectionStatsSnapshot {
            connections_opened: self.connections_opened.load(Ordering::Relaxed),
            handshakes_completed: self.handshakes_completed.load(Ordering::Relaxed),
            resumed_handshakes: self.resumed_handshakes.load(Ordering::Relaxed),
            early_data_accepted: self.early_data_accepted.load(Ordering::Relaxed),
            early_data_rejected: self.early_data_rejected.load(Ordering::Relaxed),
            bytes_sent: self.bytes_sent.load(Ordering::Relaxed),
            bytes_received: self.bytes_received.load(Ordering::Relaxed),
        }
    }
}
