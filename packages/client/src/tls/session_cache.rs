//! Process-scoped session cache
//!
//! Holds the tickets collected by one connection so a later connection to the
//! same server can resume and send early data. Every session configured by a
//! `TlsEngine` shares this store.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

use rustls::client::{
    ClientSessionMemoryCache, ClientSessionStore, Tls12ClientSessionValue, Tls13ClientSessionValue,
};
use rustls::pki_types::ServerName;
use rustls::NamedGroup;

#[derive(Debug)]
pub struct SessionCache {
    inner: RwLock<Arc<ClientSessionMemoryCache>>,
    capacity: usize,
    tickets_stored: AtomicUsize,
    tickets_taken: AtomicUsize,
}

impl SessionCache {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: RwLock::new(Arc::new(ClientSessionMemoryCache::new(capacity))),
            capacity,
            tickets_stored: AtomicUsize::new(0),
            tickets_taken: AtomicUsize::new(0),
        }
    }

    fn store(&self) -> Arc<ClientSessionMemoryCache> {
        match self.inner.read() {
            Ok(guard) => Arc::clone(&guard),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    /// Drop every stored session.
    pub fn clear(&self) {
        let fresh = Arc::new(ClientSessionMemoryCache::new(self.capacity));
        match self.inner.write() {
            Ok(mut guard) => *guard = fresh,
            Err(poisoned) => *poisoned.into_inner() = fresh,
        }
        tracing::debug!("session cache cleared");
    }

    /// TLS 1.3 tickets received since creation.
    #[must_use]
    pub fn tickets_stored(&self) -> usize {
        self.tickets_stored.load(Ordering::Relaxed)
    }

    /// TLS 1.3 tickets handed out for resumption attempts.
    #[must_use]
    pub fn tickets_taken(&self) -> usize {
        self.tickets_taken.load(Ordering::Relaxed)
    }
}

impl ClientSessionStore for SessionCache {
    fn set_kx_hint(&self, server_name: ServerName<'static>, group: NamedGroup) {
        self.store().set_kx_hint(server_name, group);
    }

    fn kx_hint(&self, server_name: &ServerName<'_>) -> Option<NamedGroup> {
        self.store().kx_hint(server_name)
    }

    fn set_tls12_session(&self, server_name: ServerName<'static>, value: Tls12ClientSessionValue) {
        self.store().set_tls12_session(server_name, value);
    }

    fn tls12_session(&self, server_name: &ServerName<'_>) -> Option<Tls12ClientSessionValue> {
        self.store().tls12_session(server_name)
    }

    fn remove_tls12_session(&self, server_name: &ServerName<'static>) {
        self.store().remove_tls12_session(server_name);
    }

    fn insert_tls13_ticket(&self, server_name: ServerName<'static>, value: Tls13ClientSessionValue) {
        self.tickets_stored.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(?server_name, "stored session ticket");
        self.store().insert_tls13_ticket(server_name, value);
    }

    fn take_tls13_ticket(&self, server_name: &ServerName<'static>) -> Option<Tls13ClientSessionValue> {
        let ticket = self.store().take_tls13_ticket(server_name);
        if ticket.is_some() {
            self.tickets_taken.fetch_add(1, Ordering::Relaxed);
        }
        ticket
    }
}
