//! TLS engine lifetime
//!
//! The engine owns the crypto provider and the process-scoped session cache.
//! It is initialised once before the first connection and shut down after
//! the last one; shutting down while sessions are still alive is refused.

use std::sync::{Arc, Mutex, PoisonError};

use rustls::crypto::CryptoProvider;
use rustls::{ClientConfig, SupportedCipherSuite};

use super::errors::TlsError;
use super::session_cache::SessionCache;
use super::session_config::TlsParameters;
use crate::config::ConfigDefaults;
use crate::error::{self, Result};

#[derive(Debug)]
pub struct TlsEngine {
    provider: Arc<CryptoProvider>,
    cache: Arc<SessionCache>,
    /// Client configs already built, one per distinct parameter set. A stored
    /// ticket is only offered again under the config that received it.
    configs: Mutex<Vec<(TlsParameters, Arc<ClientConfig>)>>,
    sessions: Arc<()>,
}

impl TlsEngine {
    /// Initialise the engine with the ring provider.
    ///
    /// # Errors
    ///
    /// Returns an `Initialization` error when the provider offers no TLS 1.3
    /// cipher suite.
    pub fn init() -> Result<Self> {
        Self::with_provider(rustls::crypto::ring::default_provider())
    }

    /// Initialise the engine with a caller-supplied provider.
    ///
    /// # Errors
    ///
    /// Returns an `Initialization` error when the provider offers no TLS 1.3
    /// cipher suite.
    pub fn with_provider(provider: CryptoProvider) -> Result<Self> {
        let tls13_suites = provider
            .cipher_suites
            .iter()
            .filter(|suite| matches!(suite, SupportedCipherSuite::Tls13(_)))
            .count();
        if tls13_suites == 0 {
            return Err(error::initialization(TlsError::NoTls13Suites));
        }

        tracing::info!(tls13_suites, "TLS engine initialised");
        Ok(Self {
            provider: Arc::new(provider),
            cache: Arc::new(SessionCache::new(ConfigDefaults::SESSION_CACHE_ENTRIES)),
            configs: Mutex::new(Vec::new()),
            sessions: Arc::new(()),
        })
    }

    #[must_use]
    pub fn provider(&self) -> &Arc<CryptoProvider> {
        &self.provider
    }

    #[must_use]
    pub fn session_cache(&self) -> &Arc<SessionCache> {
        &self.cache
    }

    /// The config built for `params`, building it with `build` on first use.
    pub(crate) fn client_config<E>(
        &self,
        params: &TlsParameters,
        build: impl FnOnce() -> std::result::Result<ClientConfig, E>,
    ) -> std::result::Result<Arc<ClientConfig>, E> {
        let mut configs = self.configs.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some((_, config)) = configs.iter().find(|(known, _)| known == params) {
            return Ok(Arc::clone(config));
        }
        let config = Arc::new(build()?);
        configs.push((params.clone(), Arc::clone(&config)));
        tracing::debug!(configs = configs.len(), "client config built");
        Ok(config)
    }

    /// Token held by every configured session for as long as it lives.
    pub(crate) fn session_token(&self) -> Arc<()> {
        Arc::clone(&self.sessions)
    }

    /// Sessions configured by this engine that have not been dropped yet.
    #[must_use]
    pub fn live_sessions(&self) -> usize {
        Arc::strong_count(&self.sessions) - 1
    }

    /// Clear the session cache and release the engine.
    ///
    /// # Errors
    ///
    /// Returns a `Shutdown` error if a configured session is still alive.
    pub fn shutdown(self) -> Result<()> {
        self.cache.clear();
        self.configs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        let live = self.live_sessions();
        if live > 0 {
            tracing::error!(live, "TLS engine busy at shutdown");
            return Err(error::shutdown(TlsError::Busy(live)));
        }
        tracing::info!(
            tickets = self.cache.tickets_stored(),
            "TLS engine shut down"
        );
        Ok(())
    }
}
