//! Session orchestrator
//!
//! Runs the two-phase lifecycle: a full handshake that populates the session
//! cache, then a second connection that sends its request as early data. Any
//! failed step halts the run; the live handle is closed on every exit path.

mod report;
mod step;

use std::sync::Arc;

pub use report::{Outcome, PhaseReport, SessionReport};
pub use step::Step;
use step::Phase;

use crate::config::{ClientSettings, Validator};
use crate::connect::tcp::{open, AddressFamily, SocketOptions};
use crate::connect::{connect, send, start_early_data};
use crate::error::{self, Error};
use crate::response::{read_once, ReadOptions};
use crate::telemetry::ConnectionStats;
use crate::tls::{configure, TlsEngine, TlsHandle, TlsParameters, VerificationStrategy};

struct Aborted {
    step: Step,
    error: Error,
}

fn at(step: Step) -> impl FnOnce(Error) -> Aborted {
    move |error| Aborted { step, error }
}

pub struct Orchestrator {
    settings: ClientSettings,
    stats: Arc<ConnectionStats>,
    trail: Vec<Step>,
}

impl Orchestrator {
    #[must_use]
    pub fn new(settings: ClientSettings) -> Self {
        Self {
            settings,
            stats: Arc::new(ConnectionStats::default()),
            trail: Vec::with_capacity(Step::SEQUENCE.len()),
        }
    }

    #[must_use]
    pub fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    #[must_use]
    pub fn stats(&self) -> Arc<ConnectionStats> {
        Arc::clone(&self.stats)
    }

    /// Steps entered so far, in order.
    #[must_use]
    pub fn trail(&self) -> &[Step] {
        &self.trail
    }

    /// Run both phases and shut the engine down.
    pub fn run(&mut self) -> Outcome {
        self.trail.clear();
        match self.run_steps() {
            Ok(report) => {
                tracing::info!(
                    resumed = report.stats.resumed_handshakes,
                    early_data_accepted = report.stats.early_data_accepted,
                    "session lifecycle complete"
                );
                Outcome::Shutdown(report)
            }
            Err(Aborted { step, error }) => {
                tracing::error!(
                    %step,
                    code = error.code().unwrap_or(-1),
                    error = %error,
                    "lifecycle aborted"
                );
                Outcome::Aborted { step, error }
            }
        }
    }

    fn enter(&mut self, step: Step) {
        tracing::debug!(%step, "entering step");
        self.trail.push(step);
    }

    fn run_steps(&mut self) -> Result<SessionReport, Aborted> {
        self.enter(Step::Init);
        self.settings.validate().map_err(|e| at(Step::Init)(error::config(e)))?;
        let verification = VerificationStrategy::from_config(&self.settings.verification)
            .map_err(|e| at(Step::Init)(error::config(e)))?;
        let engine = TlsEngine::init().map_err(at(Step::Init))?;
        let params = TlsParameters {
            options: self.settings.session.clone(),
            versions: self.settings.versions,
            verification,
        };

        let full = self.phase(&engine, &params, Phase::Full)?;
        let early = self.phase(&engine, &params, Phase::EarlyData)?;

        self.enter(Step::Shutdown);
        let tickets_stored = engine.session_cache().tickets_stored();
        engine.shutdown().map_err(at(Step::Shutdown))?;

        Ok(SessionReport {
            full,
            early,
            stats: self.stats.snapshot(),
            tickets_stored,
            trail: self.trail.clone(),
        })
    }

    /// Open, configure, exchange and close one connection.
    fn phase(
        &mut self,
        engine: &TlsEngine,
        params: &TlsParameters,
        phase: Phase,
    ) -> Result<PhaseReport, Aborted> {
        let endpoint = &self.settings.endpoint;
        let options = SocketOptions {
            family: AddressFamily::for_address(&endpoint.ip),
            non_blocking: self.settings.io.non_blocking,
            io_timeout: self.settings.io.io_timeout(),
        };

        self.enter(phase.open_step());
        let socket = open(options).map_err(at(phase.open_step()))?;
        self.stats.record_open();

        self.enter(phase.configure_step());
        let hostname = self.settings.endpoint.hostname.clone();
        let mut handle = match configure(engine, socket, &hostname, params) {
            Ok(handle) => handle,
            Err(refused) => {
                let (error, socket) = refused.into_parts();
                if let Err(e) = socket.close() {
                    tracing::debug!(error = %e, "closing unconfigured socket failed");
                }
                return Err(at(phase.configure_step())(error));
            }
        };

        let exchanged = self.exchange(&mut handle, phase);
        self.stats
            .record_traffic(handle.bytes_sent(), handle.bytes_received());

        if exchanged.is_ok() {
            self.enter(phase.close_step());
        }
        if let Err(e) = handle.close() {
            tracing::warn!(error = %e, "closing connection failed");
        }
        exchanged
    }

    fn exchange(&mut self, handle: &mut TlsHandle, phase: Phase) -> Result<PhaseReport, Aborted> {
        let ip = self.settings.endpoint.ip.clone();
        let port = self.settings.endpoint.port;
        let policy = self.settings.connect_failure;
        let read = ReadOptions::from(&self.settings.io);

        match phase {
            Phase::Full => {
                self.enter(Step::Connect1);
                let summary = connect(handle, &ip, port, policy).map_err(at(Step::Connect1))?;

                self.enter(Step::HandshakeDone1);
                tracing::debug!(completed = handle.handshake_completed(), "handshake flag");
                self.stats.record_handshake(&summary);

                self.enter(Step::SendHello1);
                let hello = self.settings.payloads.hello.clone();
                send(handle, hello.as_bytes()).map_err(at(Step::SendHello1))?;

                self.enter(Step::Read1);
                let response = read_once(handle, read).map_err(at(Step::Read1))?;
                Ok(PhaseReport {
                    response,
                    handshake: Some(summary),
                })
            }
            Phase::EarlyData => {
                self.enter(Step::Connect2WithEarlyData);
                let payload = self.settings.payloads.early_data.clone();
                start_early_data(handle, &ip, port, payload.as_bytes(), policy)
                    .map_err(at(Step::Connect2WithEarlyData))?;

                self.enter(Step::Read2);
                let response = read_once(handle, read).map_err(at(Step::Read2))?;
                let handshake = handle.summary().cloned();
                if let Some(summary) = &handshake {
                    self.stats.record_handshake(summary);
                }
                Ok(PhaseReport {
                    response,
                    handshake,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::net::TcpListener;

    use super::*;
    use crate::config::{ServerEndpoint, VerificationMode};

    fn refused_endpoint() -> ServerEndpoint {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let port = listener.local_addr().expect("addr").port();
        drop(listener);
        ServerEndpoint::new("localhost", "127.0.0.1", port)
    }

    #[test]
    fn invalid_settings_abort_at_init() {
        let mut settings = ClientSettings::default();
        settings.payloads.hello.clear();
        let outcome = Orchestrator::new(settings).run();
        match outcome {
            Outcome::Aborted { step, error } => {
                assert_eq!(step, Step::Init);
                assert!(error.is_config());
            }
            Outcome::Shutdown(_) => panic!("empty payload must be rejected"),
        }
    }

    #[test]
    fn refused_connect_surfaces_as_handshake_failure() {
        let mut settings = ClientSettings::default().with_endpoint(refused_endpoint());
        settings.verification.mode = VerificationMode::AcceptAny;
        let mut orchestrator = Orchestrator::new(settings);
        let outcome = orchestrator.run();
        assert_eq!(outcome.exit_code(), 1);
        match outcome {
            Outcome::Aborted { step, error } => {
                assert_eq!(step, Step::Connect1);
                assert!(error.is_handshake());
            }
            Outcome::Shutdown(_) => panic!("nothing is listening"),
        }
        assert_eq!(
            orchestrator.trail(),
            &[Step::Init, Step::OpenSocket1, Step::ConfigureTls1, Step::Connect1]
        );
    }

    #[test]
    fn abort_policy_fails_fast_on_connect() {
        let mut settings = ClientSettings::default().with_endpoint(refused_endpoint());
        settings.connect_failure = crate::config::ConnectFailurePolicy::Abort;
        let outcome = Orchestrator::new(settings).run();
        match outcome {
            Outcome::Aborted { step, error } => {
                assert_eq!(step, Step::Connect1);
                assert!(error.is_connect());
            }
            Outcome::Shutdown(_) => panic!("nothing is listening"),
        }
    }

    #[test]
    fn refused_option_aborts_at_configure() {
        let mut settings = ClientSettings::default().with_endpoint(refused_endpoint());
        settings.session.handshake_as_client = false;
        let outcome = Orchestrator::new(settings).run();
        match outcome {
            Outcome::Aborted { step, error } => {
                assert_eq!(step, Step::ConfigureTls1);
                assert!(error.is_tls_configuration());
            }
            Outcome::Shutdown(_) => panic!("option must be refused"),
        }
    }
}
