use super::step::Step;
use crate::error::Error;
use crate::response::Response;
use crate::telemetry::ConnectionStatsSnapshot;
use crate::tls::{EarlyDataOutcome, HandshakeSummary};

#[derive(Debug, Clone)]
pub struct PhaseReport {
    pub response: Response,
    /// `None` only if the handshake had not finished when the reply arrived.
    pub handshake: Option<HandshakeSummary>,
}

impl PhaseReport {
    #[must_use]
    pub fn early_data(&self) -> EarlyDataOutcome {
        self.handshake
            .as_ref()
            .map_or(EarlyDataOutcome::NotAttempted, |h| h.early_data)
    }
}

#[derive(Debug, Clone)]
pub struct SessionReport {
    pub full: PhaseReport,
    pub early: PhaseReport,
    pub stats: ConnectionStatsSnapshot,
    /// Session tickets received over both phases.
    pub tickets_stored: usize,
    pub trail: Vec<Step>,
}

#[derive(Debug)]
pub enum Outcome {
    Shutdown(SessionReport),
    Aborted { step: Step, error: Error },
}

impl Outcome {
    #[must_use]
    pub fn is_shutdown(&self) -> bool {
        matches!(self, Outcome::Shutdown(_))
    }

    /// Process exit status: 0 after a clean shutdown, 1 otherwise.
    #[must_use]
    pub fn exit_code(&self) -> u8 {
        match self {
            Outcome::Shutdown(_) => 0,
            Outcome::Aborted { .. } => 1,
        }
    }
}
