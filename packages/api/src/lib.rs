//! zrtt public API
//!
//! Facade over `zrtt_client`: re-exports, logging setup and the `run` entry
//! point used by the `zrtt` binary.

#![deny(unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]

pub mod logging;

use std::io::{self, Write};

pub use logging::init_logging;
pub use zrtt_client::{
    ClientSettings, ConnectFailurePolicy, EarlyDataOutcome, Error, Orchestrator, Outcome,
    PhaseReport, Response, ServerEndpoint, SessionReport, Step, TrailingBytePolicy, Validator,
    VerificationMode,
};

/// Exit status when the replies could not be written out.
pub const OUTPUT_FAILED: u8 = 3;

/// Run the two-phase lifecycle and print both server replies to `out`.
///
/// Returns the process exit status: 0 after a clean shutdown, 1 when a step
/// aborted, [`OUTPUT_FAILED`] when writing to `out` failed.
pub fn run(settings: ClientSettings, out: &mut impl Write) -> u8 {
    let mut orchestrator = Orchestrator::new(settings);
    let outcome = orchestrator.run();

    match print_outcome(out, &outcome) {
        Ok(()) => outcome.exit_code(),
        Err(e) => {
            tracing::error!(error = %e, "writing the outcome failed");
            OUTPUT_FAILED
        }
    }
}

fn print_outcome(out: &mut impl Write, outcome: &Outcome) -> io::Result<()> {
    match outcome {
        Outcome::Shutdown(report) => {
            for phase in [&report.full, &report.early] {
                print_response(out, phase)?;
            }
            tracing::info!(
                tickets = report.tickets_stored,
                early_data = ?report.early.early_data(),
                "shutdown complete"
            );
        }
        Outcome::Aborted { step, error } => {
            let code = error
                .code()
                .map_or_else(String::new, |code| format!(" (code {code})"));
            writeln!(out, "{step} failed: {error}{code}")?;
        }
    }
    out.flush()
}

fn print_response(out: &mut impl Write, phase: &PhaseReport) -> io::Result<()> {
    writeln!(out, "<<< server says:\n{}", phase.response.text())?;
    if phase.response.truncated {
        writeln!(out, "<<< (response truncated)")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::net::TcpListener;

    use super::*;

    struct ClosedPipe;

    impl Write for ClosedPipe {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::ErrorKind::BrokenPipe.into())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn unreachable_settings() -> ClientSettings {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let port = listener.local_addr().expect("addr").port();
        drop(listener);

        let mut settings =
            ClientSettings::default().with_endpoint(ServerEndpoint::new("localhost", "127.0.0.1", port));
        settings.verification.mode = VerificationMode::AcceptAny;
        settings
    }

    #[test]
    fn failed_output_is_a_distinct_status() {
        assert_eq!(run(unreachable_settings(), &mut ClosedPipe), OUTPUT_FAILED);
    }

    #[test]
    fn aborted_run_names_the_step() {
        let mut out = Vec::new();
        assert_eq!(run(unreachable_settings(), &mut out), 1);
        let printed = String::from_utf8(out).expect("utf8");
        assert!(printed.starts_with("CONNECT_1 failed: TLS handshake failed"), "{printed}");
    }
}
