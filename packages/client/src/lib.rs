//! # zrtt client
//!
//! Blocking TLS 1.3 client built around the connection-establishment and
//! 0-RTT state machine. A first connection performs a full handshake and
//! collects session tickets; a second connection to the same server resumes
//! the session and sends its request as early data.
//!
//! ## Features
//!
//! - **TLS 1.3 only** on top of rustls with the ring provider
//! - **Session resumption and 0-RTT** through a process-scoped session cache
//! - **Pluggable certificate verification**: chain validation, pinned
//!   identity, or accept-any for test servers
//! - **Bounded response reads** that flag truncation
//! - **Structured diagnostics** through `tracing`
//!
//! ## Usage
//!
//! ```no_run
//! use zrtt_client::{ClientSettings, Orchestrator, Outcome};
//!
//! let mut orchestrator = Orchestrator::new(ClientSettings::default());
//! match orchestrator.run() {
//!     Outcome::Shutdown(report) => println!("{}", report.early.response.text()),
//!     Outcome::Aborted { step, error } => eprintln!("{step}: {error}"),
//! }
//! ```

#![deny(unsafe_code)]
#![warn(clippy::all)]

pub mod config;
pub mod connect;
pub mod error;
pub mod orchestrator;
pub mod response;
pub mod telemetry;
pub mod tls;

pub use config::{
    ClientSettings, ConnectFailurePolicy, ConfigurationError, IoSettings, Payloads,
    ServerEndpoint, SessionOptions, TrailingBytePolicy, Validator, VerificationConfig,
    VerificationMode, VersionRange,
};
pub use error::{Error, Result};
pub use orchestrator::{Orchestrator, Outcome, PhaseReport, SessionReport, Step};
pub use response::{read_once, PollRecv, ReadOptions, Response};
pub use telemetry::{ConnectionStats, ConnectionStatsSnapshot};
pub use tls::{
    EarlyDataOutcome, HandshakeKind, HandshakeSummary, TlsEngine, TlsHandle, TlsParameters,
    VerificationStrategy,
};
