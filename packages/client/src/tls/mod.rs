//! TLS layer
//!
//! Engine lifetime, per-session configuration, certificate verification and
//! the connection handle that drives a rustls client session over a
//! transport socket.

pub mod engine;
pub mod errors;
pub mod handle;
pub mod handshake;
pub mod session_cache;
pub mod session_config;
pub mod verifier;

pub use engine::TlsEngine;
pub use errors::{ConfigureKind, SessionOption, TlsError};
pub use handle::TlsHandle;
pub use handshake::{EarlyDataOutcome, HandshakeKind, HandshakeSignal, HandshakeSummary};
pub use session_cache::SessionCache;
pub use session_config::{configure, ConfigureError, TlsParameters};
pub use verifier::{fingerprint, parse_pin, Fingerprint, VerificationStrategy};
