//! Connection establishment
//!
//! The two ways a configured session reaches the server: a connect followed
//! by a forced handshake, or a connect followed immediately by early data.

pub mod establish;
pub mod tcp;

pub use establish::{connect, connect_with_early_data, send, start_early_data};
