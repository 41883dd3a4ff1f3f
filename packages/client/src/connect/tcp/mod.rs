//! TCP transport
//!
//! Socket creation, address resolution and the blocking connect.

pub mod basic_connection;
pub mod dns_resolution;
pub mod socket;

pub use basic_connection::connect_with_policy;
pub use dns_resolution::resolve_address;
pub use socket::{open, AddressFamily, Readiness, SocketOptions, TransportSocket};
