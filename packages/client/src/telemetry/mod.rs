//! Connection telemetry

pub mod connection_stats;

pub use connection_stats::{ConnectionStats, ConnectionStatsSnapshot};
