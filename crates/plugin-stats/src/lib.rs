//! Host statistics for Dockhand.
//!
//! Answers the controller's questions about the machine the daemon runs on:
//! CPU, memory, load, host identity, network throughput and disk usage.

pub mod plugin;
pub mod report;

pub use plugin::StatsPlugin;
