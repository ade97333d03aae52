//! Agent-based electric-vehicle fleet charging simulator.

#[cfg(feature = "api")]
pub mod api;
pub mod config;
pub mod diagnostics;
pub mod error;
/// Vehicle archetypes, agents, events and the charging curve.
pub mod fleet;
pub mod io;
/// Clock, controller, simulator and run analytics.
pub mod sim;
