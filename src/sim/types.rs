//! Core simulation types: run timing and per-tick fault records.

use std::fmt;

use chrono::{NaiveDateTime, TimeDelta};
use serde::Serialize;

use crate::error::AgentUpdateError;
use crate::fleet::AgentId;

/// Simulated time range and tick size.
///
/// # Examples
///
/// ```
/// use chrono::{NaiveDate, TimeDelta};
/// use ev_fleet_sim::sim::types::SimConfig;
///
/// let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
/// let cfg = SimConfig::new(start, start + TimeDelta::hours(24), TimeDelta::minutes(15));
/// assert_eq!(cfg.total_ticks(), 96);
/// assert_eq!(cfg.tick_hours(), 0.25);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimConfig {
    /// First tick instant (inclusive).
    pub start: NaiveDateTime,
    /// End of the run (exclusive; no tick runs exactly at `end`).
    pub end: NaiveDateTime,
    /// Fixed step between ticks.
    pub tick: TimeDelta,
}

impl SimConfig {
    /// Creates a new simulation configuration.
    ///
    /// # Panics
    ///
    /// Panics if `tick` is not strictly positive.
    pub fn new(start: NaiveDateTime, end: NaiveDateTime, tick: TimeDelta) -> Self {
        assert!(tick > TimeDelta::zero(), "tick must be > 0");
        Self { start, end, tick }
    }

    /// Number of ticks the run will execute.
    pub fn total_ticks(&self) -> usize {
        if self.end <= self.start {
            return 0;
        }
        let span = (self.end - self.start).num_milliseconds();
        let tick = self.tick.num_milliseconds().max(1);
        ((span + tick - 1) / tick) as usize
    }

    /// Duration of one tick in hours.
    pub fn tick_hours(&self) -> f64 {
        self.tick.num_milliseconds() as f64 / 3_600_000.0
    }
}

/// Serializable summary of a run's timing, used by reports and the API.
#[derive(Debug, Clone, Serialize)]
pub struct RunInfo {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub tick_seconds: i64,
    pub ticks: usize,
    pub agents: usize,
}

/// One `(agent, timestamp, value)` observation handed to reporting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sample {
    pub agent: String,
    pub timestamp: NaiveDateTime,
    pub value: f64,
}

/// Which half of a tick an isolated failure happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickPhase {
    ChargeDecision,
    SocReport,
}

impl fmt::Display for TickPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TickPhase::ChargeDecision => write!(f, "charge decision"),
            TickPhase::SocReport => write!(f, "SOC report"),
        }
    }
}

/// A per-agent failure the controller caught and skipped past.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentFault {
    pub agent: AgentId,
    pub label: String,
    pub at: NaiveDateTime,
    pub phase: TickPhase,
    pub error: AgentUpdateError,
}

impl fmt::Display for AgentFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} failed during {} at {}: {}",
            self.label, self.phase, self.at, self.error
        )
    }
}
