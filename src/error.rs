//! Error types shared across configuration, agents, and the controller.

use chrono::NaiveDateTime;
use thiserror::Error;

/// Configuration error with field path and constraint description.
///
/// Fatal: raised before a run starts (bad time strings, non-numeric fields,
/// population shares that do not add up to 100).
#[derive(Debug, Clone, PartialEq, Error)]
#[error("config error: {field}: {message}")]
pub struct ConfigError {
    /// Dotted field path (e.g., `"archetype[2].plug_in_time"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl ConfigError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Recoverable failure while advancing one agent by one tick.
///
/// The failing call leaves the agent exactly as it was before the call.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AgentUpdateError {
    #[error("battery capacity must be > 0 kWh, got {0}")]
    InvalidBatteryCapacity(f64),

    #[error("charger power must be > 0 kW, got {0}")]
    InvalidChargerPower(f64),

    #[error("event log has no prior SOC report")]
    MissingSocReport,

    #[error("clock moved backwards: last SOC report at {last}, current time {now}")]
    ClockRegression {
        last: NaiveDateTime,
        now: NaiveDateTime,
    },

    #[error("target SOC {target_pct:.2}% is below current SOC {current_pct:.2}%")]
    TargetBelowCurrent { target_pct: f64, current_pct: f64 },

    #[error("projected charging time of {hours} h is outside the representable time range")]
    ProjectionOverflow { hours: f64 },
}
