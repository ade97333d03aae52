//! API response and query types.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::sim::kpi::FleetKpi;
use crate::sim::load::{EnergyBucket, LoadPoint};
use crate::sim::types::{RunInfo, Sample};

/// Run metadata plus fleet KPIs.
#[derive(Debug, Serialize)]
pub struct StateResponse {
    pub run: RunInfo,
    pub kpi: FleetKpi,
}

/// Fleet load series and its hourly energy integration.
#[derive(Debug, Serialize)]
pub struct LoadResponse {
    pub points: Vec<LoadPoint>,
    pub hourly_energy: Vec<EnergyBucket>,
}

/// Optional filters for the sample endpoints.
///
/// Timestamps use the ISO form `2024-01-01T06:00:00`.
#[derive(Debug, Default, Deserialize)]
pub struct SampleQuery {
    /// Agent label, e.g. `Commuter#3`.
    pub agent: Option<String>,
    /// Earliest timestamp (inclusive).
    pub from: Option<NaiveDateTime>,
    /// Latest timestamp (inclusive).
    pub to: Option<NaiveDateTime>,
}

impl SampleQuery {
    /// Returns the samples matching every filter that is set.
    pub fn apply(&self, samples: &[Sample]) -> Vec<Sample> {
        samples
            .iter()
            .filter(|s| self.agent.as_deref().is_none_or(|a| s.agent == a))
            .filter(|s| self.from.is_none_or(|from| s.timestamp >= from))
            .filter(|s| self.to.is_none_or(|to| s.timestamp <= to))
            .cloned()
            .collect()
    }
}

/// Error response body for 400-class errors.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Human-readable error message.
    pub error: String,
}
