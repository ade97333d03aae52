//! Fleet-level load aggregation from per-agent power samples.

use std::collections::BTreeMap;

use chrono::{NaiveDateTime, TimeDelta};
use serde::Serialize;

use super::types::Sample;

/// Summed fleet power draw at one tick instant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadPoint {
    pub timestamp: NaiveDateTime,
    /// Total power drawn by all charging agents (kW, positive).
    pub load_kw: f64,
    /// Number of agents drawing power at this instant.
    pub charging_agents: usize,
}

/// Energy delivered to the fleet in one fixed-width bucket.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnergyBucket {
    /// Bucket start (inclusive).
    pub start: NaiveDateTime,
    pub energy_kwh: f64,
}

/// Time series of aggregate fleet load, one point per reporting instant.
#[derive(Debug, Clone, Default)]
pub struct LoadProfile {
    points: Vec<LoadPoint>,
}

impl LoadProfile {
    /// Sums power samples that share a timestamp.
    pub fn from_samples(power: &[Sample]) -> Self {
        let mut by_time: BTreeMap<NaiveDateTime, (f64, usize)> = BTreeMap::new();
        for s in power {
            let entry = by_time.entry(s.timestamp).or_insert((0.0, 0));
            entry.0 += s.value;
            entry.1 += 1;
        }
        let points = by_time
            .into_iter()
            .map(|(timestamp, (load_kw, charging_agents))| LoadPoint {
                timestamp,
                load_kw,
                charging_agents,
            })
            .collect();
        Self { points }
    }

    /// Points in chronological order.
    pub fn points(&self) -> &[LoadPoint] {
        &self.points
    }

    /// Highest aggregate load; the earliest one on ties.
    pub fn peak(&self) -> Option<&LoadPoint> {
        self.points.iter().fold(None, |best: Option<&LoadPoint>, p| match best {
            Some(b) if b.load_kw >= p.load_kw => Some(b),
            _ => Some(p),
        })
    }

    /// Total energy, treating each point's load as held for one tick.
    pub fn energy_kwh(&self, tick_hours: f64) -> f64 {
        self.points.iter().map(|p| p.load_kw * tick_hours).sum()
    }

    /// Integrates energy into `bucket`-wide slots counted from `origin`.
    ///
    /// Empty slots between the first and last non-empty ones are kept with
    /// zero energy so the series is evenly spaced.
    ///
    /// # Panics
    ///
    /// Panics if `bucket` is not strictly positive.
    pub fn bucketed_energy(
        &self,
        origin: NaiveDateTime,
        tick: TimeDelta,
        bucket: TimeDelta,
    ) -> Vec<EnergyBucket> {
        assert!(bucket > TimeDelta::zero(), "bucket must be > 0");
        let tick_hours = tick.num_milliseconds() as f64 / 3_600_000.0;
        let bucket_ms = bucket.num_milliseconds();

        let mut slots: BTreeMap<i64, f64> = BTreeMap::new();
        for p in &self.points {
            let idx = (p.timestamp - origin).num_milliseconds().div_euclid(bucket_ms);
            *slots.entry(idx).or_insert(0.0) += p.load_kw * tick_hours;
        }

        let (Some(&first), Some(&last)) = (slots.keys().next(), slots.keys().next_back()) else {
            return Vec::new();
        };
        (first..=last)
            .map(|idx| EnergyBucket {
                start: origin + TimeDelta::milliseconds(idx * bucket_ms),
                energy_kwh: slots.get(&idx).copied().unwrap_or(0.0),
            })
            .collect()
    }
}
