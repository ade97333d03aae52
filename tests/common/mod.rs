//! Shared test fixtures for integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use ev_fleet_sim::diagnostics::Diagnostics;
use ev_fleet_sim::fleet::{Agent, AgentId, Archetype, ArchetypeRecord};
use ev_fleet_sim::sim::controller::Controller;
use ev_fleet_sim::sim::simulator::{RunSummary, Simulator};
use ev_fleet_sim::sim::types::SimConfig;

/// Midnight, 2024-01-01.
pub fn start() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

/// 50 kWh / 7 kW archetype plugged in all day, charging 20% → 80%.
pub fn day_long_record() -> ArchetypeRecord {
    ArchetypeRecord {
        number: 1,
        name: "Commuter".to_string(),
        pcnt_population: 100.0,
        miles_per_year: 8000.0,
        battery_capacity_kwh: 50.0,
        efficiency_miles_per_kwh: 3.5,
        plug_in_frequency_per_day: 1.0,
        charger_power_kw: 7.0,
        plug_in_time: "00:00".to_string(),
        plug_out_time: "23:59".to_string(),
        target_soc_pct: 80.0,
        kwh_per_year: 2285.7,
        kwh_per_plug_in: 6.26,
        plug_in_soc_pct: 20.0,
        soc_requirement_pct: 12.5,
        charging_duration_hr: 0.9,
    }
}

/// Overnight archetype plugging in at 10:00 PM and out at 6:00 AM.
pub fn overnight_record() -> ArchetypeRecord {
    ArchetypeRecord {
        name: "Night".to_string(),
        plug_in_time: "10:00 PM".to_string(),
        plug_out_time: "6:00 AM".to_string(),
        ..day_long_record()
    }
}

pub fn archetype(record: &ArchetypeRecord) -> Arc<Archetype> {
    Arc::new(Archetype::from_record(record, &Diagnostics::silent()).unwrap())
}

pub fn agent(id: usize, record: &ArchetypeRecord) -> Agent {
    Agent::new(AgentId(id), archetype(record), start(), Diagnostics::silent())
}

/// Runs `agents` from [`start`] for `hours` at `tick_minutes`.
pub fn run(
    agents: Vec<Agent>,
    hours: i64,
    tick_minutes: i64,
    diagnostics: Diagnostics,
) -> (Simulator, RunSummary) {
    let config = SimConfig::new(
        start(),
        start() + TimeDelta::hours(hours),
        TimeDelta::minutes(tick_minutes),
    );
    let controller = Controller::new(agents, diagnostics.clone());
    let mut sim = Simulator::new(config, controller, diagnostics);
    let summary = sim.run();
    (sim, summary)
}
