//! Post-hoc fleet KPIs computed from a finished run.

use std::fmt;

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::fleet::EventKind;

use super::controller::Controller;
use super::load::LoadProfile;
use super::simulator::RunSummary;

/// Aggregate indicators for a complete simulation run.
///
/// Computed post-hoc from the agents' event logs so reported metrics are
/// always consistent with the exported event data.
#[derive(Debug, Clone, Serialize)]
pub struct FleetKpi {
    /// Number of agents simulated.
    pub agents: usize,
    /// Highest aggregate charging load (kW).
    pub peak_load_kw: f64,
    /// When the peak occurred, if any agent charged at all.
    pub peak_load_at: Option<NaiveDateTime>,
    /// Energy delivered to the whole fleet (kWh).
    pub total_energy_kwh: f64,
    /// Mean SOC at the end of the run (%).
    pub mean_final_soc_pct: f64,
    /// Agents whose SOC reached their target.
    pub agents_at_target: usize,
    /// Charging sessions started across the fleet.
    pub sessions_started: usize,
    /// Per-agent failures isolated by the controller.
    pub fault_count: usize,
}

impl FleetKpi {
    /// Computes all KPIs.
    ///
    /// # Arguments
    ///
    /// * `controller` - Controller holding the agents after the run
    /// * `summary` - Summary returned by the run
    /// * `tick_hours` - Tick duration in hours, for energy integration
    pub fn from_run(controller: &Controller, summary: &RunSummary, tick_hours: f64) -> Self {
        let profile = LoadProfile::from_samples(&controller.power_samples());
        let peak = profile.peak();
        let agents = controller.agents();

        let mean_final_soc_pct = if agents.is_empty() {
            0.0
        } else {
            agents.iter().map(|a| a.current_charge_pct()).sum::<f64>() / agents.len() as f64
        };

        Self {
            agents: agents.len(),
            peak_load_kw: peak.map_or(0.0, |p| p.load_kw),
            peak_load_at: peak.map(|p| p.timestamp),
            total_energy_kwh: profile.energy_kwh(tick_hours),
            mean_final_soc_pct,
            agents_at_target: agents
                .iter()
                .filter(|a| a.current_charge_pct() >= a.archetype().target_soc_pct)
                .count(),
            sessions_started: agents
                .iter()
                .map(|a| a.event_log().filter_by_kind(EventKind::ChargingStarted).len())
                .sum(),
            fault_count: summary.faults.len(),
        }
    }
}

impl fmt::Display for FleetKpi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Fleet KPI Report ---")?;
        writeln!(f, "Agents simulated:      {}", self.agents)?;
        match self.peak_load_at {
            Some(at) => writeln!(f, "Peak fleet load:       {:.2} kW at {at}", self.peak_load_kw)?,
            None => writeln!(f, "Peak fleet load:       0.00 kW (no charging)")?,
        }
        writeln!(f, "Energy delivered:      {:.2} kWh", self.total_energy_kwh)?;
        writeln!(f, "Mean final SOC:        {:.1}%", self.mean_final_soc_pct)?;
        writeln!(
            f,
            "Agents at target:      {}/{}",
            self.agents_at_target, self.agents
        )?;
        writeln!(f, "Sessions started:      {}", self.sessions_started)?;
        write!(f, "Isolated agent faults: {}", self.fault_count)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{NaiveDate, TimeDelta};

    use super::*;
    use crate::diagnostics::Diagnostics;
    use crate::fleet::{Agent, AgentId, Archetype, ArchetypeRecord};

    fn start() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn agent(id: usize, plug_in_soc: f64) -> Agent {
        let record = ArchetypeRecord {
            number: 1,
            name: "Kpi".to_string(),
            pcnt_population: 100.0,
            miles_per_year: 8000.0,
            battery_capacity_kwh: 50.0,
            efficiency_miles_per_kwh: 3.5,
            plug_in_frequency_per_day: 1.0,
            charger_power_kw: 7.0,
            plug_in_time: "00:00".to_string(),
            plug_out_time: "23:59".to_string(),
            target_soc_pct: 80.0,
            kwh_per_year: 2285.0,
            kwh_per_plug_in: 6.3,
            plug_in_soc_pct: plug_in_soc,
            soc_requirement_pct: 12.6,
            charging_duration_hr: 0.9,
        };
        let archetype = Arc::new(Archetype::from_record(&record, &Diagnostics::silent()).unwrap());
        Agent::new(AgentId(id), archetype, start(), Diagnostics::silent())
    }

    #[test]
    fn empty_fleet_is_all_zero() {
        let controller = Controller::new(Vec::new(), Diagnostics::silent());
        let kpi = FleetKpi::from_run(&controller, &RunSummary::default(), 0.25);
        assert_eq!(kpi.agents, 0);
        assert_eq!(kpi.peak_load_kw, 0.0);
        assert!(kpi.peak_load_at.is_none());
        assert_eq!(kpi.mean_final_soc_pct, 0.0);
        assert!(!kpi.to_string().is_empty());
    }

    #[test]
    fn counts_sessions_targets_and_energy() {
        let mut controller = Controller::new(
            vec![agent(0, 20.0), agent(1, 85.0)],
            Diagnostics::silent(),
        );
        controller.advance_charge_decisions(start());
        controller.advance_soc(start() + TimeDelta::minutes(15));

        let kpi = FleetKpi::from_run(&controller, &RunSummary::default(), 0.25);
        assert_eq!(kpi.agents, 2);
        assert_eq!(kpi.sessions_started, 1);
        assert_eq!(kpi.agents_at_target, 1);
        assert_eq!(kpi.peak_load_at, Some(start() + TimeDelta::minutes(15)));
        assert!((kpi.total_energy_kwh - kpi.peak_load_kw * 0.25).abs() < 1e-12);
        assert_eq!(kpi.fault_count, 0);
    }
}
