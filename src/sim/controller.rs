//! Population controller: advances every agent once per tick.

use chrono::NaiveDateTime;
use rayon::prelude::*;

use crate::diagnostics::Diagnostics;
use crate::error::AgentUpdateError;
use crate::fleet::Agent;

use super::types::{AgentFault, Sample, TickPhase};

/// A per-agent tick operation.
type AgentOp = fn(&mut Agent) -> Result<(), AgentUpdateError>;

/// Orchestrates a collection of agents.
///
/// Agents never read or mutate one another, so within a tick they can be
/// processed in any order, optionally fanned out across rayon's thread pool.
/// A failure in one agent is logged with its identity and the tick time and
/// never stops the others.
pub struct Controller {
    agents: Vec<Agent>,
    parallel: bool,
    diagnostics: Diagnostics,
}

impl Controller {
    pub fn new(agents: Vec<Agent>, diagnostics: Diagnostics) -> Self {
        Self {
            agents,
            parallel: false,
            diagnostics,
        }
    }

    /// Enables per-agent fan-out within each tick.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// Sets every clock to `t` and starts or stops charging as each agent's
    /// predicate dictates.
    ///
    /// # Returns
    ///
    /// The faults isolated during this pass (already logged).
    pub fn advance_charge_decisions(&mut self, t: NaiveDateTime) -> Vec<AgentFault> {
        self.for_each_agent(t, TickPhase::ChargeDecision, decide_charging)
    }

    /// Sets every clock to `t` and records each agent's tick report.
    ///
    /// # Returns
    ///
    /// The faults isolated during this pass (already logged).
    pub fn advance_soc(&mut self, t: NaiveDateTime) -> Vec<AgentFault> {
        self.for_each_agent(t, TickPhase::SocReport, Agent::report_tick)
    }

    fn for_each_agent(
        &mut self,
        t: NaiveDateTime,
        phase: TickPhase,
        op: AgentOp,
    ) -> Vec<AgentFault> {
        let faults: Vec<AgentFault> = if self.parallel {
            self.agents
                .par_iter_mut()
                .filter_map(|agent| apply(agent, t, phase, op))
                .collect()
        } else {
            self.agents
                .iter_mut()
                .filter_map(|agent| apply(agent, t, phase, op))
                .collect()
        };

        for fault in &faults {
            self.diagnostics.error(format_args!(
                "error in {} for agent {} at {}: {}",
                fault.phase, fault.label, fault.at, fault.error
            ));
        }
        faults
    }

    /// Every agent's SOC reports, tagged with the agent label.
    pub fn soc_samples(&self) -> Vec<Sample> {
        self.agents
            .iter()
            .flat_map(|agent| {
                agent.event_log().soc_reports().map(|r| Sample {
                    agent: agent.label().to_string(),
                    timestamp: r.at,
                    value: r.soc_pct,
                })
            })
            .collect()
    }

    /// Every agent's power-draw reports, tagged with the agent label.
    pub fn power_samples(&self) -> Vec<Sample> {
        self.agents
            .iter()
            .flat_map(|agent| {
                agent.event_log().power_draws().map(|r| Sample {
                    agent: agent.label().to_string(),
                    timestamp: r.at,
                    value: r.power_kw,
                })
            })
            .collect()
    }
}

fn apply(
    agent: &mut Agent,
    t: NaiveDateTime,
    phase: TickPhase,
    op: AgentOp,
) -> Option<AgentFault> {
    agent.set_current_time(t);
    op(agent).err().map(|error| AgentFault {
        agent: agent.id(),
        label: agent.label().to_string(),
        at: t,
        phase,
        error,
    })
}

fn decide_charging(agent: &mut Agent) -> Result<(), AgentUpdateError> {
    if agent.should_be_charging() {
        return agent.start_charging();
    }
    if agent.is_charging() {
        agent.stop_charging();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{NaiveDate, TimeDelta};
    use log::Level;

    use super::*;
    use crate::diagnostics::MemorySink;
    use crate::fleet::{AgentId, Archetype, ArchetypeRecord, EventKind};

    fn start() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn archetype(capacity: f64, plug_in: &str, plug_out: &str) -> Arc<Archetype> {
        let record = ArchetypeRecord {
            number: 1,
            name: "Test".to_string(),
            pcnt_population: 100.0,
            miles_per_year: 8000.0,
            battery_capacity_kwh: capacity,
            efficiency_miles_per_kwh: 3.5,
            plug_in_frequency_per_day: 1.0,
            charger_power_kw: 7.0,
            plug_in_time: plug_in.to_string(),
            plug_out_time: plug_out.to_string(),
            target_soc_pct: 80.0,
            kwh_per_year: 2285.0,
            kwh_per_plug_in: 6.3,
            plug_in_soc_pct: 20.0,
            soc_requirement_pct: 12.6,
            charging_duration_hr: 0.9,
        };
        Arc::new(Archetype::from_record(&record, &Diagnostics::silent()).unwrap())
    }

    fn controller(capacities: &[f64], diagnostics: Diagnostics) -> Controller {
        let agents = capacities
            .iter()
            .enumerate()
            .map(|(i, &c)| {
                Agent::new(
                    AgentId(i),
                    archetype(c, "00:00", "23:59"),
                    start(),
                    Diagnostics::silent(),
                )
            })
            .collect();
        Controller::new(agents, diagnostics)
    }

    #[test]
    fn decisions_start_charging_inside_window() {
        let mut c = controller(&[50.0, 60.0], Diagnostics::silent());
        let faults = c.advance_charge_decisions(start());
        assert!(faults.is_empty());
        assert!(c.agents().iter().all(Agent::is_charging));
    }

    #[test]
    fn decisions_stop_charging_outside_window() {
        let agent = Agent::new(
            AgentId(0),
            archetype(50.0, "01:00", "02:00"),
            start(),
            Diagnostics::silent(),
        );
        let mut c = Controller::new(vec![agent], Diagnostics::silent());

        c.advance_charge_decisions(start());
        assert!(!c.agents()[0].is_charging());

        c.advance_charge_decisions(start() + TimeDelta::minutes(90));
        assert!(c.agents()[0].is_charging());

        c.advance_charge_decisions(start() + TimeDelta::hours(3));
        assert!(!c.agents()[0].is_charging());
        let log = c.agents()[0].event_log();
        assert_eq!(log.filter_by_kind(EventKind::ChargingStopped).len(), 1);
    }

    #[test]
    fn failing_agent_is_isolated_and_logged() {
        let sink = MemorySink::new(Level::Error);
        let mut c = controller(
            &[50.0, 0.0, 50.0],
            Diagnostics::new("sim::controller", sink.clone()),
        );

        let t = start() + TimeDelta::minutes(15);
        let soc_faults = c.advance_soc(t);
        let decision_faults = c.advance_charge_decisions(t);

        assert_eq!(soc_faults.len(), 1);
        assert_eq!(decision_faults.len(), 1);
        assert_eq!(soc_faults[0].agent, AgentId(1));
        assert_eq!(soc_faults[0].phase, TickPhase::SocReport);
        assert_eq!(decision_faults[0].phase, TickPhase::ChargeDecision);

        assert!(c.agents()[0].is_charging());
        assert!(!c.agents()[1].is_charging());
        assert!(c.agents()[2].is_charging());

        let errors = sink.records();
        assert_eq!(errors.len(), 2);
        assert!(errors[0].message.contains("Test#1"));
        assert!(errors[0].message.contains(&t.to_string()));
    }

    #[test]
    fn parallel_matches_sequential() {
        let capacities = [40.0, 50.0, 0.0, 75.0, 100.0, 30.0];
        let mut seq = controller(&capacities, Diagnostics::silent());
        let mut par = controller(&capacities, Diagnostics::silent()).with_parallel(true);

        for i in 0..48 {
            let t = start() + TimeDelta::minutes(15 * i);
            let a = seq.advance_soc(t);
            let b = par.advance_soc(t);
            assert_eq!(a, b);
            seq.advance_charge_decisions(t);
            par.advance_charge_decisions(t);
        }

        assert_eq!(seq.soc_samples(), par.soc_samples());
        assert_eq!(seq.power_samples(), par.power_samples());
    }

    #[test]
    fn samples_carry_agent_labels() {
        let mut c = controller(&[50.0, 50.0], Diagnostics::silent());
        c.advance_charge_decisions(start());
        c.advance_soc(start() + TimeDelta::minutes(15));

        let soc = c.soc_samples();
        // initial + start snapshot + tick report, per agent
        assert_eq!(soc.len(), 6);
        assert_eq!(soc[0].agent, "Test#0");
        assert_eq!(soc[5].agent, "Test#1");

        let power = c.power_samples();
        assert_eq!(power.len(), 2);
        assert!(power.iter().all(|s| s.value > 0.0 && s.value < 7.0));
    }
}
