//! Expands archetypes into a population of independent agents.

use std::sync::Arc;

use chrono::NaiveDateTime;

use crate::diagnostics::Diagnostics;
use crate::error::ConfigError;
use crate::fleet::archetype::check_population_shares;
use crate::fleet::{Agent, AgentId, Archetype};

/// Number of agents an archetype contributes to a fleet of `total`.
///
/// Rounds up, so the built population can exceed `total` slightly.
pub fn agent_count(total: usize, pcnt_population: f64) -> usize {
    (total as f64 * pcnt_population / 100.0).ceil().max(0.0) as usize
}

/// Builds `ceil(total × share / 100)` fresh agents per archetype.
///
/// Each agent is constructed from scratch with its own event log; only the
/// immutable archetype is shared.
///
/// # Errors
///
/// Returns a `ConfigError` if the archetype shares do not sum to 100.
pub fn build_population(
    archetypes: Vec<Archetype>,
    total: usize,
    start: NaiveDateTime,
    diagnostics: &Diagnostics,
) -> Result<Vec<Agent>, ConfigError> {
    check_population_shares(&archetypes)?;

    let mut agents = Vec::new();
    for archetype in archetypes {
        let count = agent_count(total, archetype.pcnt_population);
        diagnostics.info(format_args!(
            "{} agents of archetype {} ({}%)",
            count, archetype.name, archetype.pcnt_population
        ));
        let shared = Arc::new(archetype);
        for _ in 0..count {
            let id = AgentId(agents.len());
            agents.push(Agent::new(
                id,
                Arc::clone(&shared),
                start,
                diagnostics.scoped("ev_fleet_sim::agent"),
            ));
        }
    }
    Ok(agents)
}
