//! Simulator that drives the controller across the configured time range.

use crate::diagnostics::Diagnostics;

use super::clock::Clock;
use super::controller::Controller;
use super::types::{AgentFault, RunInfo, SimConfig};

/// Outcome of [`Simulator::run`].
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    /// Ticks executed.
    pub ticks: usize,
    /// Every isolated per-agent failure, in the order it happened.
    pub faults: Vec<AgentFault>,
}

/// Owns the controller and the run timing.
///
/// Each tick first records every agent's SOC report and then re-evaluates
/// charging decisions at the same instant. A session that starts at tick
/// *n* therefore contributes energy from tick *n + 1* on, and a session
/// that stops records its final SOC snapshot at the stop instant.
pub struct Simulator {
    config: SimConfig,
    controller: Controller,
    diagnostics: Diagnostics,
}

impl Simulator {
    pub fn new(config: SimConfig, controller: Controller, diagnostics: Diagnostics) -> Self {
        Self {
            config,
            controller,
            diagnostics,
        }
    }

    /// Executes all ticks in `[start, end)`.
    pub fn run(&mut self) -> RunSummary {
        let total = self.config.total_ticks();
        let report_every = (total / 10).max(1);
        let mut summary = RunSummary::default();
        let mut clock = Clock::from_config(&self.config);

        self.diagnostics.info(format_args!(
            "simulating {} agents from {} to {} ({} ticks of {})",
            self.controller.len(),
            self.config.start,
            self.config.end,
            total,
            self.config.tick
        ));

        let controller = &mut self.controller;
        let diagnostics = &self.diagnostics;
        clock.run(|t| {
            summary.faults.extend(controller.advance_soc(t));
            summary.faults.extend(controller.advance_charge_decisions(t));
            summary.ticks += 1;

            if summary.ticks % report_every == 0 {
                let progress = 100.0 * summary.ticks as f64 / total as f64;
                diagnostics.info(format_args!("completed {progress:06.2}% (t = {t})"));
            }
        });

        if !summary.faults.is_empty() {
            self.diagnostics.warn(format_args!(
                "{} agent updates failed and were skipped",
                summary.faults.len()
            ));
        }
        summary
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn controller(&self) -> &Controller {
        &self.controller
    }

    pub fn into_controller(self) -> Controller {
        self.controller
    }

    pub fn run_info(&self) -> RunInfo {
        RunInfo {
            start: self.config.start,
            end: self.config.end,
            tick_seconds: self.config.tick.num_seconds(),
            ticks: self.config.total_ticks(),
            agents: self.controller.len(),
        }
    }
}
