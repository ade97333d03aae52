use std::fmt;
use std::sync::Arc;

use chrono::{NaiveDateTime, TimeDelta};

use crate::diagnostics::Diagnostics;
use crate::error::AgentUpdateError;
use crate::fleet::archetype::{Archetype, ChargeWindow};
use crate::fleet::charging::{effective_power_kw, energy_kwh};
use crate::fleet::event::{Event, EventLog};

const SECONDS_PER_HOUR: f64 = 3600.0;

/// Stable identity of an agent within one population.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AgentId(pub usize);

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Charging state of an agent. There is no terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChargeState {
    NotCharging,
    Charging,
}

/// One simulated vehicle.
///
/// Holds a shared, read-only [`Archetype`] plus its own clock, state of
/// charge, charging flag and event log. The clock is driven from outside
/// (by the controller); every event the agent records is stamped with it.
///
/// # Power Flow Convention
/// Power draw is reported as a **positive** load in kW.
#[derive(Debug)]
pub struct Agent {
    id: AgentId,
    label: String,
    archetype: Arc<Archetype>,
    current_time: NaiveDateTime,
    current_charge_pct: f64,
    is_charging: bool,
    event_log: EventLog,
    diagnostics: Diagnostics,
}

impl Agent {
    /// Creates an agent at `start_time` with SOC at the archetype's
    /// plug-in level and records the initial SOC report.
    pub fn new(
        id: AgentId,
        archetype: Arc<Archetype>,
        start_time: NaiveDateTime,
        diagnostics: Diagnostics,
    ) -> Self {
        let label = format!("{}{}", archetype.name, id);
        let current_charge_pct = archetype.plug_in_soc_pct;
        let mut event_log = EventLog::new();
        event_log.append(Event::SocReported {
            at: start_time,
            soc_pct: current_charge_pct,
        });

        Self {
            id,
            label,
            archetype,
            current_time: start_time,
            current_charge_pct,
            is_charging: false,
            event_log,
            diagnostics,
        }
    }

    pub fn id(&self) -> AgentId {
        self.id
    }

    /// Human-readable identity used in logs and reports, e.g. `Commuter#3`.
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn archetype(&self) -> &Archetype {
        &self.archetype
    }

    pub fn current_time(&self) -> NaiveDateTime {
        self.current_time
    }

    pub fn set_current_time(&mut self, t: NaiveDateTime) {
        self.current_time = t;
    }

    pub fn current_charge_pct(&self) -> f64 {
        self.current_charge_pct
    }

    pub fn is_charging(&self) -> bool {
        self.is_charging
    }

    pub fn state(&self) -> ChargeState {
        if self.is_charging {
            ChargeState::Charging
        } else {
            ChargeState::NotCharging
        }
    }

    pub fn event_log(&self) -> &EventLog {
        &self.event_log
    }

    /// Plug-in/plug-out instants relevant to the current clock.
    pub fn charge_window(&self) -> ChargeWindow {
        self.archetype.window_at(self.current_time)
    }

    /// True iff the vehicle is plugged in and below its target SOC.
    pub fn should_be_charging(&self) -> bool {
        self.charge_window().contains(self.current_time)
            && self.current_charge_pct < self.archetype.target_soc_pct
    }

    /// Charger power after tapering for the current SOC.
    pub fn effective_power_kw(&self) -> f64 {
        effective_power_kw(self.archetype.charger_power_kw, self.current_charge_pct)
    }

    /// Energy still needed to reach the target SOC.
    ///
    /// # Errors
    ///
    /// `InvalidBatteryCapacity` for a non-positive capacity, and
    /// `TargetBelowCurrent` when the SOC has already passed the target.
    pub fn energy_to_target_kwh(&self) -> Result<f64, AgentUpdateError> {
        let capacity = self.battery_capacity_kwh()?;
        let target = self.archetype.target_soc_pct;
        if target < self.current_charge_pct {
            return Err(AgentUpdateError::TargetBelowCurrent {
                target_pct: target,
                current_pct: self.current_charge_pct,
            });
        }
        let needed = capacity * (target - self.current_charge_pct) / 100.0;
        self.diagnostics.debug(format_args!(
            "{}: {needed:.3} kWh required for target SOC",
            self.label
        ));
        Ok(needed)
    }

    /// Estimated time the target SOC is reached at the current charging rate.
    ///
    /// # Errors
    ///
    /// Propagates [`Agent::energy_to_target_kwh`] errors, returns
    /// `InvalidChargerPower` for a non-positive charger rating and
    /// `ProjectionOverflow` when the finish time cannot be represented.
    pub fn projected_finish(&self) -> Result<NaiveDateTime, AgentUpdateError> {
        let needed_kwh = self.energy_to_target_kwh()?;
        let charger_kw = self.archetype.charger_power_kw;
        if charger_kw <= 0.0 || !charger_kw.is_finite() {
            return Err(AgentUpdateError::InvalidChargerPower(charger_kw));
        }
        let hours = needed_kwh / self.effective_power_kw();
        let millis = (hours * SECONDS_PER_HOUR * 1000.0).round();
        if !millis.is_finite() || millis.abs() >= i64::MAX as f64 {
            return Err(AgentUpdateError::ProjectionOverflow { hours });
        }
        TimeDelta::try_milliseconds(millis as i64)
            .and_then(|offset| self.current_time.checked_add_signed(offset))
            .ok_or(AgentUpdateError::ProjectionOverflow { hours })
    }

    /// Projected finish while a session is running, `None` otherwise.
    pub fn will_finish_charging_at(&self) -> Option<NaiveDateTime> {
        if !self.is_charging {
            return None;
        }
        self.projected_finish().ok()
    }

    /// Enters the charging state, recording the start and a SOC snapshot.
    ///
    /// Idempotent: when already charging nothing is recorded.
    ///
    /// # Errors
    ///
    /// Fails, leaving the agent untouched, when the session cannot be
    /// projected (bad battery or charger, or SOC already past target).
    pub fn start_charging(&mut self) -> Result<(), AgentUpdateError> {
        if self.is_charging {
            self.diagnostics
                .debug(format_args!("{} is already charging", self.label));
            return Ok(());
        }

        let finish = self.projected_finish()?;
        self.is_charging = true;
        self.event_log.append(Event::ChargingStarted {
            at: self.current_time,
            soc_pct: self.current_charge_pct,
        });
        self.event_log.append(Event::SocReported {
            at: self.current_time,
            soc_pct: self.current_charge_pct,
        });
        self.diagnostics.info(format_args!(
            "{} started charging at {} ({:.2}%), expected to reach {:.1}% by {finish}",
            self.label, self.current_time, self.current_charge_pct, self.archetype.target_soc_pct
        ));
        Ok(())
    }

    /// Leaves the charging state, recording the stop and a SOC snapshot.
    ///
    /// Idempotent: when not charging nothing is recorded.
    pub fn stop_charging(&mut self) {
        if !self.is_charging {
            self.diagnostics
                .debug(format_args!("{} is already not charging", self.label));
            return;
        }

        self.is_charging = false;
        self.event_log.append(Event::ChargingStopped {
            at: self.current_time,
            soc_pct: self.current_charge_pct,
        });
        self.event_log.append(Event::SocReported {
            at: self.current_time,
            soc_pct: self.current_charge_pct,
        });
        self.diagnostics.info(format_args!(
            "{} stopped charging at {} ({:.2}%)",
            self.label, self.current_time, self.current_charge_pct
        ));
    }

    /// Integrates charging energy since the last SOC report.
    ///
    /// SOC is unchanged while not charging. No clamping is applied: a tick
    /// may carry SOC slightly past the target before the next decision
    /// stops the session.
    ///
    /// # Errors
    ///
    /// `InvalidBatteryCapacity`, `MissingSocReport` or `ClockRegression`;
    /// SOC is left as it was.
    pub fn update_soc(&mut self) -> Result<(), AgentUpdateError> {
        let capacity = self.battery_capacity_kwh()?;
        let last = self
            .event_log
            .last_soc_report()
            .ok_or(AgentUpdateError::MissingSocReport)?;
        let elapsed = self.current_time - last.at;
        if elapsed < TimeDelta::zero() {
            return Err(AgentUpdateError::ClockRegression {
                last: last.at,
                now: self.current_time,
            });
        }
        if !self.is_charging {
            return Ok(());
        }

        let hours = elapsed.num_milliseconds() as f64 / 1000.0 / SECONDS_PER_HOUR;
        let added_kwh = energy_kwh(self.effective_power_kw(), hours);
        self.current_charge_pct += 100.0 * added_kwh / capacity;
        self.diagnostics.debug(format_args!(
            "{}: last SOC {:.3}% at {}, +{added_kwh:.4} kWh over {elapsed}, now {:.3}%",
            self.label, last.soc_pct, last.at, self.current_charge_pct
        ));
        Ok(())
    }

    /// Per-tick observation: updates SOC, then records SOC, charging status
    /// and (while charging) power draw at the current time.
    ///
    /// # Errors
    ///
    /// Propagates [`Agent::update_soc`] errors; nothing is recorded then.
    pub fn report_tick(&mut self) -> Result<(), AgentUpdateError> {
        self.update_soc()?;
        let at = self.current_time;
        self.event_log.append(Event::SocReported {
            at,
            soc_pct: self.current_charge_pct,
        });
        self.event_log.append(Event::ChargeStatusReported {
            at,
            is_charging: self.is_charging,
        });
        if self.is_charging {
            self.event_log.append(Event::PowerDrawReported {
                at,
                power_kw: self.effective_power_kw(),
            });
        }
        self.diagnostics.debug(format_args!(
            "{} reporting SOC {:.3}% at {at}",
            self.label, self.current_charge_pct
        ));
        Ok(())
    }

    fn battery_capacity_kwh(&self) -> Result<f64, AgentUpdateError> {
        let capacity = self.archetype.battery_capacity_kwh;
        if capacity > 0.0 && capacity.is_finite() {
            Ok(capacity)
        } else {
            Err(AgentUpdateError::InvalidBatteryCapacity(capacity))
        }
    }
}
