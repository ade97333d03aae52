//! Per-agent event records and the append-only log that holds them.

use chrono::NaiveDateTime;
use serde::Serialize;

/// Discriminant of an [`Event`], used for filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum EventKind {
    ChargingStarted,
    ChargingStopped,
    SocReported,
    ChargeStatusReported,
    PowerDrawReported,
}

/// Something that happened to one agent at one instant.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind")]
pub enum Event {
    ChargingStarted { at: NaiveDateTime, soc_pct: f64 },
    ChargingStopped { at: NaiveDateTime, soc_pct: f64 },
    SocReported { at: NaiveDateTime, soc_pct: f64 },
    ChargeStatusReported { at: NaiveDateTime, is_charging: bool },
    PowerDrawReported { at: NaiveDateTime, power_kw: f64 },
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::ChargingStarted { .. } => EventKind::ChargingStarted,
            Event::ChargingStopped { .. } => EventKind::ChargingStopped,
            Event::SocReported { .. } => EventKind::SocReported,
            Event::ChargeStatusReported { .. } => EventKind::ChargeStatusReported,
            Event::PowerDrawReported { .. } => EventKind::PowerDrawReported,
        }
    }

    pub fn timestamp(&self) -> NaiveDateTime {
        match *self {
            Event::ChargingStarted { at, .. }
            | Event::ChargingStopped { at, .. }
            | Event::SocReported { at, .. }
            | Event::ChargeStatusReported { at, .. }
            | Event::PowerDrawReported { at, .. } => at,
        }
    }
}

/// A SOC observation extracted from the log.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SocReading {
    pub at: NaiveDateTime,
    pub soc_pct: f64,
}

/// A power-draw observation extracted from the log.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PowerReading {
    pub at: NaiveDateTime,
    pub power_kw: f64,
}

/// Chronological, append-only event history of a single agent.
///
/// Only the owning agent appends, stamping events with its own clock, so
/// insertion order is chronological order. There is no way to remove or
/// edit an entry.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Vec<Event>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Most recent SOC report, scanning from the tail.
    ///
    /// `None` means no report exists yet, which cannot happen for a log
    /// owned by an initialised agent.
    pub fn last_soc_report(&self) -> Option<SocReading> {
        self.events.iter().rev().find_map(|e| match *e {
            Event::SocReported { at, soc_pct } => Some(SocReading { at, soc_pct }),
            _ => None,
        })
    }

    /// All events of `kind`, oldest first.
    pub fn filter_by_kind(&self, kind: EventKind) -> Vec<&Event> {
        self.events.iter().filter(|e| e.kind() == kind).collect()
    }

    /// Charging start/stop events, oldest first.
    pub fn charge_events(&self) -> Vec<&Event> {
        self.events
            .iter()
            .filter(|e| {
                matches!(
                    e.kind(),
                    EventKind::ChargingStarted | EventKind::ChargingStopped
                )
            })
            .collect()
    }

    pub fn soc_reports(&self) -> impl Iterator<Item = SocReading> + '_ {
        self.events.iter().filter_map(|e| match *e {
            Event::SocReported { at, soc_pct } => Some(SocReading { at, soc_pct }),
            _ => None,
        })
    }

    pub fn power_draws(&self) -> impl Iterator<Item = PowerReading> + '_ {
        self.events.iter().filter_map(|e| match *e {
            Event::PowerDrawReported { at, power_kw } => Some(PowerReading { at, power_kw }),
            _ => None,
        })
    }
}
