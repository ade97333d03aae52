//! End-to-end charging session over one simulated day.

mod common;

use ev_fleet_sim::diagnostics::Diagnostics;
use ev_fleet_sim::fleet::{Event, EventKind};

use chrono::TimeDelta;

#[test]
fn session_reaches_target_then_stops() {
    let agent = common::agent(0, &common::day_long_record());
    let (sim, summary) = common::run(vec![agent], 24, 15, Diagnostics::silent());
    assert_eq!(summary.ticks, 96);
    assert!(summary.faults.is_empty());

    let agent = &sim.controller().agents()[0];
    let log = agent.event_log();
    assert!(agent.current_charge_pct() >= 80.0);
    assert!(!agent.is_charging());
    assert!(!agent.should_be_charging());

    let charge_events = log.charge_events();
    assert_eq!(charge_events.len(), 2);
    assert_eq!(charge_events[0].kind(), EventKind::ChargingStarted);
    assert_eq!(charge_events[1].kind(), EventKind::ChargingStopped);
}

#[test]
fn no_power_draw_after_stop() {
    let agent = common::agent(0, &common::day_long_record());
    let (sim, _) = common::run(vec![agent], 24, 15, Diagnostics::silent());
    let log = sim.controller().agents()[0].event_log();

    let stop_idx = log
        .events()
        .iter()
        .position(|e| e.kind() == EventKind::ChargingStopped)
        .unwrap();
    let after_stop = &log.events()[stop_idx + 1..];
    assert!(!after_stop.is_empty());
    assert!(
        after_stop
            .iter()
            .all(|e| e.kind() != EventKind::PowerDrawReported)
    );
    assert!(after_stop.iter().all(|e| !matches!(
        e,
        Event::ChargeStatusReported {
            is_charging: true,
            ..
        }
    )));
}

#[test]
fn soc_is_monotonic_and_flat_after_stop() {
    let agent = common::agent(0, &common::day_long_record());
    let (sim, _) = common::run(vec![agent], 24, 15, Diagnostics::silent());
    let log = sim.controller().agents()[0].event_log();

    let readings: Vec<_> = log.soc_reports().collect();
    assert!(readings.windows(2).all(|w| w[1].soc_pct >= w[0].soc_pct));
    assert!(readings.windows(2).all(|w| w[1].at >= w[0].at));

    let stopped_at = log.filter_by_kind(EventKind::ChargingStopped)[0].timestamp();
    let final_soc = readings.last().unwrap().soc_pct;
    assert!(
        readings
            .iter()
            .filter(|r| r.at >= stopped_at)
            .all(|r| r.soc_pct == final_soc)
    );
}

#[test]
fn overshoot_is_bounded_by_one_tick() {
    let agent = common::agent(0, &common::day_long_record());
    let (sim, _) = common::run(vec![agent], 24, 15, Diagnostics::silent());
    let soc = sim.controller().agents()[0].current_charge_pct();

    // SOC is not clamped: at most one tick at nominal power past the target.
    let max_step_pct = 100.0 * 7.0 * 0.25 / 50.0;
    assert!(soc >= 80.0);
    assert!(soc < 80.0 + max_step_pct);
}

#[test]
fn first_power_draw_is_one_tick_after_start() {
    let agent = common::agent(0, &common::day_long_record());
    let (sim, _) = common::run(vec![agent], 24, 15, Diagnostics::silent());
    let log = sim.controller().agents()[0].event_log();

    let started_at = log.filter_by_kind(EventKind::ChargingStarted)[0].timestamp();
    assert_eq!(started_at, common::start());
    let first_draw = log.power_draws().next().unwrap();
    assert_eq!(first_draw.at, common::start() + TimeDelta::minutes(15));
    assert!(first_draw.power_kw > 0.0 && first_draw.power_kw <= 7.0);

    let draws: Vec<_> = log.power_draws().collect();
    assert!(draws.windows(2).all(|w| w[1].power_kw < w[0].power_kw));
}

#[test]
fn overnight_agent_charges_across_midnight() {
    let agent = common::agent(0, &common::overnight_record());
    let (sim, summary) = common::run(vec![agent], 48, 15, Diagnostics::silent());
    assert!(summary.faults.is_empty());
    let log = sim.controller().agents()[0].event_log();

    // Midnight falls inside the window opened the previous evening.
    let started = log.filter_by_kind(EventKind::ChargingStarted);
    assert_eq!(started[0].timestamp(), common::start());

    // 00:00 to 06:00 delivers roughly 30 kWh, enough to hit 80%.
    let stopped = log.filter_by_kind(EventKind::ChargingStopped);
    assert!(!stopped.is_empty());
    assert!(stopped[0].timestamp() <= common::start() + TimeDelta::hours(6));
    assert!(sim.controller().agents()[0].current_charge_pct() >= 80.0);
}
