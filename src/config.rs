//! TOML-based scenario configuration and preset definitions.

use std::fs;
use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use serde::Deserialize;

use crate::diagnostics::Diagnostics;
pub use crate::error::ConfigError;
use crate::fleet::archetype::{check_population_shares, check_share_total, parse_time_of_day};
use crate::fleet::{Archetype, ArchetypeRecord};
use crate::sim::types::SimConfig;

/// Top-level scenario configuration parsed from TOML.
///
/// All fields have defaults matching the baseline scenario. Load from
/// TOML with [`ScenarioConfig::from_toml_file`] or use
/// [`ScenarioConfig::baseline`] for the built-in default.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioConfig {
    /// Time range, tick and population size.
    #[serde(default)]
    pub simulation: SimulationConfig,
    /// Archetype records, written as `[[archetype]]` tables.
    #[serde(default = "baseline_archetypes", rename = "archetype")]
    pub archetypes: Vec<ArchetypeRecord>,
}

/// Simulation timing and population parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    /// First tick, e.g. `"2024-01-01T00:00:00"`.
    pub start: NaiveDateTime,
    /// End of the run (exclusive).
    pub end: NaiveDateTime,
    /// Tick length in minutes (must be > 0).
    pub tick_minutes: u32,
    /// Target fleet size before per-archetype rounding (must be > 0).
    pub population: usize,
    /// Fan per-agent work out across threads within each tick.
    pub parallel: bool,
}

fn default_start() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or_default()
}

fn positive(x: f64) -> bool {
    x.is_finite() && x > 0.0
}

impl Default for SimulationConfig {
    fn default() -> Self {
        let start = default_start();
        Self {
            start,
            end: start + TimeDelta::days(1),
            tick_minutes: 15,
            population: 10,
            parallel: false,
        }
    }
}

#[expect(clippy::too_many_arguments)]
fn archetype(
    number: u32,
    name: &str,
    pcnt_population: f64,
    battery_capacity_kwh: f64,
    charger_power_kw: f64,
    plug_in_time: &str,
    plug_out_time: &str,
    target_soc_pct: f64,
    plug_in_soc_pct: f64,
    miles_per_year: f64,
    plug_in_frequency_per_day: f64,
) -> ArchetypeRecord {
    let efficiency_miles_per_kwh = 3.5;
    let kwh_per_year = miles_per_year / efficiency_miles_per_kwh;
    let kwh_per_plug_in = kwh_per_year / (365.0 * plug_in_frequency_per_day);
    ArchetypeRecord {
        number,
        name: name.to_string(),
        pcnt_population,
        miles_per_year,
        battery_capacity_kwh,
        efficiency_miles_per_kwh,
        plug_in_frequency_per_day,
        charger_power_kw,
        plug_in_time: plug_in_time.to_string(),
        plug_out_time: plug_out_time.to_string(),
        target_soc_pct,
        kwh_per_year,
        kwh_per_plug_in,
        plug_in_soc_pct,
        soc_requirement_pct: 100.0 * kwh_per_plug_in / battery_capacity_kwh,
        charging_duration_hr: kwh_per_plug_in / charger_power_kw,
    }
}

fn baseline_archetypes() -> Vec<ArchetypeRecord> {
    vec![
        archetype(1, "Commuter", 50.0, 60.0, 7.0, "6:00 PM", "7:00 AM", 80.0, 45.0, 8000.0, 0.5),
        archetype(2, "Infrequent", 30.0, 75.0, 7.4, "9:00 PM", "6:00 AM", 90.0, 25.0, 9000.0, 0.2),
        archetype(3, "Daytime", 20.0, 40.0, 3.6, "10:00 AM", "4:00 PM", 100.0, 50.0, 5000.0, 1.0),
    ]
}

impl ScenarioConfig {
    /// Returns the baseline scenario: three mixed archetypes over one day.
    pub fn baseline() -> Self {
        Self {
            simulation: SimulationConfig::default(),
            archetypes: baseline_archetypes(),
        }
    }

    /// Returns the overnight preset: every archetype plugs in in the evening,
    /// stacking load after 18:00.
    pub fn overnight() -> Self {
        Self {
            simulation: SimulationConfig {
                population: 50,
                ..SimulationConfig::default()
            },
            archetypes: vec![
                archetype(1, "Early", 40.0, 60.0, 7.0, "5:30 PM", "7:00 AM", 80.0, 30.0, 8000.0, 1.0),
                archetype(2, "Late", 40.0, 64.0, 7.4, "11:00 PM", "6:30 AM", 90.0, 35.0, 9500.0, 0.5),
                archetype(3, "Granny", 20.0, 50.0, 2.3, "7:00 PM", "8:00 AM", 100.0, 20.0, 4000.0, 1.0),
            ],
        }
    }

    /// Returns the rapid preset: high-power chargers over a short window.
    pub fn rapid() -> Self {
        Self {
            simulation: SimulationConfig {
                tick_minutes: 1,
                end: default_start() + TimeDelta::hours(6),
                ..SimulationConfig::default()
            },
            archetypes: vec![
                archetype(1, "Fleet van", 70.0, 75.0, 50.0, "00:00", "05:00", 95.0, 10.0, 25000.0, 1.0),
                archetype(2, "Taxi", 30.0, 60.0, 100.0, "01:00", "03:00", 90.0, 15.0, 40000.0, 1.5),
            ],
        }
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = &["baseline", "overnight", "rapid"];

    /// Loads a scenario from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "baseline" => Ok(Self::baseline()),
            "overnight" => Ok(Self::overnight()),
            "rapid" => Ok(Self::rapid()),
            _ => Err(ConfigError::new(
                "preset",
                format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            )),
        }
    }

    /// Parses a scenario from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigError::new("scenario", format!("cannot read \"{}\": {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a scenario from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid, contains unknown
    /// fields, or a required archetype field is missing or non-numeric.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::new("toml", e.to_string()))
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        let s = &self.simulation;

        if s.tick_minutes == 0 {
            errors.push(ConfigError::new("simulation.tick_minutes", "must be > 0"));
        }
        if s.end <= s.start {
            errors.push(ConfigError::new(
                "simulation.end",
                "must be after simulation.start",
            ));
        }
        if s.population == 0 {
            errors.push(ConfigError::new("simulation.population", "must be > 0"));
        }
        if self.archetypes.is_empty() {
            errors.push(ConfigError::new("archetype", "at least one archetype is required"));
        }

        for (i, a) in self.archetypes.iter().enumerate() {
            let field = |name: &str| format!("archetype[{i}].{name}");

            if !positive(a.battery_capacity_kwh) {
                errors.push(ConfigError::new(field("battery_capacity_kwh"), "must be > 0"));
            }
            if !positive(a.charger_power_kw) {
                errors.push(ConfigError::new(field("charger_power_kw"), "must be > 0"));
            }
            for (name, pct) in [
                ("pcnt_population", a.pcnt_population),
                ("target_soc_pct", a.target_soc_pct),
                ("plug_in_soc_pct", a.plug_in_soc_pct),
            ] {
                if !(0.0..=100.0).contains(&pct) {
                    errors.push(ConfigError::new(field(name), "must be in [0, 100]"));
                }
            }
            for (name, raw) in [
                ("plug_in_time", &a.plug_in_time),
                ("plug_out_time", &a.plug_out_time),
            ] {
                if let Err(message) = parse_time_of_day(raw) {
                    errors.push(ConfigError::new(field(name), message));
                }
            }
        }

        let total: f64 = self.archetypes.iter().map(|a| a.pcnt_population).sum();
        errors.extend(
            check_share_total(total)
                .err()
                .filter(|_| !self.archetypes.is_empty()),
        );

        errors
    }

    /// Timing for the simulator.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` for a zero tick.
    pub fn sim_config(&self) -> Result<SimConfig, ConfigError> {
        let s = &self.simulation;
        if s.tick_minutes == 0 {
            return Err(ConfigError::new("simulation.tick_minutes", "must be > 0"));
        }
        Ok(SimConfig::new(
            s.start,
            s.end,
            TimeDelta::minutes(i64::from(s.tick_minutes)),
        ))
    }

    /// Resolves every archetype record and checks population shares.
    ///
    /// # Errors
    ///
    /// Returns the first `ConfigError` encountered.
    pub fn archetypes(&self, diagnostics: &Diagnostics) -> Result<Vec<Archetype>, ConfigError> {
        let archetypes = self
            .archetypes
            .iter()
            .map(|r| Archetype::from_record(r, diagnostics))
            .collect::<Result<Vec<_>, _>>()?;
        check_population_shares(&archetypes)?;
        Ok(archetypes)
    }
}
