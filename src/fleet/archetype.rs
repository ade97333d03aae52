//! Static description of one class of vehicle and driver behaviour.

use chrono::{Days, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::diagnostics::Diagnostics;
use crate::error::ConfigError;

/// Accepted time-of-day layouts, tried in order.
const TIME_FORMATS: &[&str] = &["%I:%M %p", "%H:%M", "%H:%M:%S"];

/// Tolerance when checking that population shares add up to 100.
const SHARE_TOLERANCE: f64 = 1e-6;

/// Flat archetype record as it appears in a scenario file.
///
/// Field names follow the simulator's vocabulary; the names used by the
/// archetype spreadsheets are accepted as aliases.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ArchetypeRecord {
    pub number: u32,
    pub name: String,
    /// Share of the fleet (0-100).
    pub pcnt_population: f64,
    pub miles_per_year: f64,
    #[serde(alias = "battery_kwh")]
    pub battery_capacity_kwh: f64,
    pub efficiency_miles_per_kwh: f64,
    pub plug_in_frequency_per_day: f64,
    #[serde(alias = "charger_kw")]
    pub charger_power_kw: f64,
    /// Time of day, `"10:00 PM"` or `"22:00"`.
    #[serde(alias = "plug_in_time_hr")]
    pub plug_in_time: String,
    /// Time of day; earlier than `plug_in_time` means the following day.
    #[serde(alias = "plug_out_time_hr")]
    pub plug_out_time: String,
    #[serde(alias = "target_soc_pcnt")]
    pub target_soc_pct: f64,
    pub kwh_per_year: f64,
    pub kwh_per_plug_in: f64,
    #[serde(alias = "plug_in_soc_pcnt")]
    pub plug_in_soc_pct: f64,
    #[serde(alias = "soc_requirement_pcnt")]
    pub soc_requirement_pct: f64,
    pub charging_duration_hr: f64,
}

/// Absolute plug-in and plug-out instants for one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChargeWindow {
    pub plug_in: NaiveDateTime,
    pub plug_out: NaiveDateTime,
}

impl ChargeWindow {
    /// Inclusive at both ends.
    pub fn contains(&self, t: NaiveDateTime) -> bool {
        self.plug_in <= t && t <= self.plug_out
    }
}

/// Immutable archetype shared by every agent built from it.
#[derive(Debug, Clone, PartialEq)]
pub struct Archetype {
    pub number: u32,
    pub name: String,
    pub pcnt_population: f64,
    pub miles_per_year: f64,
    pub battery_capacity_kwh: f64,
    pub efficiency_miles_per_kwh: f64,
    pub plug_in_frequency_per_day: f64,
    pub charger_power_kw: f64,
    pub plug_in_time: NaiveTime,
    pub plug_out_time: NaiveTime,
    pub target_soc_pct: f64,
    pub kwh_per_year: f64,
    pub kwh_per_plug_in: f64,
    pub plug_in_soc_pct: f64,
    pub soc_requirement_pct: f64,
    pub charging_duration_hr: f64,
}

impl Archetype {
    /// Builds an archetype from its flat record.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` when a time string cannot be parsed or a
    /// numeric field is not finite.
    pub fn from_record(
        record: &ArchetypeRecord,
        diagnostics: &Diagnostics,
    ) -> Result<Self, ConfigError> {
        let numeric = [
            ("pcnt_population", record.pcnt_population),
            ("miles_per_year", record.miles_per_year),
            ("battery_capacity_kwh", record.battery_capacity_kwh),
            ("efficiency_miles_per_kwh", record.efficiency_miles_per_kwh),
            ("plug_in_frequency_per_day", record.plug_in_frequency_per_day),
            ("charger_power_kw", record.charger_power_kw),
            ("target_soc_pct", record.target_soc_pct),
            ("kwh_per_year", record.kwh_per_year),
            ("kwh_per_plug_in", record.kwh_per_plug_in),
            ("plug_in_soc_pct", record.plug_in_soc_pct),
            ("soc_requirement_pct", record.soc_requirement_pct),
            ("charging_duration_hr", record.charging_duration_hr),
        ];
        if let Some((field, value)) = numeric.iter().find(|(_, v)| !v.is_finite()) {
            return Err(ConfigError::new(
                format!("{}.{field}", record.name),
                format!("must be a finite number, got {value}"),
            ));
        }

        let plug_in_time = parse_time_of_day(&record.plug_in_time)
            .map_err(|message| ConfigError::new(format!("{}.plug_in_time", record.name), message))?;
        let plug_out_time = parse_time_of_day(&record.plug_out_time).map_err(|message| {
            ConfigError::new(format!("{}.plug_out_time", record.name), message)
        })?;

        if plug_out_time < plug_in_time {
            diagnostics.info(format_args!(
                "plug-out time {plug_out_time} is earlier than plug-in time {plug_in_time} for {}; \
                 assuming plug-out is on the following day",
                record.name
            ));
        }

        Ok(Self {
            number: record.number,
            name: record.name.clone(),
            pcnt_population: record.pcnt_population,
            miles_per_year: record.miles_per_year,
            battery_capacity_kwh: record.battery_capacity_kwh,
            efficiency_miles_per_kwh: record.efficiency_miles_per_kwh,
            plug_in_frequency_per_day: record.plug_in_frequency_per_day,
            charger_power_kw: record.charger_power_kw,
            plug_in_time,
            plug_out_time,
            target_soc_pct: record.target_soc_pct,
            kwh_per_year: record.kwh_per_year,
            kwh_per_plug_in: record.kwh_per_plug_in,
            plug_in_soc_pct: record.plug_in_soc_pct,
            soc_requirement_pct: record.soc_requirement_pct,
            charging_duration_hr: record.charging_duration_hr,
        })
    }

    /// Whether the plug-out time of day falls on the day after plug-in.
    pub fn is_overnight(&self) -> bool {
        self.plug_out_time < self.plug_in_time
    }

    /// Resolves the plug-out instant for a session that plugged in at
    /// `plug_in`, adding a day when plug-out is strictly earlier in the day.
    pub fn plug_out_after(&self, plug_in: NaiveDateTime) -> NaiveDateTime {
        let date = plug_in.date();
        if self.plug_out_time < plug_in.time() {
            next_day(date).and_time(self.plug_out_time)
        } else {
            date.and_time(self.plug_out_time)
        }
    }

    /// The charging window whose plug-in falls on `date`.
    pub fn window_on(&self, date: NaiveDate) -> ChargeWindow {
        let plug_in = date.and_time(self.plug_in_time);
        ChargeWindow {
            plug_in,
            plug_out: self.plug_out_after(plug_in),
        }
    }

    /// The window relevant at instant `t`: today's, unless `t` is still
    /// inside an overnight window that opened the previous day.
    pub fn window_at(&self, t: NaiveDateTime) -> ChargeWindow {
        let today = self.window_on(t.date());
        if self.is_overnight() && t < today.plug_in {
            if let Some(yesterday) = t.date().checked_sub_days(Days::new(1)) {
                let previous = self.window_on(yesterday);
                if previous.contains(t) {
                    return previous;
                }
            }
        }
        today
    }
}

/// Checks that population shares add up to exactly 100.
///
/// # Errors
///
/// Returns a `ConfigError` naming the actual total otherwise.
pub fn check_population_shares(archetypes: &[Archetype]) -> Result<(), ConfigError> {
    check_share_total(archetypes.iter().map(|a| a.pcnt_population).sum())
}

/// Checks a summed population share against 100 %.
///
/// # Errors
///
/// Returns a `ConfigError` naming `total` when it is off by more than the
/// share tolerance.
pub fn check_share_total(total: f64) -> Result<(), ConfigError> {
    if (total - 100.0).abs() > SHARE_TOLERANCE {
        return Err(ConfigError::new(
            "archetype.pcnt_population",
            format!("population shares must sum to 100, got {total}"),
        ));
    }
    Ok(())
}

/// Parses a time of day in any of the accepted layouts.
pub fn parse_time_of_day(raw: &str) -> Result<NaiveTime, String> {
    let trimmed = raw.trim();
    TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(trimmed, fmt).ok())
        .ok_or_else(|| format!("cannot parse time of day \"{raw}\" (expected \"H:MM AM/PM\" or \"HH:MM\")"))
}

fn next_day(date: NaiveDate) -> NaiveDate {
    date.checked_add_days(Days::new(1)).unwrap_or(date)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::MemorySink;
    use log::Level;

    fn record(plug_in: &str, plug_out: &str) -> ArchetypeRecord {
        ArchetypeRecord {
            number: 1,
            name: "Commuter".to_string(),
            pcnt_population: 100.0,
            miles_per_year: 8000.0,
            battery_capacity_kwh: 50.0,
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
        }
    }

    fn at(date: NaiveDate, h: u32, m: u32) -> NaiveDateTime {
        date.and_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn parses_twelve_and_twenty_four_hour_times() {
        assert_eq!(
            parse_time_of_day("10:30 PM"),
            Ok(NaiveTime::from_hms_opt(22, 30, 0).unwrap())
        );
        assert_eq!(
            parse_time_of_day("7:05 am"),
            Ok(NaiveTime::from_hms_opt(7, 5, 0).unwrap())
        );
        assert_eq!(
            parse_time_of_day("06:00"),
            Ok(NaiveTime::from_hms_opt(6, 0, 0).unwrap())
        );
        assert!(parse_time_of_day("teatime").is_err());
    }

    #[test]
    fn bad_time_is_config_error() {
        let err = Archetype::from_record(&record("25:99", "06:00"), &Diagnostics::silent())
            .unwrap_err();
        assert_eq!(err.field, "Commuter.plug_in_time");
    }

    #[test]
    fn non_finite_field_is_config_error() {
        let mut r = record("18:00", "22:00");
        r.charger_power_kw = f64::NAN;
        let err = Archetype::from_record(&r, &Diagnostics::silent()).unwrap_err();
        assert_eq!(err.field, "Commuter.charger_power_kw");
    }

    #[test]
    fn overnight_plug_out_rolls_to_next_day() {
        let a = Archetype::from_record(&record("22:00", "06:00"), &Diagnostics::silent()).unwrap();
        let day = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let window = a.window_on(day);

        assert_eq!(window.plug_in, at(day, 22, 0));
        assert_eq!(window.plug_out, at(day.succ_opt().unwrap(), 6, 0));
        assert_eq!(window.plug_out - window.plug_in, chrono::TimeDelta::hours(8));
    }

    #[test]
    fn same_day_window_does_not_roll() {
        let a = Archetype::from_record(&record("6:00 PM", "11:00 PM"), &Diagnostics::silent())
            .unwrap();
        let day = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let window = a.window_on(day);
        assert_eq!(window.plug_out, at(day, 23, 0));
        assert!(!a.is_overnight());
    }

    #[test]
    fn rollover_is_logged_at_info() {
        let sink = MemorySink::new(Level::Info);
        let diag = Diagnostics::new("fleet::archetype", sink.clone());
        Archetype::from_record(&record("22:00", "06:00"), &diag).unwrap();
        Archetype::from_record(&record("08:00", "17:00"), &diag).unwrap();

        let infos = sink.records_at(Level::Info);
        assert_eq!(infos.len(), 1);
        assert!(infos[0].message.contains("following day"));
    }

    #[test]
    fn window_at_early_morning_uses_previous_evening() {
        let a = Archetype::from_record(&record("22:00", "06:00"), &Diagnostics::silent()).unwrap();
        let day = NaiveDate::from_ymd_opt(2024, 3, 2).unwrap();
        let prev = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();

        let early = a.window_at(at(day, 3, 0));
        assert_eq!(early.plug_in, at(prev, 22, 0));
        assert!(early.contains(at(day, 3, 0)));

        let midday = a.window_at(at(day, 12, 0));
        assert_eq!(midday.plug_in, at(day, 22, 0));
        assert!(!midday.contains(at(day, 12, 0)));
    }

    #[test]
    fn shares_must_sum_to_hundred() {
        let diag = Diagnostics::silent();
        let mut parts = Vec::new();
        for pct in [50.0, 30.0, 19.0] {
            let mut r = record("18:00", "22:00");
            r.pcnt_population = pct;
            parts.push(Archetype::from_record(&r, &diag).unwrap());
        }
        assert!(check_population_shares(&parts).is_err());

        parts[2].pcnt_population = 20.0;
        assert!(check_population_shares(&parts).is_ok());
    }

    #[test]
    fn share_total_tolerates_float_noise() {
        assert!(check_share_total(100.0 + SHARE_TOLERANCE / 2.0).is_ok());
        assert!(check_share_total(100.0 + SHARE_TOLERANCE * 2.0).is_err());
        let err = check_share_total(99.0).unwrap_err();
        assert_eq!(err.field, "archetype.pcnt_population");
    }

    #[test]
    fn spreadsheet_field_names_are_accepted() {
        let toml = r#"
number = 3
name = "Legacy"
pcnt_population = 100
miles_per_year = 5000
battery_kwh = 40
efficiency_miles_per_kwh = 3.0
plug_in_frequency_per_day = 0.5
charger_kw = 3.6
plug_in_time_hr = "7:00 PM"
plug_out_time_hr = "7:00 AM"
target_soc_pcnt = 90
kwh_per_year = 1666
kwh_per_plug_in = 9.1
plug_in_soc_pcnt = 30
soc_requirement_pcnt = 22.8
charging_duration_hr = 2.5
"#;
        let r: ArchetypeRecord = toml::from_str(toml).unwrap();
        assert_eq!(r.battery_capacity_kwh, 40.0);
        assert_eq!(r.charger_power_kw, 3.6);
        assert_eq!(r.plug_in_soc_pct, 30.0);
    }
}
