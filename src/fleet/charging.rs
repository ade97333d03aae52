//! Simplified charging-power taper.

/// Effective charger power at a given state of charge.
///
/// The nominal rating is treated as peak power and scaled by
/// `0.5 * (tanh(1 - soc/100) + 1)`, so power is highest when the battery is
/// empty and tapers smoothly as it fills. For `soc_pct` in `[0, 100]` the
/// result lies strictly between zero and `charger_power_kw` and decreases
/// strictly with SOC.
///
/// # Examples
///
/// ```
/// use ev_fleet_sim::fleet::charging::effective_power_kw;
///
/// let empty = effective_power_kw(7.0, 0.0);
/// let full = effective_power_kw(7.0, 100.0);
/// assert!(empty > full);
/// assert!((full - 3.5).abs() < 1e-12);
/// ```
pub fn effective_power_kw(charger_power_kw: f64, soc_pct: f64) -> f64 {
    let headroom = 1.0 - soc_pct / 100.0;
    charger_power_kw * 0.5 * (headroom.tanh() + 1.0)
}

/// Energy delivered over `hours` at constant `power_kw`.
pub fn energy_kwh(power_kw: f64, hours: f64) -> f64 {
    power_kw * hours
}
