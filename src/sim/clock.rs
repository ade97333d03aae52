use chrono::{NaiveDateTime, TimeDelta};

use super::types::SimConfig;

/// A simulation clock that walks a half-open time range in fixed ticks.
///
/// The `Clock` yields `start`, `start + tick`, ... for every instant
/// strictly before `end`; it never yields `end` itself.
///
/// # Examples
///
/// ```
/// use chrono::{NaiveDate, TimeDelta};
/// use ev_fleet_sim::sim::clock::Clock;
///
/// let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
/// let mut clock = Clock::new(start, start + TimeDelta::hours(1), TimeDelta::minutes(20));
/// let mut ticks = Vec::new();
///
/// clock.run(|t| ticks.push(t));
/// assert_eq!(ticks.len(), 3);
/// assert_eq!(ticks[2], start + TimeDelta::minutes(40));
/// ```
pub struct Clock {
    /// Instant the next tick will report
    current: NaiveDateTime,
    /// End of the run (exclusive)
    end: NaiveDateTime,
    /// Step between ticks
    tick: TimeDelta,
}

impl Clock {
    /// Creates a new clock over `[start, end)`.
    ///
    /// # Panics
    ///
    /// Panics if `tick` is not strictly positive.
    pub fn new(start: NaiveDateTime, end: NaiveDateTime, tick: TimeDelta) -> Self {
        assert!(tick > TimeDelta::zero(), "tick must be > 0");
        Self {
            current: start,
            end,
            tick,
        }
    }

    pub fn from_config(config: &SimConfig) -> Self {
        Self::new(config.start, config.end, config.tick)
    }

    /// The instant the next call to [`Clock::tick`] would return.
    pub fn current(&self) -> NaiveDateTime {
        self.current
    }

    /// Advances the clock by one tick.
    ///
    /// # Returns
    ///
    /// * `Some(t)` - The current instant before advancing
    /// * `None` - If the clock has reached `end`
    pub fn tick(&mut self) -> Option<NaiveDateTime> {
        if self.current < self.end {
            let t = self.current;
            self.current += self.tick;
            Some(t)
        } else {
            None
        }
    }

    /// Runs a function for each remaining tick.
    pub fn run(&mut self, mut f: impl FnMut(NaiveDateTime)) {
        while let Some(t) = self.tick() {
            f(t);
        }
    }
}
