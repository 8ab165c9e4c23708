use std::fmt;

use serde::{Deserialize, Serialize};

pub const TICKS_PER_HOUR: u64 = 2_500;
pub const TICKS_PER_DAY: u64 = 60_000;

/// Simulation clock reading, in ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SimTime(pub u64);

impl SimTime {
    pub const ZERO: SimTime = SimTime(0);

    pub fn from_hours(hours: f32) -> Self {
        SimTime(hours_to_ticks(hours))
    }

    pub fn from_days(days: f32) -> Self {
        SimTime(days_to_ticks(days))
    }

    pub fn ticks(self) -> u64 {
        self.0
    }

    pub fn days(self) -> u64 {
        self.0 / TICKS_PER_DAY
    }

    pub fn hour_of_day(self) -> f32 {
        (self.0 % TICKS_PER_DAY) as f32 / TICKS_PER_HOUR as f32
    }

    pub fn after_hours(self, hours: f32) -> SimTime {
        SimTime(self.0.saturating_add(hours_to_ticks(hours)))
    }

    pub fn after_ticks(self, ticks: u64) -> SimTime {
        SimTime(self.0.saturating_add(ticks))
    }

    /// Ticks elapsed since `earlier`, zero if `earlier` is in the future.
    pub fn ticks_since(self, earlier: SimTime) -> u64 {
        self.0.saturating_sub(earlier.0)
    }

    pub fn whole_days_since(self, earlier: SimTime) -> u64 {
        self.ticks_since(earlier) / TICKS_PER_DAY
    }

    pub fn distance(self, other: SimTime) -> u64 {
        self.0.abs_diff(other.0)
    }
}

impl fmt::Display for SimTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "day {} hour {:.1}", self.days(), self.hour_of_day())
    }
}

/// Negative and NaN inputs collapse to zero; fractions of a tick are truncated.
pub fn hours_to_ticks(hours: f32) -> u64 {
    if hours.is_nan() || hours <= 0.0 {
        return 0;
    }
    (f64::from(hours) * TICKS_PER_HOUR as f64) as u64
}

pub fn days_to_ticks(days: f32) -> u64 {
    if days.is_nan() || days <= 0.0 {
        return 0;
    }
    (f64::from(days) * TICKS_PER_DAY as f64) as u64
}

pub fn ticks_to_hours(ticks: u64) -> f32 {
    (ticks as f64 / TICKS_PER_HOUR as f64) as f32
}
