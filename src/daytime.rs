//! The service-day clock.
//!
//! Schedule times are measured as elapsed time since the start of the
//! operating day, not as wall-clock times: a departure at 25:30 belongs to
//! the previous service day even though it happens at 1:30 in the morning.
//! Keeping the elapsed-time representation means threshold comparisons
//! never wrap at midnight.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub const PEAK_AM_START: DayTime = DayTime::from_hms(7, 0, 0);
pub const PEAK_AM_END: DayTime = DayTime::from_hms(10, 0, 0);
pub const PEAK_PM_START: DayTime = DayTime::from_hms(16, 0, 0);
pub const PEAK_PM_END: DayTime = DayTime::from_hms(19, 0, 0);
pub const LATE_PM_START: DayTime = DayTime::from_hms(22, 0, 0);

/// Seconds elapsed since the start of the service day. May exceed 24 hours.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct DayTime(u32);

impl DayTime {
    pub const fn from_hms(hours: u32, minutes: u32, seconds: u32) -> Self {
        DayTime(hours * 3600 + minutes * 60 + seconds)
    }

    pub const fn from_seconds(seconds: u32) -> Self {
        DayTime(seconds)
    }

    pub const fn seconds(self) -> u32 {
        self.0
    }

    pub fn is_early_am(self) -> bool {
        self <= PEAK_AM_START
    }

    pub fn is_peak_am(self) -> bool {
        PEAK_AM_START < self && self <= PEAK_AM_END
    }

    pub fn is_midday(self) -> bool {
        PEAK_AM_END < self && self < PEAK_PM_START
    }

    /// No report bucket consults this band; both peak-PM bounds are inclusive.
    pub fn is_peak_pm(self) -> bool {
        PEAK_PM_START <= self && self <= PEAK_PM_END
    }

    pub fn is_evening_pm(self) -> bool {
        PEAK_PM_END < self && self < LATE_PM_START
    }

    pub fn is_late_pm(self) -> bool {
        self >= LATE_PM_START
    }
}

impl fmt::Display for DayTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hours = self.0 / 3600;
        let minutes = (self.0 % 3600) / 60;
        let seconds = self.0 % 60;
        write!(f, "{hours:02}:{minutes:02}:{seconds:02}")
    }
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
#[error("invalid service-day time {0:?}")]
pub struct ParseDayTimeError(String);

impl FromStr for DayTime {
    type Err = ParseDayTimeError;

    /// Accepts `H:MM` and `H:MM:SS`, with hours allowed past 24.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseDayTimeError(s.to_string());
        let mut pieces = Vec::with_capacity(3);
        for piece in s.split(':') {
            pieces.push(piece.trim().parse::<u32>().map_err(|_| err())?);
        }
        match pieces[..] {
            [hours, minutes] => Ok(DayTime::from_hms(hours, minutes, 0)),
            [hours, minutes, seconds] => Ok(DayTime::from_hms(hours, minutes, seconds)),
            _ => Err(err()),
        }
    }
}
