//! Game time
//!
//! World time is kept as game milliseconds since day zero, 00:00. Routines
//! and scripted states compare against it through [`TimeOfDay`].

use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};

/// Game milliseconds in one minute
pub const MS_PER_MINUTE: u64 = 60 * 1000;
/// Game milliseconds in one hour
pub const MS_PER_HOUR: u64 = 60 * MS_PER_MINUTE;
/// Game milliseconds in one day
pub const MS_PER_DAY: u64 = 24 * MS_PER_HOUR;

/// Absolute game time in milliseconds
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GameTime(pub u64);

impl GameTime {
    /// Day zero, midnight
    pub const ZERO: Self = Self(0);

    /// Build a time from calendar parts
    pub fn from_day_time(day: u32, hour: u32, minute: u32) -> Self {
        Self(
            day as u64 * MS_PER_DAY
                + (hour as u64 % 24) * MS_PER_HOUR
                + (minute as u64 % 60) * MS_PER_MINUTE,
        )
    }

    /// Milliseconds since day zero
    pub fn millis(&self) -> u64 {
        self.0
    }

    /// Day counter
    pub fn day(&self) -> u32 {
        (self.0 / MS_PER_DAY) as u32
    }

    /// Hour of the current day
    pub fn hour(&self) -> u32 {
        ((self.0 % MS_PER_DAY) / MS_PER_HOUR) as u32
    }

    /// Minute of the current hour
    pub fn minute(&self) -> u32 {
        ((self.0 % MS_PER_HOUR) / MS_PER_MINUTE) as u32
    }

    /// Time of day, minute precision
    pub fn time_of_day(&self) -> TimeOfDay {
        TimeOfDay(((self.0 % MS_PER_DAY) / MS_PER_MINUTE) as u16)
    }

    /// Add game milliseconds
    pub fn advance(&mut self, ms: u64) {
        self.0 = self.0.saturating_add(ms);
    }

    /// Same day, different clock time. Times earlier than now roll over to the next day.
    pub fn with_time_of_day(&self, tod: TimeOfDay) -> Self {
        let day_start = self.0 - self.0 % MS_PER_DAY;
        let candidate = day_start + tod.minutes() as u64 * MS_PER_MINUTE;
        if candidate < self.0 {
            Self(candidate + MS_PER_DAY)
        } else {
            Self(candidate)
        }
    }
}

impl Add<u64> for GameTime {
    type Output = GameTime;

    fn add(self, ms: u64) -> GameTime {
        GameTime(self.0.saturating_add(ms))
    }
}

impl Sub for GameTime {
    type Output = u64;

    fn sub(self, rhs: GameTime) -> u64 {
        self.0.saturating_sub(rhs.0)
    }
}

impl fmt::Display for GameTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "day {} {:02}:{:02}", self.day(), self.hour(), self.minute())
    }
}

/// Minutes since midnight
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TimeOfDay(u16);

impl TimeOfDay {
    /// Midnight
    pub const MIDNIGHT: Self = Self(0);

    /// Create from hour and minute, wrapping into a single day
    pub fn new(hour: u32, minute: u32) -> Self {
        Self((((hour % 24) * 60 + minute % 60) % (24 * 60)) as u16)
    }

    /// Create from hour and minute, rejecting out of range values
    pub fn try_new(hour: u32, minute: u32) -> Result<Self> {
        if hour >= 24 || minute >= 60 {
            return Err(CoreError::InvalidTimeOfDay { hour, minute });
        }
        Ok(Self::new(hour, minute))
    }

    /// Minutes since midnight
    pub fn minutes(&self) -> u16 {
        self.0
    }

    /// Hour part
    pub fn hour(&self) -> u32 {
        self.0 as u32 / 60
    }

    /// Minute part
    pub fn minute(&self) -> u32 {
        self.0 as u32 % 60
    }

    /// Check membership in the half-open window `[start, end)`.
    ///
    /// A window whose start is after its end spans midnight. A window with
    /// `start == end` covers the whole day.
    pub fn in_window(&self, start: TimeOfDay, end: TimeOfDay) -> bool {
        if start == end {
            true
        } else if start < end {
            start <= *self && *self < end
        } else {
            *self >= start || *self < end
        }
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}
