//! Wall-clock schedule windows and the fixed table of derived regions.
//!
//! The base schedule is kept in Uruguay time; every other region's window is
//! obtained by shifting it a whole number of hours.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// A `HH:MM` argument that could not be parsed.
///
/// The message doubles as the user-visible reply in the channel.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Formato de hora inválido: `{0}` (se espera HH:MM)")]
pub struct InvalidTimeFormat(pub String);

/// Wall-clock time without date or zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeOfDay {
    hour: u8,
    minute: u8,
}

impl TimeOfDay {
    pub const fn new(hour: u8, minute: u8) -> Self {
        Self { hour, minute }
    }

    /// Shift by whole hours, wrapping at the day boundary. Total for any
    /// offset; only display strings are derived from the result, so no date
    /// rollover is tracked.
    fn shifted(self, offset_hours: i32) -> Self {
        let hour = (self.hour as i32 + offset_hours).rem_euclid(24) as u8;
        Self {
            hour,
            minute: self.minute,
        }
    }
}

impl FromStr for TimeOfDay {
    type Err = InvalidTimeFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || InvalidTimeFormat(s.to_string());
        let (hour, minute) = s.split_once(':').ok_or_else(err)?;
        let hour: u8 = hour.parse().map_err(|_| err())?;
        let minute: u8 = minute.parse().map_err(|_| err())?;
        if hour >= 24 || minute >= 60 {
            return Err(err());
        }
        Ok(Self { hour, minute })
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

/// Start and end of a stream day, in the base region's clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: TimeOfDay,
    pub end: TimeOfDay,
}

impl TimeWindow {
    pub const fn new(start: TimeOfDay, end: TimeOfDay) -> Self {
        Self { start, end }
    }

    /// The same window on a clock `offset_hours` away from the base region.
    pub fn adjusted(self, offset_hours: i32) -> Self {
        Self {
            start: self.start.shifted(offset_hours),
            end: self.end.shifted(offset_hours),
        }
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.start, self.end)
    }
}

/// A region whose window is derived from the base schedule.
#[derive(Debug, Clone, Copy)]
pub struct Region {
    pub flag: &'static str,
    pub offset_hours: i32,
}

/// Flag shown next to the base (Uruguay) window.
pub const BASE_FLAG: &str = "🇺🇾";

/// Derived regions, in display order.
pub const REGIONS: [Region; 5] = [
    Region { flag: "🇨🇱", offset_hours: -1 }, // Chile
    Region { flag: "🇨🇴", offset_hours: -2 }, // Colombia
    Region { flag: "🇪🇸", offset_hours: 5 },  // España
    Region { flag: "🇲🇽", offset_hours: -3 }, // México
    Region { flag: "🇵🇪", offset_hours: -2 }, // Perú
];
