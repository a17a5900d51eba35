use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub const MINUTES_PER_DAY: u32 = 24 * 60;

/// Wall-clock time of day stored as minutes since midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeOfDay(u32);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid time '{input}' (expected HH:MM)")]
pub struct ParseTimeError {
    input: String,
}

/// `HH:MM` or `HH:MM:SS`, every field exactly two digits.
fn is_clock_shaped(s: &str) -> bool {
    let bytes = s.as_bytes();
    if bytes.len() != 5 && bytes.len() != 8 {
        return false;
    }
    bytes.iter().enumerate().all(|(i, b)| {
        if i % 3 == 2 {
            *b == b':'
        } else {
            b.is_ascii_digit()
        }
    })
}

impl TimeOfDay {
    pub const MIDNIGHT: TimeOfDay = TimeOfDay(0);

    /// Returns `None` unless `hour < 24` and `minute < 60`.
    pub fn from_hm(hour: u32, minute: u32) -> Option<Self> {
        (hour < 24 && minute < 60).then(|| Self(hour * 60 + minute))
    }

    /// Const constructor for literals known to be in range.
    pub(crate) const fn at(hour: u32, minute: u32) -> Self {
        Self(hour * 60 + minute)
    }

    pub fn from_minutes(minutes: u32) -> Option<Self> {
        (minutes < MINUTES_PER_DAY).then_some(Self(minutes))
    }

    pub fn minutes(self) -> u32 {
        self.0
    }

    pub fn hour(self) -> u32 {
        self.0 / 60
    }

    pub fn minute(self) -> u32 {
        self.0 % 60
    }

    /// Absolute distance in minutes between two times on the same day.
    pub fn distance(self, other: TimeOfDay) -> u32 {
        self.0.abs_diff(other.0)
    }

    pub fn to_naive_time(self) -> NaiveTime {
        NaiveTime::from_hms_opt(self.hour(), self.minute(), 0).unwrap_or(NaiveTime::MIN)
    }
}

impl From<NaiveTime> for TimeOfDay {
    fn from(value: NaiveTime) -> Self {
        Self(value.hour() * 60 + value.minute())
    }
}

impl FromStr for TimeOfDay {
    type Err = ParseTimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let invalid = || ParseTimeError {
            input: s.to_string(),
        };
        if !is_clock_shaped(trimmed) {
            return Err(invalid());
        }
        NaiveTime::parse_from_str(trimmed, "%H:%M")
            .or_else(|_| NaiveTime::parse_from_str(trimmed, "%H:%M:%S"))
            .map(TimeOfDay::from)
            .map_err(|_| invalid())
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

impl Serialize for TimeOfDay {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TimeOfDay {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Parses an `HH:MM` string into minutes since midnight.
pub fn parse_time(value: &str) -> Option<u32> {
    value.parse::<TimeOfDay>().ok().map(TimeOfDay::minutes)
}

/// Formats minutes since midnight as `HH:MM`. Values past midnight wrap.
pub fn format_minutes(minutes: u32) -> String {
    let wrapped = minutes % MINUTES_PER_DAY;
    format!("{:02}:{:02}", wrapped / 60, wrapped % 60)
}
