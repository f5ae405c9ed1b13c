use core::fmt;
use std::fmt::Display;
use std::ops::Add;
use std::str::FromStr;

use anyhow::Context;
use anyhow::Result;
use chrono::DateTime;
use chrono::Datelike;
use chrono::Local;
use chrono::TimeDelta;
use chrono::Timelike;
use serde::de::Visitor;
use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde::Serializer;

use crate::bailc;

/// A scheduling offset of the form `days:hours:minutes`.
///
/// The farm does not understand relative start times, so offsets are turned
/// into an absolute begin time with [DelayOffset::to_absolute] right before
/// submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, PartialOrd, Ord, Hash)]
pub struct DelayOffset {
    /// Whole days.
    pub days: u64,

    /// Hours, not normalised: `0:30:0` is valid.
    pub hours: u64,

    /// Minutes, not normalised either.
    pub minutes: u64,
}

impl DelayOffset {
    /// Construct an offset.
    pub const fn new(days: u64, hours: u64, minutes: u64) -> Self {
        Self {
            days,
            hours,
            minutes,
        }
    }

    /// The offset in minutes.
    pub fn total_minutes(&self) -> u64 {
        self.days
            .saturating_mul(24)
            .saturating_add(self.hours)
            .saturating_mul(60)
            .saturating_add(self.minutes)
    }

    /// This offset repeated `times` times, componentwise. Saturates instead of
    /// overflowing, [DelayOffset::to_absolute] then rejects it.
    pub fn times(&self, times: u64) -> Self {
        Self {
            days: self.days.saturating_mul(times),
            hours: self.hours.saturating_mul(times),
            minutes: self.minutes.saturating_mul(times),
        }
    }

    /// The absolute begin time `year:month:day:hour:minute` that lies this far
    /// after `now`, as the farm's `-b` flag expects it.
    pub fn to_absolute(&self, now: DateTime<Local>) -> Result<String> {
        let minutes = i64::try_from(self.total_minutes())
            .ok()
            .and_then(TimeDelta::try_minutes)
            .and_then(|delta| now.checked_add_signed(delta));

        let Some(at) = minutes else {
            let delay = self.to_string();
            bailc!(
                "The delay {delay} is too large",;
                "Adding it to the current time overflows the calendar",;
                "Use a shorter delay or spacing increment",
            );
        };

        Ok(format!(
            "{}:{}:{}:{}:{}",
            at.year(),
            at.month(),
            at.day(),
            at.hour(),
            at.minute()
        ))
    }
}

impl Add for DelayOffset {
    type Output = DelayOffset;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            days: self.days.saturating_add(rhs.days),
            hours: self.hours.saturating_add(rhs.hours),
            minutes: self.minutes.saturating_add(rhs.minutes),
        }
    }
}

impl Display for DelayOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.days, self.hours, self.minutes)
    }
}

impl FromStr for DelayOffset {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let parts = s.trim().split(':').collect::<Vec<&str>>();

        if parts.len() != 3 {
            bailc!(
                "Malformed delay `{s}`",;
                "A delay has exactly three `:` separated fields",;
                "Write delays as days:hours:minutes, for example 0:12:30",
            );
        }

        let mut fields = [0u64; 3];
        for (field, part) in fields.iter_mut().zip(parts) {
            *field = part
                .parse::<u64>()
                .with_context(|| format!("Malformed delay `{s}`: `{part}` is not a whole number"))?;
        }

        Ok(Self::new(fields[0], fields[1], fields[2]))
    }
}

impl Serialize for DelayOffset {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for DelayOffset {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        /// The visitor for `d:h:m` strings.
        struct DelayVisitor;

        impl Visitor<'_> for DelayVisitor {
            type Value = DelayOffset;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a delay of the form days:hours:minutes")
            }

            fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                v.parse::<DelayOffset>().map_err(|parse_err| {
                    serde::de::Error::custom(format!("This is not a valid delay: {parse_err}"))
                })
            }
        }

        deserializer.deserialize_str(DelayVisitor)
    }
}
