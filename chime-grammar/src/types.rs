//! Alarm types shared by the interpreter and the scheduler.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::time::Duration;

/// Time unit recognised by the interval and delay grammars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeUnit {
    Second,
    Minute,
    Hour,
}

impl TimeUnit {
    /// Length of one unit in seconds.
    #[must_use]
    pub fn seconds(self) -> u64 {
        match self {
            Self::Second => 1,
            Self::Minute => 60,
            Self::Hour => 3600,
        }
    }

    /// Duration of `count` units, or `None` on overflow.
    #[must_use]
    pub fn duration(self, count: u64) -> Option<Duration> {
        count.checked_mul(self.seconds()).map(Duration::from_secs)
    }
}

/// A unit as written in alarm text: `"minute"` and `"minutes"` are the same
/// [`TimeUnit`] but stay distinct on the wire and in descriptions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UnitWord {
    unit: TimeUnit,
    plural: bool,
}

/// Keyword table for unit words. Singular and plural forms map explicitly.
const UNIT_KEYWORDS: &[(&str, UnitWord)] = &[
    ("second", UnitWord::singular(TimeUnit::Second)),
    ("seconds", UnitWord::plural(TimeUnit::Second)),
    ("minute", UnitWord::singular(TimeUnit::Minute)),
    ("minutes", UnitWord::plural(TimeUnit::Minute)),
    ("hour", UnitWord::singular(TimeUnit::Hour)),
    ("hours", UnitWord::plural(TimeUnit::Hour)),
];

impl UnitWord {
    #[must_use]
    pub const fn singular(unit: TimeUnit) -> Self {
        Self {
            unit,
            plural: false,
        }
    }

    #[must_use]
    pub const fn plural(unit: TimeUnit) -> Self {
        Self { unit, plural: true }
    }

    /// Look up a unit keyword (`"minute"`, `"hours"`, ...). Case-sensitive;
    /// callers pass normalized lowercase text.
    #[must_use]
    pub fn from_keyword(word: &str) -> Option<Self> {
        UNIT_KEYWORDS
            .iter()
            .find(|(keyword, _)| *keyword == word)
            .map(|(_, unit)| *unit)
    }

    #[must_use]
    pub fn unit(self) -> TimeUnit {
        self.unit
    }

    #[must_use]
    pub fn is_plural(self) -> bool {
        self.plural
    }

    /// Duration of `count` units, or `None` on overflow.
    #[must_use]
    pub fn duration(self, count: u64) -> Option<Duration> {
        self.unit.duration(count)
    }

    /// The keyword as written.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match (self.unit, self.plural) {
            (TimeUnit::Second, false) => "second",
            (TimeUnit::Second, true) => "seconds",
            (TimeUnit::Minute, false) => "minute",
            (TimeUnit::Minute, true) => "minutes",
            (TimeUnit::Hour, false) => "hour",
            (TimeUnit::Hour, true) => "hours",
        }
    }
}

/// Plural form.
impl From<TimeUnit> for UnitWord {
    fn from(unit: TimeUnit) -> Self {
        Self::plural(unit)
    }
}

impl std::fmt::Display for UnitWord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for UnitWord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for UnitWord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let word = String::deserialize(deserializer)?;
        Self::from_keyword(&word)
            .ok_or_else(|| de::Error::custom(format!("unknown time unit '{word}'")))
    }
}

/// Default reason for interval alarms without an extracted phrase.
pub const DEFAULT_INTERVAL_REASON: &str = "Repeating Alarm";

/// Default reason for delay alarms without an extracted phrase.
pub const DEFAULT_DELAY_REASON: &str = "Short-term Alarm";

/// Reason attached to alarms recognised by the date fallback.
pub const DEFAULT_GENERIC_REASON: &str = "Generic Alarm";

/// Structured result of interpreting alarm text.
///
/// Serializes to `{"type":"interval","interval":N,"unit":"minutes","reason":..}`
/// (the unit keyword as written)
/// or `{"type":"datetime","time":"<RFC 3339>","reason":..}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AlarmSpec {
    /// Fires every `every` × `unit`, starting one period after submission.
    Interval {
        #[serde(rename = "interval")]
        every: u64,
        unit: UnitWord,
        reason: String,
    },
    /// Fires once at `fire_at`. A time in the past fires on the next tick.
    #[serde(rename = "datetime")]
    Absolute {
        #[serde(rename = "time")]
        fire_at: DateTime<Utc>,
        reason: String,
    },
}

impl AlarmSpec {
    /// The human-readable reason.
    #[must_use]
    pub fn reason(&self) -> &str {
        match self {
            Self::Interval { reason, .. } | Self::Absolute { reason, .. } => reason,
        }
    }

    /// Repeat period for interval alarms. `None` for absolute alarms or when
    /// the period overflows.
    #[must_use]
    pub fn period(&self) -> Option<Duration> {
        match self {
            Self::Interval { every, unit, .. } => unit.duration(*every),
            Self::Absolute { .. } => None,
        }
    }

    /// Fire time for absolute alarms.
    #[must_use]
    pub fn fire_at(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Absolute { fire_at, .. } => Some(*fire_at),
            Self::Interval { .. } => None,
        }
    }

    /// Short description of when the alarm rings: `"every 30 minutes"` or the
    /// RFC 3339 fire time.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Interval { every, unit, .. } => format!("every {every} {unit}"),
            Self::Absolute { fire_at, .. } => fire_at.to_rfc3339_opts(SecondsFormat::Secs, true),
        }
    }
}
