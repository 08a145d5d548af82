//! # Time Values
//!
//! Wall-clock and calendar helpers shared by slots, appointments and
//! reporting.
//!
//! Times of day travel as `"HH:MM"` strings at the edges (forms, JSON) and
//! as [`NaiveTime`] everywhere else. Slot arithmetic is done in whole
//! minutes since midnight so a window can never wrap into the next day.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Timelike, Utc};

use crate::error::ValidationError;
use crate::validation::ValidationResult;

/// Minutes in a day; the exclusive upper bound for a time-of-day.
pub const MINUTES_PER_DAY: u32 = 24 * 60;

// =============================================================================
// Parsing & Formatting
// =============================================================================

/// Parses a wall-clock time in `HH:MM` (or `HH:MM:SS`) form.
///
/// ```rust
/// use barbearia_core::time::parse_time_of_day;
///
/// let t = parse_time_of_day("start_time", "08:30").unwrap();
/// assert_eq!(t.to_string(), "08:30:00");
/// assert!(parse_time_of_day("start_time", "25:00").is_err());
/// ```
pub fn parse_time_of_day(field: &str, value: &str) -> ValidationResult<NaiveTime> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationError::required(field));
    }

    NaiveTime::parse_from_str(value, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
        .map_err(|_| ValidationError::invalid_format(field, format!("'{value}' is not a valid HH:MM time")))
}

/// Parses a calendar date in ISO `YYYY-MM-DD` form.
pub fn parse_date(field: &str, value: &str) -> ValidationResult<NaiveDate> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationError::required(field));
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| ValidationError::invalid_format(field, format!("'{value}' is not a valid YYYY-MM-DD date")))
}

/// Formats a time of day as `HH:MM`, dropping seconds.
pub fn format_hhmm(time: NaiveTime) -> String {
    time.format("%H:%M").to_string()
}

/// Whole minutes elapsed since midnight (seconds are ignored).
#[inline]
pub fn minutes_since_midnight(time: NaiveTime) -> u32 {
    time.hour() * 60 + time.minute()
}

/// Inverse of [`minutes_since_midnight`]; `None` at or past midnight.
pub fn time_from_minutes(minutes: u32) -> Option<NaiveTime> {
    if minutes >= MINUTES_PER_DAY {
        return None;
    }
    NaiveTime::from_hms_opt(minutes / 60, minutes % 60, 0)
}

// =============================================================================
// Serde Adapters
// =============================================================================

/// Serializes a [`NaiveTime`] as `"HH:MM"` and accepts `HH:MM[:SS]` back.
///
/// ```rust,ignore
/// #[serde(with = "crate::time::hhmm")]
/// pub start_time: NaiveTime,
/// ```
pub mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_hhmm(*time))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_time_of_day("time", &raw).map_err(serde::de::Error::custom)
    }
}

// =============================================================================
// Reporting Periods
// =============================================================================

/// A closed reporting window `[from, to]` in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Period {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

impl Period {
    /// The last `days` days ending at `now`.
    ///
    /// ```rust
    /// use barbearia_core::time::Period;
    /// use chrono::{Duration, Utc};
    ///
    /// let now = Utc::now();
    /// let period = Period::last_days(now, 30);
    /// assert_eq!(period.to - period.from, Duration::days(30));
    /// ```
    pub fn last_days(now: DateTime<Utc>, days: u32) -> Self {
        Period {
            from: now - Duration::days(i64::from(days)),
            to: now,
        }
    }

    /// The whole calendar day containing `date` (UTC).
    pub fn day(date: NaiveDate) -> Self {
        let from = date.and_time(NaiveTime::MIN).and_utc();
        Period {
            from,
            to: from + Duration::days(1) - Duration::nanoseconds(1),
        }
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        at >= self.from && at <= self.to
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
