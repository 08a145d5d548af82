//! # Slot Generator
//!
//! Materialises a professional's bookable time slots for one day.
//!
//! ## Algorithm
//! ```text
//! start=08:00  end=09:00  interval=30
//!
//!   08:00 ─────── 08:30 ─────── 09:00
//!   │   slot 1    │   slot 2    │        2 slots
//!
//! start=08:00  end=08:50  interval=30
//!
//!   08:00 ─────── 08:30 ────── 08:50
//!   │   slot 1    │  (20 min)  │         1 slot; the tail is dropped
//! ```
//!
//! A slot `[current, current + interval)` is emitted only while
//! `current + interval <= end`. The trailing partial interval is never
//! truncated to fit, so the slot count is `floor((end - start) / interval)`.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::error::CoreResult;
use crate::time::{self, minutes_since_midnight, time_from_minutes};
use crate::validation::validate_interval_minutes;

// =============================================================================
// Time Slot
// =============================================================================

/// A fixed-duration interval during which a professional can be booked.
///
/// Identity is `(professional_id, date, start_time)`; the database enforces
/// it with a unique index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct TimeSlot {
    pub id: String,
    pub professional_id: String,
    #[ts(as = "String")]
    pub date: NaiveDate,
    #[serde(with = "time::hhmm")]
    #[ts(as = "String")]
    pub start_time: NaiveTime,
    #[serde(with = "time::hhmm")]
    #[ts(as = "String")]
    pub end_time: NaiveTime,
    pub available: bool,
    pub notes: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl TimeSlot {
    /// Creates a new, available slot.
    pub fn new(
        professional_id: impl Into<String>,
        date: NaiveDate,
        window: SlotWindow,
        notes: Option<String>,
    ) -> Self {
        TimeSlot {
            id: Uuid::new_v4().to_string(),
            professional_id: professional_id.into(),
            date,
            start_time: window.start,
            end_time: window.end,
            available: true,
            notes,
            created_at: Utc::now(),
        }
    }

    /// Flips availability and returns the new value.
    ///
    /// Toggling twice restores the original state.
    pub fn toggle(&mut self) -> bool {
        self.available = !self.available;
        self.available
    }

    /// Whole minutes covered by this slot.
    pub fn duration_minutes(&self) -> u32 {
        minutes_since_midnight(self.end_time).saturating_sub(minutes_since_midnight(self.start_time))
    }

    /// Whether two slots of the same professional and day share any minute.
    pub fn overlaps(&self, other: &TimeSlot) -> bool {
        self.professional_id == other.professional_id
            && self.date == other.date
            && self.start_time < other.end_time
            && other.start_time < self.end_time
    }
}

// =============================================================================
// Generation
// =============================================================================

/// A half-open `[start, end)` window on the wall clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotWindow {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

/// Splits `[start, end)` into back-to-back windows of `interval_minutes`.
///
/// Returns an empty list when `start >= end`. Fails only when the interval
/// is zero or unreasonably large.
///
/// ```rust
/// use barbearia_core::slots::slot_windows;
/// use chrono::NaiveTime;
///
/// let t = |h, m| NaiveTime::from_hms_opt(h, m, 0).unwrap();
/// let windows = slot_windows(t(8, 0), t(9, 0), 30).unwrap();
/// assert_eq!(windows.len(), 2);
/// assert_eq!(windows[1].start, t(8, 30));
/// assert_eq!(windows[1].end, t(9, 0));
/// ```
pub fn slot_windows(start: NaiveTime, end: NaiveTime, interval_minutes: u32) -> CoreResult<Vec<SlotWindow>> {
    validate_interval_minutes(interval_minutes)?;

    let end_minutes = minutes_since_midnight(end);
    let mut current = minutes_since_midnight(start);
    let mut windows = Vec::new();

    while current + interval_minutes <= end_minutes {
        let next = current + interval_minutes;
        if let (Some(from), Some(to)) = (time_from_minutes(current), time_from_minutes(next)) {
            windows.push(SlotWindow { start: from, end: to });
        }
        current = next;
    }

    Ok(windows)
}

/// Generates the slots for one professional and day.
///
/// Every slot starts out available and carries the same `notes`.
pub fn generate_slots(
    professional_id: &str,
    date: NaiveDate,
    start: NaiveTime,
    end: NaiveTime,
    interval_minutes: u32,
    notes: Option<&str>,
) -> CoreResult<Vec<TimeSlot>> {
    let notes = notes.map(str::trim).filter(|n| !n.is_empty());

    Ok(slot_windows(start, end, interval_minutes)?
        .into_iter()
        .map(|window| TimeSlot::new(professional_id, date, window, notes.map(str::to_string)))
        .collect())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CoreError;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
    }

    #[test]
    fn test_one_hour_in_half_hours() {
        let slots = generate_slots("prof-1", day(), t(8, 0), t(9, 0), 30, None).unwrap();

        assert_eq!(slots.len(), 2);
        assert_eq!((slots[0].start_time, slots[0].end_time), (t(8, 0), t(8, 30)));
        assert_eq!((slots[1].start_time, slots[1].end_time), (t(8, 30), t(9, 0)));
        assert!(slots.iter().all(|s| s.available));
        assert!(slots.iter().all(|s| s.professional_id == "prof-1" && s.date == day()));
    }

    #[test]
    fn test_trailing_partial_interval_dropped() {
        let slots = generate_slots("prof-1", day(), t(8, 0), t(8, 50), 30, None).unwrap();

        assert_eq!(slots.len(), 1);
        assert_eq!(slots[0].start_time, t(8, 0));
        assert_eq!(slots[0].end_time, t(8, 30));
    }

    #[test]
    fn test_empty_when_start_not_before_end() {
        assert!(slot_windows(t(9, 0), t(9, 0), 30).unwrap().is_empty());
        assert!(slot_windows(t(18, 0), t(8, 0), 30).unwrap().is_empty());
    }

    #[test]
    fn test_window_shorter_than_interval() {
        assert!(slot_windows(t(8, 0), t(8, 20), 30).unwrap().is_empty());
    }

    #[test]
    fn test_zero_interval_rejected() {
        let err = slot_windows(t(8, 0), t(9, 0), 0).unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[test]
    fn test_count_matches_floor_and_no_overlap() {
        let cases = [
            (t(8, 0), t(18, 0), 30),
            (t(8, 0), t(18, 0), 45),
            (t(9, 15), t(12, 0), 20),
            (t(0, 0), t(23, 59), 60),
            (t(13, 0), t(13, 59), 15),
        ];

        for (start, end, interval) in cases {
            let slots = generate_slots("p", day(), start, end, interval, None).unwrap();
            let span = minutes_since_midnight(end) - minutes_since_midnight(start);
            assert_eq!(slots.len() as u32, span / interval, "{start}-{end}/{interval}");

            for (i, a) in slots.iter().enumerate() {
                assert_eq!(a.duration_minutes(), interval);
                for b in slots.iter().skip(i + 1) {
                    assert!(!a.overlaps(b));
                }
            }
        }
    }

    #[test]
    fn test_slot_reaching_midnight() {
        let windows = slot_windows(t(23, 0), t(23, 59), 59).unwrap();
        assert_eq!(windows.len(), 1);
        assert_eq!(windows[0].end, t(23, 59));
    }

    #[test]
    fn test_notes_applied_to_every_slot() {
        let slots = generate_slots("p", day(), t(8, 0), t(10, 0), 60, Some(" feriado ")).unwrap();
        assert!(slots.iter().all(|s| s.notes.as_deref() == Some("feriado")));

        let slots = generate_slots("p", day(), t(8, 0), t(10, 0), 60, Some("  ")).unwrap();
        assert!(slots.iter().all(|s| s.notes.is_none()));
    }

    #[test]
    fn test_toggle_twice_restores_state() {
        let mut slot = generate_slots("p", day(), t(8, 0), t(8, 30), 30, None)
            .unwrap()
            .remove(0);
        let original = slot.clone();

        assert!(!slot.toggle());
        assert!(slot.toggle());
        assert_eq!(slot, original);
    }

    #[test]
    fn test_serializes_hhmm() {
        let slot = generate_slots("p", day(), t(8, 0), t(8, 30), 30, None)
            .unwrap()
            .remove(0);
        let json = serde_json::to_value(&slot).unwrap();
        assert_eq!(json["startTime"], "08:00");
        assert_eq!(json["endTime"], "08:30");
        assert_eq!(json["date"], "2024-03-15");
    }
}
