//! Day-relative `[start, end)` intervals for timed events.
//!
//! Two clamps exist and are kept apart: overlap and slot logic use the true
//! interval, only the rendered height is floored at the minimum visual size.

use crate::config::KindDurations;
use crate::event::{CalendarEvent, EventKind};
use crate::time::parse_time;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventInterval {
    pub start_minute: u32,
    /// May run past 1440 for events that cross midnight.
    pub end_minute: u32,
}

impl EventInterval {
    pub fn duration(&self) -> u32 {
        self.end_minute - self.start_minute
    }

    pub fn overlaps(&self, other: &EventInterval) -> bool {
        self.start_minute < other.end_minute && other.start_minute < self.end_minute
    }

    pub fn visual_height(&self, min_visual_minutes: u32) -> u32 {
        self.duration().max(min_visual_minutes)
    }
}

/// Duration of a timed event in minutes.
///
/// Only Training events honour an explicit end time, and only when it parses
/// and lies strictly after the start; everything else uses the kind default.
pub fn event_duration(event: &CalendarEvent, start_minute: u32, durations: &KindDurations) -> u32 {
    if event.event_kind == EventKind::Training {
        if let Some(end) = event.event_end_time.as_deref().and_then(parse_time) {
            if end > start_minute {
                return end - start_minute;
            }
        }
    }
    durations.for_kind(event.event_kind)
}

/// `None` for all-day events (no parseable start time).
pub fn interval_for(event: &CalendarEvent, durations: &KindDurations) -> Option<EventInterval> {
    let start_minute = event.start_minute()?;
    let duration = event_duration(event, start_minute, durations);
    Some(EventInterval {
        start_minute,
        end_minute: start_minute + duration,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn event(kind: EventKind) -> CalendarEvent {
        CalendarEvent::new(1, "Test", NaiveDate::from_ymd_opt(2026, 1, 3).unwrap(), kind)
    }

    #[test]
    fn kind_defaults_apply_without_end_time() {
        let durations = KindDurations::default();
        for (kind, expected) in [
            (EventKind::Operation, 180),
            (EventKind::Training, 90),
            (EventKind::Meeting, 60),
            (EventKind::Social, 120),
        ] {
            let interval = interval_for(&event(kind).with_time("12:00"), &durations).unwrap();
            assert_eq!(interval.duration(), expected, "{kind}");
        }
    }

    #[test]
    fn training_end_time_overrides_default() {
        let ev = event(EventKind::Training)
            .with_time("18:00")
            .with_end_time("18:45");
        let interval = interval_for(&ev, &KindDurations::default()).unwrap();
        assert_eq!(interval.end_minute, 18 * 60 + 45);
    }

    #[test]
    fn training_end_before_start_falls_back_to_default() {
        let ev = event(EventKind::Training)
            .with_time("18:00")
            .with_end_time("17:00");
        let interval = interval_for(&ev, &KindDurations::default()).unwrap();
        assert_eq!(interval.duration(), 90);

        let ev = event(EventKind::Training)
            .with_time("18:00")
            .with_end_time("18:00");
        assert_eq!(interval_for(&ev, &KindDurations::default()).unwrap().duration(), 90);
    }

    #[test]
    fn end_time_ignored_for_non_training_kinds() {
        let ev = event(EventKind::Meeting)
            .with_time("09:00")
            .with_end_time("09:05");
        let interval = interval_for(&ev, &KindDurations::default()).unwrap();
        assert_eq!(interval.duration(), 60);
    }

    #[test]
    fn short_interval_keeps_true_duration_but_floors_height() {
        let ev = event(EventKind::Training)
            .with_time("10:00")
            .with_end_time("10:05");
        let interval = interval_for(&ev, &KindDurations::default()).unwrap();
        assert_eq!(interval.duration(), 5);
        assert_eq!(interval.visual_height(15), 15);
    }

    #[test]
    fn missing_or_malformed_start_is_all_day() {
        assert!(interval_for(&event(EventKind::Social), &KindDurations::default()).is_none());
        let ev = event(EventKind::Social).with_time("late");
        assert!(interval_for(&ev, &KindDurations::default()).is_none());
    }
}
