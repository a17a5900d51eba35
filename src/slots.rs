//! Start-time suggestions and conflict checks for Operation events.

use crate::clock::Clock;
use crate::config::{ConfigError, ConfigResult, SchedulingConfig};
use crate::event::{CalendarEvent, EventId, EventKind};
use crate::time::TimeOfDay;
use chrono::{NaiveDate, Timelike};
use serde::{Deserialize, Serialize};

/// Base enumeration of allowed daily start slots, `first..=last` every
/// `step_minutes`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotGrid {
    pub first: TimeOfDay,
    pub last: TimeOfDay,
    pub step_minutes: u32,
}

impl Default for SlotGrid {
    fn default() -> Self {
        Self {
            first: TimeOfDay::at(10, 0),
            last: TimeOfDay::at(23, 30),
            step_minutes: 30,
        }
    }
}

impl SlotGrid {
    pub fn validate(&self) -> ConfigResult<()> {
        if self.step_minutes == 0 {
            return Err(ConfigError::Invalid(
                "slot grid step_minutes must be greater than zero".into(),
            ));
        }
        if self.first > self.last {
            return Err(ConfigError::Invalid(format!(
                "slot grid first slot {} is after last slot {}",
                self.first, self.last
            )));
        }
        Ok(())
    }

    pub fn candidates(&self) -> Vec<TimeOfDay> {
        if self.step_minutes == 0 {
            return Vec::new();
        }
        (self.first.minutes()..=self.last.minutes())
            .step_by(self.step_minutes as usize)
            .filter_map(TimeOfDay::from_minutes)
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotAvailability {
    pub available: Vec<String>,
    pub existing_times: Vec<String>,
}

pub fn conflicts_with(candidate: TimeOfDay, existing: TimeOfDay, min_separation: u32) -> bool {
    candidate.distance(existing) < min_separation
}

/// Keeps the candidates that are at least `min_separation` minutes away from
/// every existing start time. Candidate order is preserved.
pub fn filter_available(
    candidates: &[TimeOfDay],
    existing: &[TimeOfDay],
    min_separation: u32,
) -> Vec<TimeOfDay> {
    candidates
        .iter()
        .copied()
        .filter(|candidate| {
            !existing
                .iter()
                .any(|taken| conflicts_with(*candidate, *taken, min_separation))
        })
        .collect()
}

/// First existing time (in list order) closer than `min_separation` to the
/// typed candidate. Unparseable input never reports a conflict.
pub fn find_conflict(
    candidate: &str,
    existing: &[TimeOfDay],
    min_separation: u32,
) -> Option<TimeOfDay> {
    let candidate: TimeOfDay = candidate.parse().ok()?;
    existing
        .iter()
        .copied()
        .find(|taken| conflicts_with(candidate, *taken, min_separation))
}

/// Start times of timed Operation events on `date`, in input order.
pub fn operation_start_times(
    events: &[CalendarEvent],
    date: NaiveDate,
    exclude: Option<EventId>,
) -> Vec<TimeOfDay> {
    events
        .iter()
        .filter(|event| event.event_date == date && event.event_kind == EventKind::Operation)
        .filter(|event| Some(event.id) != exclude)
        .filter_map(|event| event.start_minute().and_then(TimeOfDay::from_minutes))
        .collect()
}

/// Date-aware slot suggestions driven by the configured grid and clock.
pub struct SlotFinder<'a> {
    config: &'a SchedulingConfig,
    clock: &'a dyn Clock,
}

impl<'a> SlotFinder<'a> {
    pub fn new(config: &'a SchedulingConfig, clock: &'a dyn Clock) -> Self {
        Self { config, clock }
    }

    /// Grid slots on `date` that lie in the future.
    fn future_candidates(&self, date: NaiveDate) -> Vec<TimeOfDay> {
        let now = self.clock.now();
        let candidates = self.config.slot_grid.candidates();
        if date > now.date() {
            return candidates;
        }
        if date < now.date() {
            return Vec::new();
        }
        let now_minute = now.hour() * 60 + now.minute();
        candidates
            .into_iter()
            .filter(|slot| slot.minutes() > now_minute)
            .collect()
    }

    pub fn availability(&self, date: NaiveDate, existing: &[TimeOfDay]) -> SlotAvailability {
        let candidates = self.future_candidates(date);
        let available = filter_available(&candidates, existing, self.config.min_separation_minutes);
        SlotAvailability {
            available: available.iter().map(ToString::to_string).collect(),
            existing_times: existing.iter().map(ToString::to_string).collect(),
        }
    }

    pub fn suggest(&self, date: NaiveDate, events: &[CalendarEvent]) -> SlotAvailability {
        self.suggest_excluding(date, events, None)
    }

    /// Like [`suggest`](Self::suggest) but ignores the event being edited.
    pub fn suggest_excluding(
        &self,
        date: NaiveDate,
        events: &[CalendarEvent],
        exclude: Option<EventId>,
    ) -> SlotAvailability {
        let existing = operation_start_times(events, date, exclude);
        let availability = self.availability(date, &existing);
        tracing::debug!(
            %date,
            existing = existing.len(),
            available = availability.available.len(),
            "computed slot availability"
        );
        availability
    }

    /// Conflict for a typed start time. `exclude` is the Operation being
    /// edited, which never conflicts with itself.
    pub fn check(
        &self,
        candidate: &str,
        date: NaiveDate,
        events: &[CalendarEvent],
        exclude: Option<EventId>,
    ) -> Option<TimeOfDay> {
        let existing = operation_start_times(events, date, exclude);
        find_conflict(candidate, &existing, self.config.min_separation_minutes)
    }
}
